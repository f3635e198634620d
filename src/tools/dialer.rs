use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use tokio::process::Command;

/// OS-level facility used by `call_phone_number`. Every method reports only
/// whether the action appeared to succeed.
pub trait Dialer: Send + Sync {
    fn open(&self, uri: &str) -> bool;
    fn open_with(&self, app: &str, uri: &str) -> bool;
    fn activate_app(&self, name: &str) -> bool;
}

/// Dialer for hosts without a phone handler. Every attempt fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDialer;

impl Dialer for NoopDialer {
    fn open(&self, _uri: &str) -> bool {
        false
    }

    fn open_with(&self, _app: &str, _uri: &str) -> bool {
        false
    }

    fn activate_app(&self, _name: &str) -> bool {
        false
    }
}

/// macOS dialer driving `open` and `osascript`. Each command is killed once
/// `step_timeout` elapses.
///
/// Methods block on the ambient tokio runtime, so call them from a blocking
/// worker (`spawn_blocking`), never from async code.
#[derive(Debug, Clone)]
pub struct SystemDialer {
    step_timeout: Duration,
}

impl SystemDialer {
    pub fn new(step_timeout: Duration) -> Self {
        Self { step_timeout }
    }

    fn run(&self, program: &str, args: &[&str]) -> bool {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle.block_on(self.run_async(program, args)),
            Err(e) => {
                tracing::warn!(program, error = %e, "no runtime available for dialer command");
                false
            }
        }
    }

    async fn run_async(&self, program: &str, args: &[&str]) -> bool {
        let mut child = match Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                tracing::warn!(program, error = %e, "failed to spawn dialer command");
                return false;
            }
        };

        match tokio::time::timeout(self.step_timeout, child.wait()).await {
            Ok(Ok(status)) => status.success(),
            Ok(Err(e)) => {
                tracing::warn!(program, error = %e, "failed to wait for dialer command");
                false
            }
            Err(_) => {
                let _ = child.kill().await;
                tracing::warn!(
                    program,
                    timeout_ms = self.step_timeout.as_millis() as u64,
                    "dialer command timed out"
                );
                false
            }
        }
    }
}

impl Dialer for SystemDialer {
    fn open(&self, uri: &str) -> bool {
        self.run("open", &[uri])
    }

    fn open_with(&self, app: &str, uri: &str) -> bool {
        let script = format!(
            "tell application \"{app}\"\n    activate\n    open location \"{uri}\"\nend tell"
        );
        self.run("osascript", &["-e", &script])
    }

    fn activate_app(&self, name: &str) -> bool {
        self.run("open", &["-a", name])
    }
}

pub fn default_dialer(step_timeout: Duration) -> Arc<dyn Dialer> {
    if cfg!(target_os = "macos") {
        Arc::new(SystemDialer::new(step_timeout))
    } else {
        Arc::new(NoopDialer)
    }
}
