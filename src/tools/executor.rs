use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use serde_json::{Map, Value};

use crate::error::AppError;
use crate::tools::args::{normalize_arguments, ToolArgs};
use crate::tools::builtin;
use crate::tools::definition::{ToolCall, ToolDefinition, ToolResult, ToolStatus};
use crate::tools::dialer::Dialer;

#[derive(Debug, Clone)]
pub struct ToolLimits {
    pub timeout_ms: u64,
}

impl Default for ToolLimits {
    fn default() -> Self {
        Self { timeout_ms: 10_000 }
    }
}

impl ToolLimits {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Bound for one dialer command. Three of them fit inside the dial budget.
    pub fn dial_step_timeout(&self) -> Duration {
        self.timeout() / 4
    }

    /// Window in which a dial step may start. Ends before the tool timeout.
    pub fn dial_budget(&self) -> Duration {
        self.dial_step_timeout() * 3
    }
}

/// Fixed registry of builtin tools. Read-only after construction, so one
/// instance is shared across all requests.
#[derive(Clone)]
pub struct ToolExecutor {
    definitions: Arc<Vec<ToolDefinition>>,
    dialer: Arc<dyn Dialer>,
    limits: ToolLimits,
}

impl ToolExecutor {
    pub fn new(dialer: Arc<dyn Dialer>) -> Self {
        Self {
            definitions: Arc::new(builtin::definitions()),
            dialer,
            limits: ToolLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: ToolLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn definitions(&self) -> &[ToolDefinition] {
        &self.definitions
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.definitions.iter().any(|d| d.name == name)
    }

    /// Runs one call. Never fails: every error becomes a `failed` result.
    pub async fn execute(&self, call: ToolCall) -> ToolResult {
        let started = Instant::now();
        let args = normalize_arguments(&call.arguments);
        let name = call.name.clone();

        let output = if !self.is_registered(&name) {
            Err(AppError::ToolNotFound(name.clone()))
        } else {
            let dialer = self.dialer.clone();
            let name_for_exec = name.clone();
            let args_for_exec = args.clone();
            let dial_deadline = started + self.limits.dial_budget();
            let fut = tokio::task::spawn_blocking(move || {
                execute_blocking(dialer.as_ref(), &name_for_exec, &args_for_exec, dial_deadline)
            });
            match tokio::time::timeout(self.limits.timeout(), fut).await {
                Ok(Ok(res)) => res,
                Ok(Err(join_err)) => Err(AppError::ToolExecutionFailed(join_err.to_string())),
                Err(_) => Err(AppError::ToolExecutionFailed("Tool execution timed out".to_string())),
            }
        };

        let duration_ms = started.elapsed().as_millis().min(u128::from(u64::MAX)) as u64;
        match output {
            Ok(text) => {
                tracing::info!(tool = %name, duration_ms, "tool completed");
                ToolResult {
                    tool_call_id: call.id,
                    name,
                    arguments: Value::Object(args),
                    status: ToolStatus::Completed,
                    result: text,
                    duration_ms: Some(duration_ms),
                }
            }
            Err(e) => {
                tracing::warn!(tool = %name, duration_ms, error = %e, "tool failed");
                ToolResult {
                    tool_call_id: call.id,
                    result: format!("Error executing {name}: {e}"),
                    name,
                    arguments: Value::Object(args),
                    status: ToolStatus::Failed,
                    duration_ms: Some(duration_ms),
                }
            }
        }
    }

    /// Runs calls concurrently; results keep the order of `calls`.
    pub async fn execute_all(&self, calls: Vec<ToolCall>) -> Vec<ToolResult> {
        join_all(calls.into_iter().map(|call| self.execute(call))).await
    }
}

fn execute_blocking(
    dialer: &dyn Dialer,
    tool_name: &str,
    args: &Map<String, Value>,
    dial_deadline: Instant,
) -> Result<String, AppError> {
    match ToolArgs::decode(tool_name, args)? {
        ToolArgs::Weather { location, unit } => Ok(builtin::weather::current_weather(&location, unit)),
        ToolArgs::WebSearch { query, num_results } => Ok(builtin::search::search_web(&query, num_results)),
        ToolArgs::CurrentTime { timezone } => builtin::time::current_time(&timezone),
        ToolArgs::Calculate { expression } => builtin::calculator::calculate(&expression),
        ToolArgs::PlaceCall {
            phone_number,
            contact_name,
        } => builtin::phone::place_call(dialer, &phone_number, contact_name.as_deref(), dial_deadline),
    }
}
