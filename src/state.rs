use std::sync::Arc;

use crate::config::Config;
use crate::error::AppError;
use crate::llm::factory::provider_from_config;
use crate::orchestration::tool_loop::Orchestrator;
use crate::tools::dialer::default_dialer;
use crate::tools::executor::{ToolExecutor, ToolLimits};

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub default_model: String,
}

impl AppState {
    pub fn init(config: &Config) -> Result<Self, AppError> {
        let provider = provider_from_config(config)?;
        let limits = ToolLimits {
            timeout_ms: config.tool_timeout_ms,
        };
        let tools = ToolExecutor::new(default_dialer(limits.dial_step_timeout())).with_limits(limits);
        tracing::info!(tools = tools.definitions().len(), "tool registry ready");
        Ok(Self::new(
            Orchestrator::new(provider, tools, config.generation),
            config.default_model.clone(),
        ))
    }

    pub fn new(orchestrator: Orchestrator, default_model: String) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            default_model,
        }
    }
}
