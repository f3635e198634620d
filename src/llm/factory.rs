use std::sync::Arc;

use crate::config::Config;
use crate::error::AppError;
use crate::llm::openai_compatible::OpenAICompatibleProvider;
use crate::llm::provider::LLMProvider;

pub fn provider_from_config(cfg: &Config) -> Result<Arc<dyn LLMProvider>, AppError> {
    if cfg.api_key.trim().is_empty() {
        return Err(AppError::Config("Model config is missing api_key".to_string()));
    }

    let provider = OpenAICompatibleProvider::new(&cfg.api_key, Some(cfg.base_url.clone()), cfg.llm_timeout)?;
    tracing::info!(
        provider = provider.provider_name(),
        base_url = provider.base_url(),
        "completion provider configured"
    );
    Ok(Arc::new(provider))
}
