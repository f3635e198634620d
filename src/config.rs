//! Process configuration, read once from the environment at startup.
//!
//! `main` loads `.env` (via `dotenvy`) before calling [`Config::from_env`].

use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::llm::openai_compatible::normalize_openai_compatible_base_url;
use crate::models::llm::{default_max_tokens, default_temperature, GenerationParams};

pub const DEFAULT_MODEL: &str = "gpt-4o";

#[derive(Clone, Debug)]
pub struct Config {
    pub api_key: String,
    pub base_url: String,
    pub host: String,
    pub port: u16,
    pub default_model: String,
    pub generation: GenerationParams,
    pub llm_timeout: Duration,
    pub tool_timeout_ms: u64,
    pub cors_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let api_key = get("OPENAI_API_KEY")
            .context("OPENAI_API_KEY not set (put it in .env or environment)")?;
        if api_key.contains(char::is_whitespace) {
            bail!("OPENAI_API_KEY contains whitespace (check .env: whole key on one line)");
        }

        let temperature = parse_or(get("CHAT_TEMPERATURE"), "CHAT_TEMPERATURE", default_temperature())?;
        if !(0.0..=2.0).contains(&temperature) {
            bail!("CHAT_TEMPERATURE must be between 0 and 2, got {temperature}");
        }

        let cors_origins = get("CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            api_key,
            base_url: normalize_openai_compatible_base_url(get("OPENAI_BASE_URL")),
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(get("PORT"), "PORT", 8000)?,
            default_model: get("DEFAULT_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            generation: GenerationParams {
                temperature,
                max_tokens: parse_or(get("CHAT_MAX_TOKENS"), "CHAT_MAX_TOKENS", default_max_tokens())?,
            },
            llm_timeout: Duration::from_secs(parse_or(get("LLM_TIMEOUT_SECS"), "LLM_TIMEOUT_SECS", 60)?),
            tool_timeout_ms: parse_or(get("TOOL_TIMEOUT_MS"), "TOOL_TIMEOUT_MS", 10_000)?,
            cors_origins,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T>(raw: Option<String>, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(v) => v
            .parse()
            .map_err(|e| anyhow::anyhow!("{key}={v:?} is invalid: {e}")),
    }
}
