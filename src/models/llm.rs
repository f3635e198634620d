use serde::{Deserialize, Serialize};

/// Sampling parameters applied to every completion call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

pub fn default_temperature() -> f64 {
    0.7
}

pub fn default_max_tokens() -> u32 {
    1000
}
