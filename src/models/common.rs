use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Banner {
    pub message: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub status: String,
    pub message: String,
    pub version: String,
    pub features: Features,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Features {
    pub chat: bool,
    pub function_calling: bool,
}

pub fn online() -> String {
    "online".to_string()
}
