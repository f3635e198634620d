use axum::Json;

use crate::models::common::{online, Banner, Features, ServiceStatus};

pub async fn root() -> Json<Banner> {
    Json(Banner {
        message: "WhisperMe relay API".to_string(),
        status: online(),
    })
}

pub async fn status() -> Json<ServiceStatus> {
    Json(ServiceStatus {
        status: online(),
        message: "WhisperMe relay is running".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        features: Features {
            chat: true,
            function_calling: true,
        },
    })
}
