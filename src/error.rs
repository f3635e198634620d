use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Unknown tool '{0}'")]
    ToolNotFound(String),

    #[error("Invalid arguments for '{tool}': {reason}")]
    ToolArgumentInvalid { tool: String, reason: String },

    #[error("{0}")]
    ToolExecutionFailed(String),

    #[error("{0}")]
    UpstreamCompletionFailed(String),

    #[error("Invalid conversation: {0}")]
    InvalidConversation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Message(String),
}

impl AppError {
    pub fn missing_argument(tool: &str, name: &str) -> Self {
        AppError::ToolArgumentInvalid {
            tool: tool.to_string(),
            reason: format!("missing required argument '{name}'"),
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidConversation(_) => StatusCode::BAD_REQUEST,
            AppError::UpstreamCompletionFailed(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        AppError::Message(value.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(value: reqwest::Error) -> Self {
        AppError::UpstreamCompletionFailed(value.to_string())
    }
}

impl serde::Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let detail = match &self {
            AppError::UpstreamCompletionFailed(msg) => format!("Chat completion failed: {msg}"),
            other => other.to_string(),
        };
        (status, Json(serde_json::json!({ "detail": detail }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_taxonomy_to_status_codes() {
        assert_eq!(
            AppError::InvalidConversation("empty".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::UpstreamCompletionFailed("down".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::Config("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn serializes_as_display_string() {
        let err = AppError::ToolNotFound("teleport".into());
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json, serde_json::json!("Unknown tool 'teleport'"));
    }
}
