// Error types for the offline agent
// Author: kelexine (https://github.com/kelexine)

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Cache storage error: {0}")]
    CacheStorage(String),

    #[error("Offline and no cached fallback for {0}")]
    OfflineUnavailable(String),

    #[error("Lifecycle error: {0}")]
    Lifecycle(String),

    #[error("Window error: {0}")]
    Window(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config parsing error: {0}")]
    ConfigParsing(#[from] config::ConfigError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

// Convert AgentError to HTTP responses for Axum
impl IntoResponse for AgentError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            AgentError::Network(_) => {
                (StatusCode::BAD_GATEWAY, "network_error", self.to_string())
            }
            AgentError::OfflineUnavailable(_) => {
                (StatusCode::GATEWAY_TIMEOUT, "offline_error", self.to_string())
            }
            AgentError::InvalidRequest(_) => {
                (StatusCode::BAD_REQUEST, "invalid_request_error", self.to_string())
            }
            AgentError::Lifecycle(_) => {
                (StatusCode::CONFLICT, "lifecycle_error", self.to_string())
            }
            AgentError::Config(_) | AgentError::ConfigParsing(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "configuration_error", self.to_string())
            }
            AgentError::CacheStorage(_) | AgentError::Io(_) | AgentError::Json(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "cache_error", self.to_string())
            }
            _ => {
                (StatusCode::INTERNAL_SERVER_ERROR, "api_error", self.to_string())
            }
        };

        let body = json!({
            "type": "error",
            "error": {
                "type": error_type,
                "message": message,
            }
        });

        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AgentError>;
