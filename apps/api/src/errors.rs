use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::prep::orchestrator::PrepError;
use crate::prep::retry::Transient;
use crate::prep::validation::ValidationError;
use crate::sheets::SheetsError;

/// Guidance attached to upstream failures that survived every retry.
const RETRY_GUIDANCE: &str = "The AI service timed out or returned an incomplete response. \
    This might be due to high demand. Please try again with a shorter job description.";

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Sheets error: {0}")]
    Sheets(String),
}

impl From<ValidationError> for AppError {
    fn from(e: ValidationError) -> Self {
        AppError::Validation(e.to_string())
    }
}

impl From<PrepError> for AppError {
    fn from(e: PrepError) -> Self {
        match &e {
            PrepError::NotConfigured(_) => AppError::Configuration(e.to_string()),
            _ if e.is_transient() => AppError::UpstreamUnavailable(e.to_string()),
            _ => AppError::Llm(e.to_string()),
        }
    }
}

impl From<SheetsError> for AppError {
    fn from(e: SheetsError) -> Self {
        match e {
            SheetsError::NotConfigured | SheetsError::MalformedKey => {
                AppError::Configuration(e.to_string())
            }
            other => AppError::Sheets(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Configuration(msg) => {
                tracing::error!("Configuration error: {msg}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "CONFIGURATION_ERROR",
                    msg.clone(),
                )
            }
            AppError::UpstreamUnavailable(msg) => {
                tracing::error!("Upstream failure after retries: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "UPSTREAM_UNAVAILABLE",
                    RETRY_GUIDANCE.to_string(),
                )
            }
            AppError::Llm(msg) => {
                tracing::error!("LLM error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "LLM_ERROR",
                    "Failed to generate interview preparation materials. Please check your API keys and try again."
                        .to_string(),
                )
            }
            AppError::Sheets(msg) => {
                tracing::error!("Sheets error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "SHEETS_ERROR",
                    "Unable to save your email at this time".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
