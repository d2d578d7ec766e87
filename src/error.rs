use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::ai::UpstreamError;

pub const SESSION_EXPIRED_MESSAGE: &str = "Session expired, please login again.";

/// Error type returned by handlers, services and extractors.
///
/// Every variant renders as `{"error": .., "code": ..}`. Upstream and
/// persistence failures are logged with their full cause and reported to the
/// client with a generic message only.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("authentication invalid")]
    Unauthorized,

    #[error("session expired")]
    SessionExpired,

    #[error("recipe not found")]
    NotFound,

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("{context}: {cause:#}")]
    Persistence {
        context: &'static str,
        cause: anyhow::Error,
    },
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Wraps a store or asset-storage failure with the client-facing message
    /// of the operation that hit it.
    pub fn persistence(context: &'static str) -> impl FnOnce(anyhow::Error) -> Self {
        move |cause| Self::Persistence { context, cause }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized | Self::SessionExpired => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Upstream(_) | Self::Persistence { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (code, message) = match &self {
            Self::Validation(msg) => ("VALIDATION_ERROR", msg.clone()),
            Self::Unauthorized => ("UNAUTHORIZED", "Authentication invalid".to_string()),
            Self::SessionExpired => ("SESSION_EXPIRED", SESSION_EXPIRED_MESSAGE.to_string()),
            Self::NotFound => ("NOT_FOUND", "Recipe not found".to_string()),
            Self::Upstream(e) => {
                tracing::error!(error = %e, "recipe generation failed");
                ("UPSTREAM_ERROR", "Failed to generate the recipe.".to_string())
            }
            Self::Persistence { context, cause } => {
                tracing::error!(error = ?cause, "{context}");
                ("INTERNAL_ERROR", context.to_string())
            }
        };

        (self.status(), Json(json!({ "error": message, "code": code }))).into_response()
    }
}
