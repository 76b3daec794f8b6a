use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use thiserror::Error;

use crate::store::StoreError;

/// Failures a handler can answer with.
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing, malformed, foreign or expired token. The cause stays in the logs.
    #[error("unauthorized")]
    Unauthorized,

    #[error("forbidden")]
    Forbidden,

    #[error("{0}")]
    NotFound(String),

    /// A uniqueness rule would be broken.
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    BadRequest(String),

    /// No signing secret configured.
    #[error("token signing unavailable")]
    TokenUnavailable,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::TokenUnavailable | AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut resp = HttpResponse::build(self.status_code());
        match self {
            AppError::Unauthorized => resp.json(json!({
                "error": true,
                "message": "Unauthorized access"
            })),
            AppError::Forbidden => resp.json(json!({
                "error": true,
                "message": "Forbidden access"
            })),
            AppError::NotFound(message) => resp.json(json!({ "message": message })),
            AppError::Conflict(message) => resp.content_type("text/plain; charset=utf-8").body(message.clone()),
            AppError::BadRequest(message) => resp.json(json!({
                "error": true,
                "message": message
            })),
            AppError::TokenUnavailable => resp.json(json!({
                "error": true,
                "message": "Token signing unavailable"
            })),
            AppError::Store(_) => resp
                .content_type("text/plain; charset=utf-8")
                .body("Internal server error"),
        }
    }
}
