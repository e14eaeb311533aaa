use std::collections::HashMap;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::mail::MailError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("not found")]
    NotFound,
    #[error("{0}")]
    Unauthorized(String),
    #[error("invalid input")]
    Validation(HashMap<String, String>),
    #[error("{0}")]
    BadRequest(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("template error: {0}")]
    Template(#[from] askama::Error),
    #[error("error sending email: {0}")]
    Mail(#[from] MailError),
    #[error("media storage error: {0}")]
    Media(#[from] std::io::Error),
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn invalid(field: &str, message: &str) -> Self {
        AppError::Validation(HashMap::from([(field.to_string(), message.to_string())]))
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Database(_)
            | AppError::Template(_)
            | AppError::Mail(_)
            | AppError::Media(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn log(&self) {
        match self {
            AppError::Database(e) => tracing::error!("Database error: {e}"),
            AppError::Template(e) => tracing::error!("Template error: {e}"),
            AppError::Mail(e) => tracing::error!("Mail error: {e}"),
            AppError::Media(e) => tracing::error!("Media error: {e}"),
            AppError::Internal(e) => tracing::error!("Internal error: {e}"),
            _ => {}
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.log();
        let status = self.status();
        match self {
            AppError::NotFound => (status, "Not found").into_response(),
            AppError::Unauthorized(msg) | AppError::BadRequest(msg) => (status, msg).into_response(),
            AppError::Validation(errors) => {
                let mut lines: Vec<String> = errors
                    .into_iter()
                    .map(|(field, msg)| format!("{field}: {msg}"))
                    .collect();
                lines.sort();
                (status, lines.join("\n")).into_response()
            }
            e @ AppError::Mail(_) => (status, e.to_string()).into_response(),
            _ => (status, "Internal server error").into_response(),
        }
    }
}

/// JSON flavour of [`AppError`] for the token-authenticated API.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl<E> From<E> for ApiError
where
    E: Into<AppError>,
{
    fn from(e: E) -> Self {
        ApiError(e.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        err.log();
        let status = err.status();
        let body = match err {
            AppError::NotFound => json!({ "detail": "Not found." }),
            AppError::Unauthorized(msg) | AppError::BadRequest(msg) => json!({ "detail": msg }),
            AppError::Validation(errors) => json!(errors),
            e @ AppError::Mail(_) => json!({ "error": e.to_string() }),
            _ => json!({ "detail": "Internal server error" }),
        };
        (status, Json(body)).into_response()
    }
}
