//! HTTP error mapping
use crate::error::LedgerError;
use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

/// Error body returned on every non-2xx response
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub ok: String,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Capacity(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Capacity(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Internal(msg) => {
                error!(target: "internal", error = %msg, "Internal error occurred");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(ErrorBody {
            ok: "false".to_string(),
            message,
        });
        (status, body).into_response()
    }
}

impl From<LedgerError> for AppError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::Validation(msg) => AppError::Validation(msg),
            LedgerError::StoreNotFound(_)
            | LedgerError::ProductNotFound(_)
            | LedgerError::ProductNotInStore { .. }
            | LedgerError::OrderNotFound(_) => AppError::NotFound(e.to_string()),
            LedgerError::StoreLimit(_) | LedgerError::ProductLimit(_) => {
                AppError::Capacity(e.to_string())
            }
            LedgerError::Storage(e) => AppError::Internal(e.to_string()),
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(e: QueryRejection) -> Self {
        AppError::Validation(e.body_text())
    }
}

impl From<JsonRejection> for AppError {
    fn from(e: JsonRejection) -> Self {
        AppError::Validation(e.body_text())
    }
}
