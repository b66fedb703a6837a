use std::fmt;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::storage::StorageError;
use serde::Serialize;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `NOT_FOUND`, `INTERNAL_ERROR`.
    #[schema(example = "INTERNAL_ERROR")]
    pub code: &'static str,
    /// Operation that failed followed by the underlying fault.
    #[schema(example = "Failed to delete usuario. Error: connection refused")]
    pub message: String,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    /// Any fault while serving a request. `context` names the failed operation.
    Internal {
        context: &'static str,
        detail: String,
    },
}

impl AppError {
    pub fn internal(context: &'static str, detail: impl fmt::Display) -> Self {
        AppError::Internal {
            context,
            detail: detail.to_string(),
        }
    }

    /// Closure for `map_err` that tags an error with the failed operation.
    pub fn context<E: fmt::Display>(context: &'static str) -> impl FnOnce(E) -> Self {
        move |e| AppError::internal(context, e)
    }

    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    code: "NOT_FOUND",
                    message: msg,
                },
            ),
            AppError::Internal { context, detail } => {
                tracing::error!(context, "Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "INTERNAL_ERROR",
                        message: format!("{context}. Error: {detail}"),
                    },
                )
            }
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NotFound(msg) => f.write_str(msg),
            AppError::Internal { context, detail } => write!(f, "{context}. Error: {detail}"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(name) => AppError::NotFound(format!("Image '{name}' not found")),
            StorageError::InvalidName { name, .. } => {
                AppError::NotFound(format!("Image '{name}' not found"))
            }
            other => AppError::internal("Failed to read image", other),
        }
    }
}
