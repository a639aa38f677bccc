//! Unified error handling for the HTTP handlers.
//!
//! Every handler returns `Result<T, AppError>`. The error renders as a JSON
//! `ErrorResponse` whose status code is the only classification clients get.

use crate::auth::AuthError;
use crate::schemas::ErrorResponse;
use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use sea_orm::DbErr;
use std::error::Error as _;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use validator::ValidationErrors;

static EXPOSE_ERROR_DETAILS: AtomicBool = AtomicBool::new(false);

/// Include the error chain of 500 responses in the `detail` field.
pub fn set_expose_error_details(enabled: bool) {
    EXPOSE_ERROR_DETAILS.store(enabled, Ordering::Relaxed);
}

fn expose_error_details() -> bool {
    EXPOSE_ERROR_DETAILS.load(Ordering::Relaxed)
}

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Request body, path or query failed validation.
    #[error("{0}")]
    Validation(String),

    /// Authentication failed or the bearer token was rejected.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Authenticated, but not allowed to touch this resource.
    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Auth(err) if err.is_server_fault() => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Auth(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self.status() {
            StatusCode::BAD_REQUEST => "VALIDATION_ERROR",
            StatusCode::UNAUTHORIZED => "UNAUTHORIZED",
            StatusCode::FORBIDDEN => "FORBIDDEN",
            StatusCode::NOT_FOUND => "NOT_FOUND",
            StatusCode::METHOD_NOT_ALLOWED => "METHOD_NOT_ALLOWED",
            _ => match self {
                Self::Database(_) => "DATABASE_ERROR",
                _ => "INTERNAL_ERROR",
            },
        }
    }

    /// Build the JSON body. Server faults hide their cause chain unless
    /// `expose_details` is set; only `Internal` keeps its own top-level message.
    pub fn to_error_response(&self, expose_details: bool) -> ErrorResponse {
        let server_fault = self.status().is_server_error();
        let message = match self {
            Self::Internal(message) => message.clone(),
            _ if server_fault => "Internal server error".to_string(),
            _ => self.to_string(),
        };
        let detail = (server_fault && expose_details).then(|| self.chain());

        ErrorResponse {
            message,
            code: self.code().to_string(),
            success: false,
            detail,
        }
    }

    fn chain(&self) -> String {
        let mut parts = vec![self.to_string()];
        let mut source = self.source();
        while let Some(err) = source {
            let text = err.to_string();
            if parts.last() != Some(&text) {
                parts.push(text);
            }
            source = err.source();
        }
        parts.join(": ")
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        (status, Json(self.to_error_response(expose_error_details()))).into_response()
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |err| match &err.message {
                    Some(message) => format!("{field}: {message}"),
                    None => format!("{field}: {}", err.code),
                })
            })
            .collect();
        messages.sort();
        Self::Validation(messages.join("; "))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
