use crate::error::AppError;
use axum::http::{Method, Uri};
use tracing::debug;

/// Known path, unsupported method.
pub async fn method_not_allowed(method: Method, uri: Uri) -> AppError {
    debug!("Method {} not allowed on {}", method, uri.path());
    AppError::MethodNotAllowed
}

/// Unknown path.
pub async fn not_found(uri: Uri) -> AppError {
    debug!("No route for {}", uri.path());
    AppError::NotFound(format!("No route for {}", uri.path()))
}
