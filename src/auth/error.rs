//! Authentication error types.

use thiserror::Error;

/// Errors that can occur while authenticating a request or a login.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No `Authorization` header on a protected request.
    #[error("No token provided")]
    MissingToken,

    /// Malformed header, bad signature, expired token or unknown role.
    #[error("Invalid token")]
    InvalidToken,

    /// Unknown username or wrong password.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Failed to hash password")]
    PasswordHash,

    #[error("Failed to issue token: {0}")]
    TokenIssue(#[source] jsonwebtoken::errors::Error),
}

impl AuthError {
    /// Failures caused by the server rather than the caller.
    pub fn is_server_fault(&self) -> bool {
        matches!(self, Self::PasswordHash | Self::TokenIssue(_))
    }
}
