//! Bearer-token authentication and authorization.
//!
//! Tokens are HS256 JWTs signed with the shared `JWT_SECRET`. Handlers opt in
//! by taking an [`AuthUser`] or [`AdminUser`] extractor; resource-owning
//! handlers additionally call [`ensure_owner_or_admin`].

mod error;
mod extract;
mod password;
mod tokens;

pub use error::AuthError;
pub use extract::{AdminUser, AuthUser};
pub use password::{hash_password, reject_unknown_user, verify_password};
pub use tokens::{bearer_token, Claims, TokenService};

use crate::error::AppError;

/// Allow access when the caller created the resource or is an admin.
///
/// Resources without a recorded creator are admin-only.
pub fn ensure_owner_or_admin(claims: &Claims, created_by: Option<&str>) -> Result<(), AppError> {
    if claims.role.is_admin() || created_by == Some(claims.username.as_str()) {
        return Ok(());
    }
    Err(AppError::Forbidden(
        "Access denied: you do not own this resource".to_string(),
    ))
}
