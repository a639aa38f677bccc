use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use model::entities::user;
use sea_orm::EntityTrait;
use tracing::{debug, warn};

use super::{AuthError, Claims, bearer_token};
use crate::error::AppError;
use crate::helpers::converters::role_from_model;
use crate::schemas::AppState;

/// Any caller holding a valid bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

/// A caller whose token carries the `admin` role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub Claims);

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = match parts.headers.get(AUTHORIZATION) {
            Some(value) => Some(value.to_str().map_err(|_| AuthError::InvalidToken)?),
            None => None,
        };

        let token = bearer_token(header).inspect_err(|e| {
            debug!("Rejecting {} {}: {}", parts.method, parts.uri.path(), e);
        })?;
        let mut claims = state.tokens.verify(token)?;

        // Tokens outlive renames and deletions; the account must still match.
        let stored = user::Entity::find_by_id(claims.user_id).one(&state.db).await?;
        match stored {
            Some(stored) if stored.username == claims.username => {
                claims.role = role_from_model(stored.role);
            }
            _ => {
                warn!(
                    "Token for '{}' (ID {}) no longer matches a stored user",
                    claims.username, claims.user_id
                );
                return Err(AuthError::InvalidToken.into());
            }
        }

        debug!("Authenticated '{}' as {}", claims.username, claims.role);
        Ok(Self(claims))
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let AuthUser(claims) = AuthUser::from_request_parts(parts, state).await?;

        if !claims.is_admin() {
            warn!(
                "User '{}' denied admin-only {} {}",
                claims.username,
                parts.method,
                parts.uri.path()
            );
            return Err(AppError::Forbidden("Admin access required".to_string()));
        }

        Ok(Self(claims))
    }
}
