use crate::auth::{AuthUser, reject_unknown_user, verify_password};
use crate::error::Result;
use crate::extractors::AppJson;
use crate::helpers::converters::{role_from_model, user_to_dto};
use crate::schemas::AppState;
use axum::extract::State;
use common::{ApiResponse, IdentityDto, LoginResponse};
use model::entities::user;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};
use utoipa::ToSchema;
use validator::Validate;

/// Login credentials
#[derive(Deserialize, Serialize, ToSchema, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "must not be empty"))]
    pub username: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Exchange credentials for a bearer token
#[utoipa::path(
    post,
    path = "/auth-login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = ApiResponse<LoginResponse>),
        (status = 400, description = "Missing username or password", body = ErrorResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(request): AppJson<LoginRequest>,
) -> Result<AppJson<ApiResponse<LoginResponse>>> {
    trace!("Entering login function");
    request.validate()?;

    let Some(stored) = user::Entity::find()
        .filter(user::Column::Username.eq(&request.username))
        .one(&state.db)
        .await?
    else {
        warn!("Login attempt for unknown user '{}'", request.username);
        return Err(reject_unknown_user(&request.password).into());
    };

    if let Err(e) = verify_password(&request.password, &stored.password_hash) {
        warn!("Wrong password for user '{}'", stored.username);
        return Err(e.into());
    }

    let role = role_from_model(stored.role);
    let token = state.tokens.issue(stored.id, &stored.username, role)?;
    debug!("Issued token for user ID {} with role {}", stored.id, role);

    info!("User '{}' logged in", stored.username);
    Ok(AppJson(ApiResponse::ok(
        LoginResponse {
            token,
            token_type: "Bearer".to_string(),
            expires_in: state.tokens.ttl_seconds(),
            user: user_to_dto(stored),
        },
        "Login successful",
    )))
}

/// Acknowledge a logout. Tokens are stateless; the client discards its copy.
#[utoipa::path(
    post,
    path = "/auth-logout",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Logged out", body = ApiResponse<String>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn logout(AuthUser(claims): AuthUser) -> AppJson<ApiResponse<String>> {
    info!("User '{}' logged out", claims.username);
    AppJson(ApiResponse::ok(claims.username, "Logged out successfully"))
}

/// Echo the identity carried by the presented token
#[utoipa::path(
    get,
    path = "/auth-verify",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Token is valid", body = ApiResponse<IdentityDto>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn verify(AuthUser(claims): AuthUser) -> AppJson<ApiResponse<IdentityDto>> {
    debug!("Token verified for '{}'", claims.username);
    AppJson(ApiResponse::ok(claims.to_identity(), "Token is valid"))
}
