use crate::auth::{AdminUser, Claims, hash_password};
use crate::error::{AppError, Result};
use crate::extractors::{AppJson, AppPath, AppQuery};
use crate::helpers::converters::{role_to_model, user_to_dto};
use crate::schemas::AppState;
use axum::{extract::State, http::StatusCode};
use chrono::Utc;
use common::{ApiResponse, Role, UserDto};
use model::entities::{company, user};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    QueryFilter, QueryOrder, Set, SqlErr, TransactionTrait, sea_query::Expr,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, trace, warn};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Request body for creating a new user
#[derive(Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateUserRequest {
    /// Username (must be unique)
    #[validate(length(min = 1, max = 64, message = "must be between 1 and 64 characters"))]
    pub username: String,
    /// Plain-text password, hashed before storage
    #[validate(length(min = 6, message = "must be at least 6 characters"))]
    pub password: String,
    /// Defaults to `user`
    #[serde(default)]
    pub role: Option<Role>,
}

/// Request body for updating a user. Omitted fields stay unchanged.
#[derive(Deserialize, Serialize, ToSchema, Validate, Default)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 64, message = "must be between 1 and 64 characters"))]
    pub username: Option<String>,
    #[validate(length(min = 6, message = "must be at least 6 characters"))]
    pub password: Option<String>,
    pub role: Option<Role>,
}

/// Target of `PUT /users` and `DELETE /users`
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserIdQuery {
    /// User ID
    pub id: i32,
}

impl std::fmt::Debug for CreateUserRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateUserRequest")
            .field("username", &self.username)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for UpdateUserRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateUserRequest")
            .field("username", &self.username)
            .field("password_changed", &self.password.is_some())
            .field("role", &self.role)
            .finish()
    }
}

async fn ensure_username_free(
    db: &DatabaseConnection,
    username: &str,
    except_id: Option<i32>,
) -> Result<()> {
    let mut query = user::Entity::find().filter(user::Column::Username.eq(username));
    if let Some(id) = except_id {
        query = query.filter(user::Column::Id.ne(id));
    }

    if query.one(db).await?.is_some() {
        warn!("Username '{}' is already taken", username);
        return Err(AppError::Validation(format!("Username '{}' already exists", username)));
    }
    Ok(())
}

/// A concurrent insert can still hit the unique index after the pre-check.
fn map_unique_violation(err: DbErr, username: &str) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Validation(format!("Username '{}' already exists", username))
        }
        _ => err.into(),
    }
}

async fn find_user(db: &DatabaseConnection, user_id: i32) -> Result<user::Model> {
    user::Entity::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| {
            warn!("User with ID {} not found", user_id);
            AppError::NotFound(format!("User {} not found", user_id))
        })
}

/// List all users
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Users retrieved successfully", body = ApiResponse<Vec<UserDto>>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Admin access required", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_users(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
) -> Result<AppJson<ApiResponse<Vec<UserDto>>>> {
    trace!("Entering get_users function");

    let users = user::Entity::find()
        .order_by_asc(user::Column::Id)
        .all(&state.db)
        .await?;
    debug!("Retrieved {} users from database", users.len());

    let users: Vec<UserDto> = users.into_iter().map(user_to_dto).collect();
    info!("Admin '{}' listed {} users", admin.username, users.len());
    Ok(AppJson(ApiResponse::ok(users, "Users retrieved successfully")))
}

/// Create a new user
#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    security(("bearer_auth" = [])),
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created successfully", body = ApiResponse<UserDto>),
        (status = 400, description = "Invalid request or duplicate username", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Admin access required", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_user(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    AppJson(request): AppJson<CreateUserRequest>,
) -> Result<(StatusCode, AppJson<ApiResponse<UserDto>>)> {
    trace!("Entering create_user function");
    request.validate()?;
    ensure_username_free(&state.db, &request.username, None).await?;

    let role = request.role.unwrap_or_default();
    let new_user = user::ActiveModel {
        username: Set(request.username.clone()),
        password_hash: Set(hash_password(&request.password)?),
        role: Set(role_to_model(role)),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    let created = new_user
        .insert(&state.db)
        .await
        .map_err(|e| map_unique_violation(e, &request.username))?;

    info!(
        "Admin '{}' created user '{}' (ID {}) with role {}",
        admin.username, created.username, created.id, role
    );
    Ok((
        StatusCode::CREATED,
        AppJson(ApiResponse::ok(user_to_dto(created), "User created successfully")),
    ))
}

/// Get a specific user by ID
#[utoipa::path(
    get,
    path = "/users/{user_id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("user_id" = i32, Path, description = "User ID"),
    ),
    responses(
        (status = 200, description = "User retrieved successfully", body = ApiResponse<UserDto>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Admin access required", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_user(
    AdminUser(_admin): AdminUser,
    AppPath(user_id): AppPath<i32>,
    State(state): State<AppState>,
) -> Result<AppJson<ApiResponse<UserDto>>> {
    trace!("Entering get_user function for user_id: {}", user_id);
    let found = find_user(&state.db, user_id).await?;
    Ok(AppJson(ApiResponse::ok(user_to_dto(found), "User retrieved successfully")))
}

/// Update a user
///
/// Renaming a user also re-points the companies it created, so ownership
/// follows the new username.
#[utoipa::path(
    put,
    path = "/users/{user_id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("user_id" = i32, Path, description = "User ID"),
    ),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated successfully", body = ApiResponse<UserDto>),
        (status = 400, description = "Invalid request or duplicate username", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Admin access required", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_user(
    AdminUser(admin): AdminUser,
    AppPath(user_id): AppPath<i32>,
    State(state): State<AppState>,
    AppJson(request): AppJson<UpdateUserRequest>,
) -> Result<AppJson<ApiResponse<UserDto>>> {
    trace!("Entering update_user function for user_id: {}", user_id);
    apply_user_update(&state.db, &admin, user_id, request).await
}

/// Update a user identified by the `id` query parameter
#[utoipa::path(
    put,
    path = "/users",
    tag = "users",
    security(("bearer_auth" = [])),
    params(UserIdQuery),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated successfully", body = ApiResponse<UserDto>),
        (status = 400, description = "Missing id, invalid request or duplicate username", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Admin access required", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_user_by_query(
    AdminUser(admin): AdminUser,
    AppQuery(query): AppQuery<UserIdQuery>,
    State(state): State<AppState>,
    AppJson(request): AppJson<UpdateUserRequest>,
) -> Result<AppJson<ApiResponse<UserDto>>> {
    trace!("Entering update_user_by_query function for user_id: {}", query.id);
    apply_user_update(&state.db, &admin, query.id, request).await
}

async fn apply_user_update(
    db: &DatabaseConnection,
    admin: &Claims,
    user_id: i32,
    request: UpdateUserRequest,
) -> Result<AppJson<ApiResponse<UserDto>>> {
    request.validate()?;

    let existing = find_user(db, user_id).await?;
    let old_username = existing.username.clone();
    let mut active = existing.into_active_model();
    let mut updated_fields = Vec::new();

    let renamed_to = request
        .username
        .filter(|username| *username != old_username);
    if let Some(username) = &renamed_to {
        ensure_username_free(db, username, Some(user_id)).await?;
        active.username = Set(username.clone());
        updated_fields.push(format!("username: {}", username));
    }
    if let Some(password) = &request.password {
        active.password_hash = Set(hash_password(password)?);
        updated_fields.push("password".to_string());
    }
    if let Some(role) = request.role {
        active.role = Set(role_to_model(role));
        updated_fields.push(format!("role: {}", role));
    }

    if updated_fields.is_empty() {
        debug!("No fields to update for user ID: {}", user_id);
    } else {
        debug!("Updating fields: {}", updated_fields.join(", "));
    }

    let txn = db.begin().await?;
    let updated = active
        .update(&txn)
        .await
        .map_err(|e| map_unique_violation(e, renamed_to.as_deref().unwrap_or(&old_username)))?;

    if let Some(username) = &renamed_to {
        let moved = company::Entity::update_many()
            .col_expr(company::Column::CreatedBy, Expr::value(username.clone()))
            .filter(company::Column::CreatedBy.eq(old_username.as_str()))
            .exec(&txn)
            .await?;
        debug!(
            "Re-pointed {} companies from '{}' to '{}'",
            moved.rows_affected, old_username, username
        );
    }
    txn.commit().await.inspect_err(|e| {
        error!("Failed to commit update of user ID {}: {}", user_id, e);
    })?;

    info!(
        "Admin '{}' updated user ID {}. Updated fields: {}",
        admin.username,
        user_id,
        if updated_fields.is_empty() { "none".to_string() } else { updated_fields.join(", ") }
    );
    Ok(AppJson(ApiResponse::ok(user_to_dto(updated), "User updated successfully")))
}

/// Delete a user
#[utoipa::path(
    delete,
    path = "/users/{user_id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("user_id" = i32, Path, description = "User ID"),
    ),
    responses(
        (status = 200, description = "User deleted successfully", body = ApiResponse<String>),
        (status = 400, description = "Cannot delete own account", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Admin access required", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_user(
    AdminUser(admin): AdminUser,
    AppPath(user_id): AppPath<i32>,
    State(state): State<AppState>,
) -> Result<AppJson<ApiResponse<String>>> {
    trace!("Entering delete_user function for user_id: {}", user_id);
    remove_user(&state.db, &admin, user_id).await
}

/// Delete a user identified by the `id` query parameter
#[utoipa::path(
    delete,
    path = "/users",
    tag = "users",
    security(("bearer_auth" = [])),
    params(UserIdQuery),
    responses(
        (status = 200, description = "User deleted successfully", body = ApiResponse<String>),
        (status = 400, description = "Missing id or own account", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Admin access required", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_user_by_query(
    AdminUser(admin): AdminUser,
    AppQuery(query): AppQuery<UserIdQuery>,
    State(state): State<AppState>,
) -> Result<AppJson<ApiResponse<String>>> {
    trace!("Entering delete_user_by_query function for user_id: {}", query.id);
    remove_user(&state.db, &admin, query.id).await
}

/// Delete the user and orphan the companies it created.
///
/// Orphaned companies are admin-only, so a later user who takes the same
/// username does not inherit them.
async fn remove_user(
    db: &DatabaseConnection,
    admin: &Claims,
    user_id: i32,
) -> Result<AppJson<ApiResponse<String>>> {
    if admin.user_id == user_id {
        warn!("Admin '{}' tried to delete their own account", admin.username);
        return Err(AppError::Validation("You cannot delete your own account".to_string()));
    }

    let existing = find_user(db, user_id).await?;

    let txn = db.begin().await?;
    let orphaned = company::Entity::update_many()
        .col_expr(company::Column::CreatedBy, Expr::value(Option::<String>::None))
        .filter(company::Column::CreatedBy.eq(existing.username.as_str()))
        .exec(&txn)
        .await?;
    let result = user::Entity::delete_by_id(user_id).exec(&txn).await?;
    txn.commit().await.inspect_err(|e| {
        error!("Failed to commit deletion of user ID {}: {}", user_id, e);
    })?;

    debug!(
        "Delete operation completed. Rows affected: {}, companies orphaned: {}",
        result.rows_affected, orphaned.rows_affected
    );
    if result.rows_affected == 0 {
        warn!("User with ID {} vanished before deletion", user_id);
        return Err(AppError::NotFound(format!("User {} not found", user_id)));
    }

    info!("Admin '{}' deleted user ID {} ('{}')", admin.username, user_id, existing.username);
    Ok(AppJson(ApiResponse::ok(
        format!("User {} deleted", user_id),
        "User deleted successfully",
    )))
}
