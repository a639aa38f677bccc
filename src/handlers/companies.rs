use crate::auth::{AdminUser, AuthUser, ensure_owner_or_admin};
use crate::error::{AppError, Result};
use crate::extractors::{AppJson, AppPath};
use crate::helpers::converters::{company_data_to_json, company_to_dto};
use crate::schemas::AppState;
use axum::{extract::State, http::StatusCode};
use chrono::Utc;
use common::{ApiResponse, ClearCompaniesDto, CompanyData, CompanyDto};
use model::entities::company;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, trace, warn};
use utoipa::ToSchema;
use validator::Validate;

/// Request body for creating a company
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateCompanyRequest {
    #[validate(length(min = 1, max = 200, message = "must be between 1 and 200 characters"))]
    pub name: String,
    /// Uploaded dataset, if any
    #[serde(default)]
    pub data: Option<CompanyData>,
}

/// Load a company and apply the owner-or-admin rule.
pub(crate) async fn find_owned_company(
    db: &DatabaseConnection,
    auth: &AuthUser,
    company_id: i32,
) -> Result<company::Model> {
    let AuthUser(claims) = auth;
    let found = company::Entity::find_by_id(company_id)
        .one(db)
        .await?
        .ok_or_else(|| {
            warn!("Company with ID {} not found", company_id);
            AppError::NotFound(format!("Company {} not found", company_id))
        })?;

    ensure_owner_or_admin(claims, found.created_by.as_deref()).inspect_err(|_| {
        warn!(
            "User '{}' denied access to company {} owned by {:?}",
            claims.username, company_id, found.created_by
        );
    })?;
    Ok(found)
}

/// List companies visible to the caller, newest first
#[utoipa::path(
    get,
    path = "/companies",
    tag = "companies",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Companies retrieved successfully", body = ApiResponse<Vec<CompanyDto>>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_companies(
    AuthUser(claims): AuthUser,
    State(state): State<AppState>,
) -> Result<AppJson<ApiResponse<Vec<CompanyDto>>>> {
    trace!("Entering get_companies function");

    let mut query = company::Entity::find()
        .order_by_desc(company::Column::CreatedAt)
        .order_by_desc(company::Column::Id);
    if !claims.is_admin() {
        debug!("Restricting listing to companies created by '{}'", claims.username);
        query = query.filter(company::Column::CreatedBy.eq(claims.username.as_str()));
    }

    let companies: Vec<CompanyDto> = query
        .all(&state.db)
        .await?
        .into_iter()
        .map(company_to_dto)
        .collect();

    info!("Successfully retrieved {} companies for '{}'", companies.len(), claims.username);
    Ok(AppJson(ApiResponse::ok(companies, "Companies retrieved successfully")))
}

/// Create a company owned by the caller
#[utoipa::path(
    post,
    path = "/companies",
    tag = "companies",
    security(("bearer_auth" = [])),
    request_body = CreateCompanyRequest,
    responses(
        (status = 201, description = "Company created successfully", body = ApiResponse<CompanyDto>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn create_company(
    AuthUser(claims): AuthUser,
    State(state): State<AppState>,
    AppJson(request): AppJson<CreateCompanyRequest>,
) -> Result<(StatusCode, AppJson<ApiResponse<CompanyDto>>)> {
    trace!("Entering create_company function");
    request.validate()?;

    if let Some(data) = &request.data {
        debug!(
            "Company '{}' arrives with {} data rows ({} blank sheet names)",
            request.name,
            data.row_count(),
            data.blank_sheet_names()
        );
    }

    let data = request
        .data
        .as_ref()
        .map(company_data_to_json)
        .transpose()
        .map_err(|e| {
            error!("Failed to serialize company data: {}", e);
            AppError::Internal("Failed to serialize company data".to_string())
        })?;

    let new_company = company::ActiveModel {
        name: Set(request.name.clone()),
        data: Set(data),
        created_by: Set(Some(claims.username.clone())),
        created_at: Set(Utc::now()),
        questionnaire_answers: Set(None),
        questionnaire_updated_at: Set(None),
        ..Default::default()
    };
    let created = new_company.insert(&state.db).await?;

    info!(
        "Company created successfully with ID: {}, name: {}, by: {}",
        created.id, created.name, claims.username
    );
    Ok((
        StatusCode::CREATED,
        AppJson(ApiResponse::ok(company_to_dto(created), "Company created successfully")),
    ))
}

/// Get one company
#[utoipa::path(
    get,
    path = "/companies/{company_id}",
    tag = "companies",
    security(("bearer_auth" = [])),
    params(
        ("company_id" = i32, Path, description = "Company ID"),
    ),
    responses(
        (status = 200, description = "Company retrieved successfully", body = ApiResponse<CompanyDto>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller neither owns the company nor is an admin", body = ErrorResponse),
        (status = 404, description = "Company not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_company(
    auth: AuthUser,
    AppPath(company_id): AppPath<i32>,
    State(state): State<AppState>,
) -> Result<AppJson<ApiResponse<CompanyDto>>> {
    trace!("Entering get_company function for company_id: {}", company_id);
    let found = find_owned_company(&state.db, &auth, company_id).await?;
    Ok(AppJson(ApiResponse::ok(company_to_dto(found), "Company retrieved successfully")))
}

/// Delete every company
#[utoipa::path(
    post,
    path = "/clear-companies",
    tag = "companies",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Companies cleared", body = ApiResponse<ClearCompaniesDto>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Admin access required", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn clear_companies(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
) -> Result<AppJson<ApiResponse<ClearCompaniesDto>>> {
    trace!("Entering clear_companies function");

    let result = company::Entity::delete_many().exec(&state.db).await?;

    warn!("Admin '{}' cleared {} companies", admin.username, result.rows_affected);
    Ok(AppJson(ApiResponse::ok(
        ClearCompaniesDto { deleted: result.rows_affected },
        "Companies cleared successfully",
    )))
}
