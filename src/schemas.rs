use crate::auth::TokenService;
use crate::helpers::retry::RetryConfig;
use common::{
    ApiResponse, ClearCompaniesDto, CompanyData, CompanyDto, IdentityDto, LoginResponse,
    QuestionnaireDto, Role, SpreadsheetUpload, UserDto,
};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::{
    Modify, OpenApi, ToSchema,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Database connection pool
    pub db: DatabaseConnection,
    /// Bearer token signer/verifier
    pub tokens: TokenService,
    /// Policy for the questionnaire save
    pub retry: RetryConfig,
}

/// Error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub message: String,
    /// Error code
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
    /// Error chain of server faults, only when detail exposure is enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::auth::login,
        crate::handlers::auth::logout,
        crate::handlers::auth::verify,
        crate::handlers::users::get_users,
        crate::handlers::users::create_user,
        crate::handlers::users::get_user,
        crate::handlers::users::update_user,
        crate::handlers::users::delete_user,
        crate::handlers::users::update_user_by_query,
        crate::handlers::users::delete_user_by_query,
        crate::handlers::companies::get_companies,
        crate::handlers::companies::create_company,
        crate::handlers::companies::get_company,
        crate::handlers::companies::clear_companies,
        crate::handlers::questionnaire::get_questionnaire,
        crate::handlers::questionnaire::save_questionnaire,
    ),
    components(
        schemas(
            ApiResponse<LoginResponse>,
            ApiResponse<IdentityDto>,
            ApiResponse<UserDto>,
            ApiResponse<Vec<UserDto>>,
            ApiResponse<CompanyDto>,
            ApiResponse<Vec<CompanyDto>>,
            ApiResponse<ClearCompaniesDto>,
            ApiResponse<QuestionnaireDto>,
            ApiResponse<String>,
            ErrorResponse,
            HealthResponse,
            Role,
            LoginResponse,
            IdentityDto,
            UserDto,
            CompanyDto,
            CompanyData,
            SpreadsheetUpload,
            ClearCompaniesDto,
            QuestionnaireDto,
            crate::handlers::auth::LoginRequest,
            crate::handlers::users::CreateUserRequest,
            crate::handlers::users::UpdateUserRequest,
            crate::handlers::companies::CreateCompanyRequest,
            crate::handlers::questionnaire::SaveQuestionnaireRequest,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Login and bearer token endpoints"),
        (name = "users", description = "Admin user management"),
        (name = "companies", description = "Company datasets"),
        (name = "questionnaire", description = "Per-company questionnaire answers"),
    ),
    info(
        title = "scmdash API",
        description = "Supply-chain metrics dashboard backend: authentication, users, companies and questionnaire answers",
        version = "0.1.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;
