use crate::handlers::{
    auth::{login, logout, verify},
    companies::{clear_companies, create_company, get_companies, get_company},
    fallback::{method_not_allowed, not_found},
    health::health_check,
    questionnaire::{get_questionnaire, save_questionnaire},
    users::{
        create_user, delete_user, delete_user_by_query, get_user, get_users, update_user,
        update_user_by_query,
    },
};
use crate::schemas::{ApiDoc, AppState};
use axum::{
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check).fallback(method_not_allowed))
        // Authentication
        .route("/auth-login", post(login).fallback(method_not_allowed))
        .route("/auth-logout", post(logout).fallback(method_not_allowed))
        .route("/auth-verify", get(verify).fallback(method_not_allowed))
        // User administration
        .route(
            "/users",
            get(get_users)
                .post(create_user)
                .put(update_user_by_query)
                .delete(delete_user_by_query)
                .fallback(method_not_allowed),
        )
        .route(
            "/users/:user_id",
            get(get_user)
                .put(update_user)
                .delete(delete_user)
                .fallback(method_not_allowed),
        )
        // Companies
        .route(
            "/companies",
            get(get_companies).post(create_company).fallback(method_not_allowed),
        )
        .route("/companies/:company_id", get(get_company).fallback(method_not_allowed))
        .route("/clear-companies", post(clear_companies).fallback(method_not_allowed))
        // Questionnaire answers
        .route(
            "/questionnaire/:company_id",
            get(get_questionnaire)
                .post(save_questionnaire)
                .fallback(method_not_allowed),
        )
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .fallback(not_found)
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(Duration::from_secs(30)))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
