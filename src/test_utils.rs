#[cfg(test)]
pub mod test_utils {
    use crate::auth::TokenService;
    use crate::cli::commands::seed_user::upsert_user;
    use crate::helpers::retry::RetryConfig;
    use crate::router::create_router;
    use crate::schemas::AppState;
    use axum::http::{HeaderValue, StatusCode};
    use axum::Router;
    use axum_test::TestServer;
    use common::{ApiResponse, Role};
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{Database, DatabaseConnection};
    use std::time::Duration;
    use tracing::Level;
    use tracing_subscriber::FmtSubscriber;

    pub const TEST_JWT_SECRET: &[u8] = b"integration-test-signing-secret";

    pub const ADMIN: (&str, &str) = ("admin", "admin123");
    pub const PLANNER: (&str, &str) = ("planner", "planner123");
    pub const BUYER: (&str, &str) = ("buyer", "buyer123");

    /// Create an in-memory SQLite database for testing
    pub async fn setup_test_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("Failed to connect to in-memory database");

        // Run migrations
        Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");

        db
    }

    /// Create AppState for testing with one admin and two regular users
    pub async fn setup_test_app_state() -> AppState {
        let db = setup_test_db().await;

        upsert_user(&db, ADMIN.0, ADMIN.1, Role::Admin)
            .await
            .expect("Failed to create admin user");
        upsert_user(&db, PLANNER.0, PLANNER.1, Role::User)
            .await
            .expect("Failed to create planner user");
        upsert_user(&db, BUYER.0, BUYER.1, Role::User)
            .await
            .expect("Failed to create buyer user");

        AppState {
            db,
            tokens: TokenService::new(TEST_JWT_SECRET, chrono::Duration::hours(24)),
            retry: RetryConfig {
                max_attempts: 3,
                base_delay: Duration::from_millis(1),
            },
        }
    }

    /// Initialize tracing for tests with output to STDERR.
    ///
    /// The log level is determined by the RUST_LOG environment variable,
    /// defaulting to WARN if not set.
    fn init_test_tracing() -> tracing::subscriber::DefaultGuard {
        let log_level = std::env::var("RUST_LOG")
            .ok()
            .and_then(|level| match level.to_uppercase().as_str() {
                "ERROR" => Some(Level::ERROR),
                "WARN" => Some(Level::WARN),
                "INFO" => Some(Level::INFO),
                "DEBUG" => Some(Level::DEBUG),
                "TRACE" => Some(Level::TRACE),
                _ => None,
            })
            .unwrap_or(Level::WARN);

        let subscriber = FmtSubscriber::builder()
            .with_max_level(log_level)
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    /// Create axum app for testing
    pub async fn setup_test_app() -> Router {
        let _guard = init_test_tracing();
        let state = setup_test_app_state().await;
        create_router(state)
    }

    /// Test server plus the state behind it, for tests that inspect the database
    pub async fn setup_test_server() -> (TestServer, AppState) {
        let _guard = init_test_tracing();
        let state = setup_test_app_state().await;
        let server = TestServer::new(create_router(state.clone())).expect("Failed to start test server");
        (server, state)
    }

    /// Log in and return the bearer token
    pub async fn login(server: &TestServer, (username, password): (&str, &str)) -> String {
        let response = server
            .post("/auth-login")
            .json(&serde_json::json!({ "username": username, "password": password }))
            .await;
        response.assert_status(StatusCode::OK);

        let body: ApiResponse<serde_json::Value> = response.json();
        body.data["token"]
            .as_str()
            .expect("login response carries a token")
            .to_string()
    }

    /// `Authorization` header value for a token
    pub fn bearer(token: &str) -> HeaderValue {
        HeaderValue::from_str(&format!("Bearer {}", token)).expect("valid header value")
    }
}
