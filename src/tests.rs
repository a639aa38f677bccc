#[cfg(test)]
mod integration_tests {
    use crate::schemas::{AppState, ErrorResponse, HealthResponse};
    use crate::test_utils::test_utils::{
        bearer, login, setup_test_app, setup_test_server, ADMIN, BUYER, PLANNER, TEST_JWT_SECRET,
    };
    use crate::auth::TokenService;
    use axum::http::{header::AUTHORIZATION, HeaderValue, StatusCode};
    use axum_test::TestServer;
    use common::{ApiResponse, ClearCompaniesDto, CompanyDto, IdentityDto, LoginResponse, QuestionnaireDto, Role, UserDto};
    use model::entities::company;
    use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
    use serde_json::json;

    async fn create_company(server: &TestServer, token: &str, name: &str) -> CompanyDto {
        let response = server
            .post("/companies")
            .add_header(AUTHORIZATION, bearer(token))
            .json(&json!({ "name": name }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<CompanyDto> = response.json();
        body.data
    }

    async fn user_id(state: &AppState, username: &str) -> i32 {
        model::entities::user::Entity::find()
            .filter(model::entities::user::Column::Username.eq(username))
            .one(&state.db)
            .await
            .unwrap()
            .expect("seeded user exists")
            .id
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let response = server.get("/health").await;

        response.assert_status(StatusCode::OK);
        let body: HealthResponse = response.json();
        assert_eq!(body.status, "healthy");
        assert_eq!(body.database, "connected");
    }

    // ===================== Authentication =====================

    #[tokio::test]
    async fn test_admin_login_scenario() {
        let (server, state) = setup_test_server().await;

        let response = server
            .post("/auth-login")
            .json(&json!({ "username": "admin", "password": "admin123" }))
            .await;
        response.assert_status(StatusCode::OK);

        let body: ApiResponse<LoginResponse> = response.json();
        assert!(body.success);
        assert_eq!(body.data.token_type, "Bearer");
        assert_eq!(body.data.expires_in, 24 * 3600);
        assert_eq!(body.data.user.username, "admin");
        assert_eq!(body.data.user.role, Role::Admin);

        let claims = state.tokens.verify(&body.data.token).unwrap();
        assert_eq!(claims.username, "admin");
        assert_eq!(claims.role, Role::Admin);

        // The token lists users without exposing hashes
        let users = server
            .get("/users")
            .add_header(AUTHORIZATION, bearer(&body.data.token))
            .await;
        users.assert_status(StatusCode::OK);
        let text = users.text();
        assert!(!text.contains("password"));
        assert!(!text.contains("$argon2"));

        // Without the header the same request is rejected
        let anonymous = server.get("/users").await;
        anonymous.assert_status(StatusCode::UNAUTHORIZED);
        let error: ErrorResponse = anonymous.json();
        assert_eq!(error.message, "No token provided");
        assert_eq!(error.code, "UNAUTHORIZED");
        assert!(!error.success);
    }

    #[tokio::test]
    async fn test_login_token_matches_stored_user() {
        let (server, state) = setup_test_server().await;
        let token = login(&server, PLANNER).await;

        let claims = state.tokens.verify(&token).unwrap();
        assert_eq!(claims.username, "planner");
        assert_eq!(claims.role, Role::User);
        assert_eq!(claims.user_id, user_id(&state, "planner").await);
    }

    #[tokio::test]
    async fn test_login_rejects_bad_credentials() {
        let (server, _) = setup_test_server().await;

        for (username, password) in [("admin", "wrong-password"), ("ghost", "admin123")] {
            let response = server
                .post("/auth-login")
                .json(&json!({ "username": username, "password": password }))
                .await;
            response.assert_status(StatusCode::UNAUTHORIZED);
            let error: ErrorResponse = response.json();
            assert_eq!(error.message, "Invalid credentials");
        }
    }

    #[tokio::test]
    async fn test_login_requires_both_fields() {
        let (server, _) = setup_test_server().await;

        let response = server
            .post("/auth-login")
            .json(&json!({ "username": "admin", "password": "" }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let error: ErrorResponse = response.json();
        assert_eq!(error.code, "VALIDATION_ERROR");
        assert!(error.message.contains("password"));

        let missing = server.post("/auth-login").json(&json!({ "username": "admin" })).await;
        missing.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_protected_endpoints_require_token() {
        let (server, _) = setup_test_server().await;

        let requests = vec![
            server.post("/auth-logout"),
            server.get("/auth-verify"),
            server.get("/users"),
            server.post("/users").json(&json!({ "username": "x", "password": "123456" })),
            server.get("/users/1"),
            server.put("/users/1").json(&json!({})),
            server.delete("/users/2"),
            server.put("/users").add_query_param("id", 1).json(&json!({})),
            server.delete("/users").add_query_param("id", 2),
            server.get("/companies"),
            server.post("/companies").json(&json!({ "name": "Acme" })),
            server.get("/companies/1"),
            server.post("/clear-companies"),
            server.get("/questionnaire/1"),
            server.post("/questionnaire/1").json(&json!({ "answers": {} })),
        ];

        for request in requests {
            let response = request.await;
            response.assert_status(StatusCode::UNAUTHORIZED);
            let error: ErrorResponse = response.json();
            assert_eq!(error.message, "No token provided");
        }
    }

    #[tokio::test]
    async fn test_invalid_tokens_are_rejected() {
        let (server, _) = setup_test_server().await;
        let token = login(&server, ADMIN).await;

        let forged = TokenService::new(b"some-other-secret", chrono::Duration::hours(1))
            .issue(1, "admin", Role::Admin)
            .unwrap();
        let expired = TokenService::new(TEST_JWT_SECRET, chrono::Duration::seconds(-120))
            .issue(1, "admin", Role::Admin)
            .unwrap();

        let headers = [
            HeaderValue::from_static("Bearer"),
            HeaderValue::from_static("Bearer not-a-jwt"),
            HeaderValue::from_str(&format!("Basic {}", token)).unwrap(),
            bearer(&forged),
            bearer(&expired),
        ];

        for header in headers {
            let response = server.get("/companies").add_header(AUTHORIZATION, header).await;
            response.assert_status(StatusCode::UNAUTHORIZED);
            let error: ErrorResponse = response.json();
            assert_eq!(error.message, "Invalid token");
        }
    }

    #[tokio::test]
    async fn test_verify_and_logout() {
        let (server, _) = setup_test_server().await;
        let token = login(&server, BUYER).await;

        let response = server.get("/auth-verify").add_header(AUTHORIZATION, bearer(&token)).await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<IdentityDto> = response.json();
        assert_eq!(body.data.username, "buyer");
        assert_eq!(body.data.role, Role::User);

        let response = server.post("/auth-logout").add_header(AUTHORIZATION, bearer(&token)).await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<String> = response.json();
        assert_eq!(body.message, "Logged out successfully");
    }

    // ===================== Users =====================

    #[tokio::test]
    async fn test_admin_only_endpoints_reject_users() {
        let (server, _) = setup_test_server().await;
        let token = login(&server, PLANNER).await;

        let requests = vec![
            server.get("/users"),
            server.post("/users").json(&json!({ "username": "intruder", "password": "123456" })),
            server.get("/users/1"),
            server.put("/users/1").json(&json!({ "role": "user" })),
            server.delete("/users/1"),
            server.post("/clear-companies"),
        ];

        for request in requests {
            let response = request.add_header(AUTHORIZATION, bearer(&token)).await;
            response.assert_status(StatusCode::FORBIDDEN);
            let error: ErrorResponse = response.json();
            assert_eq!(error.code, "FORBIDDEN");
        }
    }

    #[tokio::test]
    async fn test_get_users() {
        let (server, _) = setup_test_server().await;
        let token = login(&server, ADMIN).await;

        let response = server.get("/users").add_header(AUTHORIZATION, bearer(&token)).await;
        response.assert_status(StatusCode::OK);

        let body: ApiResponse<Vec<UserDto>> = response.json();
        let names: Vec<&str> = body.data.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, vec!["admin", "planner", "buyer"]);
    }

    #[tokio::test]
    async fn test_create_user_and_login() {
        let (server, _) = setup_test_server().await;
        let token = login(&server, ADMIN).await;

        let response = server
            .post("/users")
            .add_header(AUTHORIZATION, bearer(&token))
            .json(&json!({ "username": "analyst", "password": "kpi-2024" }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<UserDto> = response.json();
        assert_eq!(body.message, "User created successfully");
        assert_eq!(body.data.username, "analyst");
        assert_eq!(body.data.role, Role::User);
        assert!(!response.text().contains("password"));

        login(&server, ("analyst", "kpi-2024")).await;
    }

    #[tokio::test]
    async fn test_create_user_validation() {
        let (server, _) = setup_test_server().await;
        let token = login(&server, ADMIN).await;

        let duplicate = server
            .post("/users")
            .add_header(AUTHORIZATION, bearer(&token))
            .json(&json!({ "username": "planner", "password": "123456" }))
            .await;
        duplicate.assert_status(StatusCode::BAD_REQUEST);
        let error: ErrorResponse = duplicate.json();
        assert_eq!(error.message, "Username 'planner' already exists");

        let short = server
            .post("/users")
            .add_header(AUTHORIZATION, bearer(&token))
            .json(&json!({ "username": "newbie", "password": "12345" }))
            .await;
        short.assert_status(StatusCode::BAD_REQUEST);
        let error: ErrorResponse = short.json();
        assert!(error.message.contains("at least 6 characters"));

        let bad_role = server
            .post("/users")
            .add_header(AUTHORIZATION, bearer(&token))
            .json(&json!({ "username": "newbie", "password": "123456", "role": "root" }))
            .await;
        bad_role.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_get_user_by_id_and_not_found() {
        let (server, state) = setup_test_server().await;
        let token = login(&server, ADMIN).await;
        let planner_id = user_id(&state, "planner").await;

        let response = server
            .get(&format!("/users/{}", planner_id))
            .add_header(AUTHORIZATION, bearer(&token))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<UserDto> = response.json();
        assert_eq!(body.data.username, "planner");

        let missing = server.get("/users/9999").add_header(AUTHORIZATION, bearer(&token)).await;
        missing.assert_status(StatusCode::NOT_FOUND);
        let error: ErrorResponse = missing.json();
        assert_eq!(error.code, "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_update_user_role_and_password() {
        let (server, state) = setup_test_server().await;
        let token = login(&server, ADMIN).await;
        let buyer_id = user_id(&state, "buyer").await;

        let response = server
            .put(&format!("/users/{}", buyer_id))
            .add_header(AUTHORIZATION, bearer(&token))
            .json(&json!({ "password": "new-secret", "role": "admin" }))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<UserDto> = response.json();
        assert_eq!(body.data.role, Role::Admin);

        let new_token = login(&server, ("buyer", "new-secret")).await;
        assert!(state.tokens.verify(&new_token).unwrap().is_admin());

        let old_password = server
            .post("/auth-login")
            .json(&json!({ "username": "buyer", "password": "buyer123" }))
            .await;
        old_password.assert_status(StatusCode::UNAUTHORIZED);

        let missing = server
            .put("/users/9999")
            .add_header(AUTHORIZATION, bearer(&token))
            .json(&json!({ "role": "user" }))
            .await;
        missing.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_rename_user_keeps_company_ownership() {
        let (server, state) = setup_test_server().await;
        let admin_token = login(&server, ADMIN).await;
        let planner_token = login(&server, PLANNER).await;
        let planner_id = user_id(&state, "planner").await;

        let owned = create_company(&server, &planner_token, "Northwind Cold Chain").await;

        let taken = server
            .put(&format!("/users/{}", planner_id))
            .add_header(AUTHORIZATION, bearer(&admin_token))
            .json(&json!({ "username": "buyer" }))
            .await;
        taken.assert_status(StatusCode::BAD_REQUEST);

        let response = server
            .put(&format!("/users/{}", planner_id))
            .add_header(AUTHORIZATION, bearer(&admin_token))
            .json(&json!({ "username": "lead-planner" }))
            .await;
        response.assert_status(StatusCode::OK);

        let stored = company::Entity::find_by_id(owned.id).one(&state.db).await.unwrap().unwrap();
        assert_eq!(stored.created_by.as_deref(), Some("lead-planner"));

        let renamed_token = login(&server, ("lead-planner", "planner123")).await;
        let response = server
            .get(&format!("/questionnaire/{}", owned.id))
            .add_header(AUTHORIZATION, bearer(&renamed_token))
            .await;
        response.assert_status(StatusCode::OK);
    }

    #[tokio::test]
    async fn test_delete_user() {
        let (server, state) = setup_test_server().await;
        let token = login(&server, ADMIN).await;
        let admin_id = user_id(&state, "admin").await;
        let buyer_id = user_id(&state, "buyer").await;

        let own = server
            .delete(&format!("/users/{}", admin_id))
            .add_header(AUTHORIZATION, bearer(&token))
            .await;
        own.assert_status(StatusCode::BAD_REQUEST);

        let response = server
            .delete(&format!("/users/{}", buyer_id))
            .add_header(AUTHORIZATION, bearer(&token))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<String> = response.json();
        assert_eq!(body.message, "User deleted successfully");

        let again = server
            .delete(&format!("/users/{}", buyer_id))
            .add_header(AUTHORIZATION, bearer(&token))
            .await;
        again.assert_status(StatusCode::NOT_FOUND);

        let gone = server
            .post("/auth-login")
            .json(&json!({ "username": "buyer", "password": "buyer123" }))
            .await;
        gone.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_update_and_delete_user_by_query_id() {
        let (server, state) = setup_test_server().await;
        let token = login(&server, ADMIN).await;
        let buyer_id = user_id(&state, "buyer").await;

        let response = server
            .put("/users")
            .add_query_param("id", buyer_id)
            .add_header(AUTHORIZATION, bearer(&token))
            .json(&json!({ "role": "admin" }))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<UserDto> = response.json();
        assert_eq!(body.data.id, buyer_id);
        assert_eq!(body.data.role, Role::Admin);

        let missing_id = server
            .delete("/users")
            .add_header(AUTHORIZATION, bearer(&token))
            .await;
        missing_id.assert_status(StatusCode::BAD_REQUEST);
        let error: ErrorResponse = missing_id.json();
        assert_eq!(error.code, "VALIDATION_ERROR");

        let response = server
            .delete("/users")
            .add_query_param("id", buyer_id)
            .add_header(AUTHORIZATION, bearer(&token))
            .await;
        response.assert_status(StatusCode::OK);

        let again = server
            .delete("/users")
            .add_query_param("id", buyer_id)
            .add_header(AUTHORIZATION, bearer(&token))
            .await;
        again.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_recreated_username_does_not_inherit_companies() {
        let (server, state) = setup_test_server().await;
        let admin_token = login(&server, ADMIN).await;
        let planner_token = login(&server, PLANNER).await;
        let planner_id = user_id(&state, "planner").await;
        let owned = create_company(&server, &planner_token, "Planner Secret Co").await;

        server
            .delete(&format!("/users/{}", planner_id))
            .add_header(AUTHORIZATION, bearer(&admin_token))
            .await
            .assert_status(StatusCode::OK);

        let stored = company::Entity::find_by_id(owned.id).one(&state.db).await.unwrap().unwrap();
        assert!(stored.created_by.is_none());

        // The deleted account's token no longer works
        let stale = server.get("/companies").add_header(AUTHORIZATION, bearer(&planner_token)).await;
        stale.assert_status(StatusCode::UNAUTHORIZED);

        server
            .post("/users")
            .add_header(AUTHORIZATION, bearer(&admin_token))
            .json(&json!({ "username": "planner", "password": "different-pass" }))
            .await
            .assert_status(StatusCode::CREATED);
        let newcomer = login(&server, ("planner", "different-pass")).await;

        let listed: ApiResponse<Vec<CompanyDto>> = server
            .get("/companies")
            .add_header(AUTHORIZATION, bearer(&newcomer))
            .await
            .json();
        assert!(listed.data.is_empty());

        server
            .get(&format!("/questionnaire/{}", owned.id))
            .add_header(AUTHORIZATION, bearer(&newcomer))
            .await
            .assert_status(StatusCode::FORBIDDEN);
        server
            .post(&format!("/questionnaire/{}", owned.id))
            .add_header(AUTHORIZATION, bearer(&newcomer))
            .json(&json!({ "answers": { "q1": "overwritten" } }))
            .await
            .assert_status(StatusCode::FORBIDDEN);

        // Orphaned companies stay reachable for admins
        server
            .get(&format!("/questionnaire/{}", owned.id))
            .add_header(AUTHORIZATION, bearer(&admin_token))
            .await
            .assert_status(StatusCode::OK);
    }

    #[tokio::test]
    async fn test_token_issued_before_rename_is_rejected() {
        let (server, state) = setup_test_server().await;
        let admin_token = login(&server, ADMIN).await;
        let old_token = login(&server, PLANNER).await;
        let planner_id = user_id(&state, "planner").await;

        server
            .put(&format!("/users/{}", planner_id))
            .add_header(AUTHORIZATION, bearer(&admin_token))
            .json(&json!({ "username": "lead-planner" }))
            .await
            .assert_status(StatusCode::OK);

        // Someone else takes the old name
        server
            .post("/users")
            .add_header(AUTHORIZATION, bearer(&admin_token))
            .json(&json!({ "username": "planner", "password": "another-pass" }))
            .await
            .assert_status(StatusCode::CREATED);

        let response = server.get("/companies").add_header(AUTHORIZATION, bearer(&old_token)).await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        let error: ErrorResponse = response.json();
        assert_eq!(error.message, "Invalid token");
    }

    #[tokio::test]
    async fn test_role_change_applies_to_existing_tokens() {
        let (server, state) = setup_test_server().await;
        let admin_token = login(&server, ADMIN).await;
        let buyer_token = login(&server, BUYER).await;
        let buyer_id = user_id(&state, "buyer").await;

        server.get("/users").add_header(AUTHORIZATION, bearer(&buyer_token)).await
            .assert_status(StatusCode::FORBIDDEN);

        server
            .put(&format!("/users/{}", buyer_id))
            .add_header(AUTHORIZATION, bearer(&admin_token))
            .json(&json!({ "role": "admin" }))
            .await
            .assert_status(StatusCode::OK);

        server.get("/users").add_header(AUTHORIZATION, bearer(&buyer_token)).await
            .assert_status(StatusCode::OK);
    }

    // ===================== Companies =====================

    #[tokio::test]
    async fn test_company_listing_is_scoped_to_owner() {
        let (server, _) = setup_test_server().await;
        let admin_token = login(&server, ADMIN).await;
        let planner_token = login(&server, PLANNER).await;
        let buyer_token = login(&server, BUYER).await;

        let first = create_company(&server, &planner_token, "Northwind").await;
        let second = create_company(&server, &planner_token, "Contoso").await;
        let foreign = create_company(&server, &buyer_token, "Fabrikam").await;
        assert_eq!(first.created_by.as_deref(), Some("planner"));
        assert!(!first.has_questionnaire);

        let response = server.get("/companies").add_header(AUTHORIZATION, bearer(&planner_token)).await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Vec<CompanyDto>> = response.json();
        let ids: Vec<i32> = body.data.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);

        let response = server.get("/companies").add_header(AUTHORIZATION, bearer(&admin_token)).await;
        let body: ApiResponse<Vec<CompanyDto>> = response.json();
        let ids: Vec<i32> = body.data.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![foreign.id, second.id, first.id]);
    }

    #[tokio::test]
    async fn test_create_company_with_spreadsheet_data() {
        let (server, _) = setup_test_server().await;
        let token = login(&server, PLANNER).await;

        let response = server
            .post("/companies")
            .add_header(AUTHORIZATION, bearer(&token))
            .json(&json!({
                "name": "Northwind Cold Chain",
                "data": {
                    "kind": "spreadsheet",
                    "file_name": "otif_q1.xlsx",
                    "sheets": { "Deliveries": [ { "order": "PO-1", "on_time": true } ] }
                }
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<CompanyDto> = response.json();
        let data = body.data.data.expect("data is stored");
        assert_eq!(data.row_count(), 1);

        let fetched = server
            .get(&format!("/companies/{}", body.data.id))
            .add_header(AUTHORIZATION, bearer(&token))
            .await;
        fetched.assert_status(StatusCode::OK);
        let fetched: ApiResponse<CompanyDto> = fetched.json();
        assert_eq!(fetched.data.data, Some(data));
    }

    #[tokio::test]
    async fn test_create_company_validation() {
        let (server, _) = setup_test_server().await;
        let token = login(&server, PLANNER).await;

        let empty_name = server
            .post("/companies")
            .add_header(AUTHORIZATION, bearer(&token))
            .json(&json!({ "name": "" }))
            .await;
        empty_name.assert_status(StatusCode::BAD_REQUEST);

        let untagged = server
            .post("/companies")
            .add_header(AUTHORIZATION, bearer(&token))
            .json(&json!({ "name": "Acme", "data": { "sheets": {} } }))
            .await;
        untagged.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_get_company_enforces_ownership() {
        let (server, _) = setup_test_server().await;
        let admin_token = login(&server, ADMIN).await;
        let planner_token = login(&server, PLANNER).await;
        let buyer_token = login(&server, BUYER).await;
        let owned = create_company(&server, &planner_token, "Northwind").await;
        let path = format!("/companies/{}", owned.id);

        server.get(&path).add_header(AUTHORIZATION, bearer(&planner_token)).await
            .assert_status(StatusCode::OK);
        server.get(&path).add_header(AUTHORIZATION, bearer(&admin_token)).await
            .assert_status(StatusCode::OK);
        server.get(&path).add_header(AUTHORIZATION, bearer(&buyer_token)).await
            .assert_status(StatusCode::FORBIDDEN);
        server.get("/companies/4242").add_header(AUTHORIZATION, bearer(&admin_token)).await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_clear_companies() {
        let (server, state) = setup_test_server().await;
        let admin_token = login(&server, ADMIN).await;
        let planner_token = login(&server, PLANNER).await;
        create_company(&server, &planner_token, "Northwind").await;
        create_company(&server, &admin_token, "Contoso").await;

        let response = server
            .post("/clear-companies")
            .add_header(AUTHORIZATION, bearer(&admin_token))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<ClearCompaniesDto> = response.json();
        assert_eq!(body.data.deleted, 2);

        assert!(company::Entity::find().all(&state.db).await.unwrap().is_empty());
    }

    // ===================== Questionnaire =====================

    #[tokio::test]
    async fn test_questionnaire_round_trip() {
        let (server, _) = setup_test_server().await;
        let token = login(&server, PLANNER).await;
        let owned = create_company(&server, &token, "Northwind").await;
        let path = format!("/questionnaire/{}", owned.id);

        let empty = server.get(&path).add_header(AUTHORIZATION, bearer(&token)).await;
        empty.assert_status(StatusCode::OK);
        let body: ApiResponse<QuestionnaireDto> = empty.json();
        assert!(body.data.answers.is_empty());
        assert!(body.data.updated_at.is_none());

        let answers = json!({
            "uses_fefo": true,
            "supplier_count": 42,
            "otif_target": 0.95,
            "audit_notes": "Quarterly audits",
            "sites": ["Rotterdam", "Gdansk"],
            "escalation": { "owner": "QA", "days": 3 },
            "unknown": null
        });
        let saved = server
            .post(&path)
            .add_header(AUTHORIZATION, bearer(&token))
            .json(&json!({ "answers": answers }))
            .await;
        saved.assert_status(StatusCode::OK);
        let saved: ApiResponse<QuestionnaireDto> = saved.json();
        assert_eq!(saved.data.company_id, owned.id);
        assert!(saved.data.updated_at.is_some());

        let fetched = server.get(&path).add_header(AUTHORIZATION, bearer(&token)).await;
        let fetched: ApiResponse<QuestionnaireDto> = fetched.json();
        assert_eq!(serde_json::to_value(&fetched.data.answers).unwrap(), answers);
        assert_eq!(fetched.data.answers, saved.data.answers);

        let company = server
            .get(&format!("/companies/{}", owned.id))
            .add_header(AUTHORIZATION, bearer(&token))
            .await;
        let company: ApiResponse<CompanyDto> = company.json();
        assert!(company.data.has_questionnaire);
    }

    #[tokio::test]
    async fn test_questionnaire_save_replaces_previous_answers() {
        let (server, _) = setup_test_server().await;
        let token = login(&server, PLANNER).await;
        let owned = create_company(&server, &token, "Northwind").await;
        let path = format!("/questionnaire/{}", owned.id);

        for answers in [json!({ "q1": "a", "q2": "b" }), json!({ "q3": "c" })] {
            server
                .post(&path)
                .add_header(AUTHORIZATION, bearer(&token))
                .json(&json!({ "answers": answers }))
                .await
                .assert_status(StatusCode::OK);
        }

        let fetched: ApiResponse<QuestionnaireDto> =
            server.get(&path).add_header(AUTHORIZATION, bearer(&token)).await.json();
        assert_eq!(serde_json::to_value(&fetched.data.answers).unwrap(), json!({ "q3": "c" }));
    }

    #[tokio::test]
    async fn test_questionnaire_requires_owner_or_admin() {
        let (server, _) = setup_test_server().await;
        let admin_token = login(&server, ADMIN).await;
        let planner_token = login(&server, PLANNER).await;
        let buyer_token = login(&server, BUYER).await;
        let owned = create_company(&server, &planner_token, "Northwind").await;
        let path = format!("/questionnaire/{}", owned.id);

        let forbidden = server
            .post(&path)
            .add_header(AUTHORIZATION, bearer(&buyer_token))
            .json(&json!({ "answers": { "q1": "tampered" } }))
            .await;
        forbidden.assert_status(StatusCode::FORBIDDEN);
        server.get(&path).add_header(AUTHORIZATION, bearer(&buyer_token)).await
            .assert_status(StatusCode::FORBIDDEN);

        let by_admin = server
            .post(&path)
            .add_header(AUTHORIZATION, bearer(&admin_token))
            .json(&json!({ "answers": { "q1": "reviewed" } }))
            .await;
        by_admin.assert_status(StatusCode::OK);

        let fetched: ApiResponse<QuestionnaireDto> =
            server.get(&path).add_header(AUTHORIZATION, bearer(&planner_token)).await.json();
        assert_eq!(fetched.data.answers.get("q1"), Some(&json!("reviewed")));
    }

    #[tokio::test]
    async fn test_questionnaire_missing_company_and_bad_body() {
        let (server, _) = setup_test_server().await;
        let token = login(&server, ADMIN).await;

        let missing = server
            .post("/questionnaire/4242")
            .add_header(AUTHORIZATION, bearer(&token))
            .json(&json!({ "answers": {} }))
            .await;
        missing.assert_status(StatusCode::NOT_FOUND);

        let owned = create_company(&server, &token, "Northwind").await;
        let not_a_map = server
            .post(&format!("/questionnaire/{}", owned.id))
            .add_header(AUTHORIZATION, bearer(&token))
            .json(&json!({ "answers": ["yes", "no"] }))
            .await;
        not_a_map.assert_status(StatusCode::BAD_REQUEST);
        let error: ErrorResponse = not_a_map.json();
        assert_eq!(error.code, "VALIDATION_ERROR");
    }

    // ===================== Routing =====================

    #[tokio::test]
    async fn test_unsupported_method_returns_json_405() {
        let (server, _) = setup_test_server().await;

        for response in [
            server.get("/auth-login").await,
            server.delete("/companies").await,
            server.put("/clear-companies").await,
            server.patch("/questionnaire/1").await,
        ] {
            response.assert_status(StatusCode::METHOD_NOT_ALLOWED);
            let error: ErrorResponse = response.json();
            assert_eq!(error.code, "METHOD_NOT_ALLOWED");
            assert!(!error.success);
        }
    }

    #[tokio::test]
    async fn test_unknown_path_returns_json_404() {
        let (server, _) = setup_test_server().await;

        let response = server.get("/api/v1/accounts").await;
        response.assert_status(StatusCode::NOT_FOUND);
        let error: ErrorResponse = response.json();
        assert_eq!(error.code, "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_malformed_input_returns_json_400() {
        let (server, _) = setup_test_server().await;
        let token = login(&server, ADMIN).await;

        let bad_path = server
            .get("/questionnaire/not-a-number")
            .add_header(AUTHORIZATION, bearer(&token))
            .await;
        bad_path.assert_status(StatusCode::BAD_REQUEST);
        let error: ErrorResponse = bad_path.json();
        assert_eq!(error.code, "VALIDATION_ERROR");

        let bad_json = server
            .post("/companies")
            .add_header(AUTHORIZATION, bearer(&token))
            .bytes(axum::body::Bytes::from_static(b"{ not json"))
            .content_type("application/json")
            .await;
        bad_json.assert_status(StatusCode::BAD_REQUEST);
        let error: ErrorResponse = bad_json.json();
        assert_eq!(error.code, "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_openapi_document_is_served() {
        let (server, _) = setup_test_server().await;
        let response = server.get("/api-docs/openapi.json").await;
        response.assert_status(StatusCode::OK);
        let doc: serde_json::Value = response.json();
        assert!(doc["paths"]["/questionnaire/{company_id}"]["post"].is_object());
    }
}
