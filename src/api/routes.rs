//! Router assembly: service groups, API docs and the middleware stack.

use std::time::Duration;

use axum::{
    Router,
    http::{
        HeaderName, Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    middleware,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
};
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::doc::ApiDoc;
use crate::api::handlers;
use crate::api::middleware::{
    REQUEST_ID_HEADER, authenticate, error_response_middleware, logging_middleware,
    request_id_middleware,
};
use crate::state::AppState;

/// Builds the application router.
///
/// Only the service groups enabled in `settings.services` are mounted.
/// Swagger UI is served outside production.
///
/// # Middleware Order
/// Outermost first:
/// 1. Request ID
/// 2. Access logging
/// 3. Compression and CORS
/// 4. Error shaping (sees uncompressed bodies)
/// 5. Request timeout
/// 6. Bearer authentication
pub fn create_router(state: AppState) -> Router {
    let (router, openapi) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .nest("/api", api_routes(&state))
        .merge(handlers::health::health_routes())
        .split_for_parts();

    let router = if state.environment.exposes_api_docs() {
        router.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
    } else {
        router
    };

    let timeout = Duration::from_secs(state.settings.server.request_timeout);

    router
        .layer(middleware::from_fn_with_state(state.clone(), authenticate))
        .layer(TimeoutLayer::new(timeout))
        .layer(middleware::from_fn(error_response_middleware))
        .layer(
            CorsLayer::new()
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::PATCH,
                    Method::DELETE,
                ])
                .allow_headers([
                    AUTHORIZATION,
                    CONTENT_TYPE,
                    HeaderName::from_static(REQUEST_ID_HEADER),
                ])
                .allow_origin(Any),
        )
        .layer(CompressionLayer::new())
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}

fn api_routes(state: &AppState) -> OpenApiRouter<AppState> {
    let services = &state.settings.services;
    let mut api = OpenApiRouter::new();

    if services.users {
        api = api
            .nest("/auth", handlers::auth::auth_routes())
            .nest("/users", handlers::users::user_routes());
    }
    if services.products {
        api = api
            .nest("/products", handlers::products::product_routes())
            .nest("/categories", handlers::categories::category_routes());
    }
    if services.payments {
        api = api
            .nest("/payments", handlers::payments::payment_routes())
            .nest(
                "/payment-methods",
                handlers::payment_methods::payment_method_routes(),
            );
    }
    if services.logs {
        api = api.nest("/logs", handlers::logs::log_routes());
    }

    tracing::debug!(services = ?services.enabled(), "Service groups mounted");
    api
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::services::Registration;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    struct TestApp {
        state: AppState,
        router: Router,
    }

    impl TestApp {
        fn new() -> Self {
            Self::with_state(AppState::in_memory_for_tests())
        }

        fn with_state(state: AppState) -> Self {
            Self {
                router: create_router(state.clone()),
                state,
            }
        }

        async fn send(
            &self,
            method: Method,
            uri: &str,
            token: Option<&str>,
            body: Option<Value>,
        ) -> (StatusCode, Value) {
            let mut builder = Request::builder().method(method).uri(uri);
            if let Some(token) = token {
                builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
            }
            let request = match body {
                Some(body) => builder
                    .header(CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
                None => builder.body(Body::empty()).unwrap(),
            };
            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = response.into_body().collect().await.unwrap().to_bytes();
            let value = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap()
            };
            (status, value)
        }

        async fn register(&self, username: &str) -> String {
            let (status, body) = self
                .send(
                    Method::POST,
                    "/api/auth/register",
                    None,
                    Some(json!({
                        "username": username,
                        "email": format!("{}@example.com", username),
                        "password": "secret123"
                    })),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED, "{}", body);
            body["token"].as_str().unwrap().to_string()
        }

        async fn admin_token(&self) -> String {
            self.state
                .services
                .users
                .create_admin(Registration {
                    username: "root".to_string(),
                    email: "root@example.com".to_string(),
                    password: "rootpass".to_string(),
                    first_name: None,
                    last_name: None,
                })
                .await
                .unwrap();
            let (status, body) = self
                .send(
                    Method::POST,
                    "/api/auth/login",
                    None,
                    Some(json!({ "username": "root", "password": "rootpass" })),
                )
                .await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["role"], "Admin");
            body["token"].as_str().unwrap().to_string()
        }
    }

    #[tokio::test]
    async fn test_register_then_read_profile() {
        let app = TestApp::new();
        let token = app.register("alice").await;

        let (status, body) = app
            .send(Method::GET, "/api/users/profile", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["username"], "alice");
        assert_eq!(body["role"], "User");
        assert!(body.get("password_hash").is_none());
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized_json() {
        let app = TestApp::new();
        let request = Request::builder()
            .uri("/api/users/profile")
            .header(REQUEST_ID_HEADER, "req-42")
            .body(Body::empty())
            .unwrap();
        let response = app.router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[REQUEST_ID_HEADER], "req-42");

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], "UNAUTHORIZED");
        assert_eq!(body["request_id"], "req-42");
    }

    #[tokio::test]
    async fn test_garbage_token_is_rejected() {
        let app = TestApp::new();
        let (status, body) = app
            .send(Method::GET, "/api/payments/my-payments", Some("not.a.jwt"), None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Token is malformed");
    }

    #[tokio::test]
    async fn test_unknown_route_is_json_not_found() {
        let app = TestApp::new();
        let (status, body) = app.send(Method::GET, "/api/nothing-here", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");
        assert!(body["request_id"].is_string());
    }

    #[tokio::test]
    async fn test_validation_errors_list_fields() {
        let app = TestApp::new();
        let (status, body) = app
            .send(
                Method::POST,
                "/api/auth/register",
                None,
                Some(json!({ "username": "al", "email": "nope", "password": "secret123" })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["details"]["errors"][0]["field"], "email");
        assert_eq!(body["details"]["errors"][1]["field"], "username");
    }

    #[tokio::test]
    async fn test_product_lifecycle_and_admin_delete() {
        let app = TestApp::new();
        let user = app.register("bob").await;
        let admin = app.admin_token().await;

        let (status, product) = app
            .send(
                Method::POST,
                "/api/products",
                Some(&user),
                Some(json!({ "name": "Widget", "price": 9.99, "category_id": 1 })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", product);
        assert_eq!(product["stock"], 0);
        assert_eq!(product["price"], "9.99");
        assert_eq!(product["category_name"], "Electronics");
        assert_eq!(product["created_by"], "bob");
        let uri = format!("/api/products/{}", product["id"]);

        let (status, updated) = app
            .send(Method::PATCH, &uri, Some(&user), Some(json!({ "stock": 5 })))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["stock"], 5);
        assert_eq!(updated["name"], "Widget");
        assert_eq!(updated["updated_by"], "bob");

        let (status, _) = app.send(Method::DELETE, &uri, Some(&user), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = app.send(Method::DELETE, &uri, Some(&admin), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = app.send(Method::GET, &uri, Some(&user), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_product_detail_requires_token() {
        let app = TestApp::new();
        let user = app.register("dora").await;
        let (status, product) = app
            .send(
                Method::POST,
                "/api/products",
                Some(&user),
                Some(json!({ "name": "Lamp", "price": 19.5, "category_id": 1 })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", product);
        let uri = format!("/api/products/{}", product["id"]);

        let (status, body) = app.send(Method::GET, &uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "UNAUTHORIZED");

        let (status, body) = app.send(Method::GET, &uri, Some(&user), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Lamp");

        let (status, _) = app.send(Method::GET, "/api/products", None, None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_category_with_products_cannot_be_deleted() {
        let app = TestApp::new();
        let admin = app.admin_token().await;

        let (_, product) = app
            .send(
                Method::POST,
                "/api/products",
                Some(&admin),
                Some(json!({ "name": "Chair", "price": 45, "category_id": 2 })),
            )
            .await;

        let (status, body) = app
            .send(Method::DELETE, "/api/categories/2", Some(&admin), None)
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "CONFLICT");

        let uri = format!("/api/products/{}", product["id"]);
        app.send(Method::DELETE, &uri, Some(&admin), None).await;

        let (status, _) = app
            .send(Method::DELETE, "/api/categories/2", Some(&admin), None)
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_payment_processing_is_one_way() {
        let app = TestApp::new();
        let user = app.register("carol").await;
        let admin = app.admin_token().await;

        let (status, payment) = app
            .send(
                Method::POST,
                "/api/payments",
                Some(&user),
                Some(json!({ "order_id": 77, "amount": 12.5, "payment_method_id": 2 })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", payment);
        assert_eq!(payment["status"], "Pending");
        assert_eq!(payment["payment_method_name"], "PayPal");

        let process = format!("/api/payments/{}/process", payment["id"]);
        let (status, _) = app.send(Method::POST, &process, Some(&user), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, done) = app.send(Method::POST, &process, Some(&admin), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(done["status"], "Completed");
        let txn = done["transaction_id"].as_str().unwrap().to_string();
        assert!(txn.starts_with("TXN_"));

        let (status, body) = app.send(Method::POST, &process, Some(&admin), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "CONFLICT");

        let (_, again) = app
            .send(Method::GET, &format!("/api/payments/{}", payment["id"]), Some(&user), None)
            .await;
        assert_eq!(again["transaction_id"], txn);

        let (status, revenue) = app
            .send(Method::GET, "/api/payments/revenue/total", Some(&admin), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(revenue["total_revenue"], "12.50");
        assert_eq!(revenue["currency"], "USD");
    }

    #[tokio::test]
    async fn test_payments_are_private_to_their_owner() {
        let app = TestApp::new();
        let dave = app.register("dave").await;
        let erin = app.register("erin").await;

        let (_, payment) = app
            .send(
                Method::POST,
                "/api/payments",
                Some(&dave),
                Some(json!({ "order_id": 5, "amount": 3, "payment_method_id": 1 })),
            )
            .await;
        let uri = format!("/api/payments/{}", payment["id"]);

        let (status, _) = app.send(Method::GET, &uri, Some(&erin), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, found) = app
            .send(Method::GET, "/api/payments/search?order_id=5", Some(&erin), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(found, json!([]));
    }

    #[tokio::test]
    async fn test_log_ingestion_fills_client_metadata() {
        let app = TestApp::new();
        let token = app.register("frank").await;

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/logs")
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .header(CONTENT_TYPE, "application/json")
            .header("x-forwarded-for", "203.0.113.7")
            .header(header::USER_AGENT, "probe/1.0")
            .header(REQUEST_ID_HEADER, "req-log-1")
            .body(Body::from(
                json!({ "service": "ProductsService", "level": "warning", "message": "low stock" })
                    .to_string(),
            ))
            .unwrap();
        let response = app.router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let entry: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(entry["level"], "WARNING");
        assert_eq!(entry["username"], "frank");
        assert_eq!(entry["ip_address"], "203.0.113.7");
        assert_eq!(entry["user_agent"], "probe/1.0");
        assert_eq!(entry["request_id"], "req-log-1");

        let (status, mine) = app.send(Method::GET, "/api/logs/my-logs", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(mine.as_array().unwrap().len(), 1);

        let (status, _) = app.send(Method::GET, "/api/logs/summary", Some(&token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_log_vocabularies_are_public() {
        let app = TestApp::new();
        let (status, levels) = app.send(Method::GET, "/api/logs/levels", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            levels,
            json!(["TRACE", "DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])
        );

        let (_, services) = app.send(Method::GET, "/api/logs/services", None, None).await;
        assert_eq!(services.as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_disabled_service_group_is_not_mounted() {
        let mut settings = Settings::default();
        settings.services.logs = false;
        let app = TestApp::with_state(AppState::with_settings_for_tests(settings));

        let (status, _) = app.send(Method::GET, "/api/logs/levels", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = app.send(Method::GET, "/api/products", None, None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_openapi_document_lists_routes() {
        let app = TestApp::new();
        let (status, doc) = app.send(Method::GET, "/api-docs/openapi.json", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(doc["paths"]["/api/payments/{id}/process"].is_object());
        assert!(doc["components"]["securitySchemes"]["bearerAuth"].is_object());
    }
}
