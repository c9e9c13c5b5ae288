use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderName, Method, Request},
    middleware,
    routing::get,
    Router,
};
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use super::health;
use super::middleware::{logging_middleware, metrics_middleware, security_headers_middleware};
use super::state::AppState;
use super::v1;
use crate::infrastructure::observability::{create_metrics_router, PrometheusMetrics};

const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

/// HTTP surface options that do not belong in [`AppState`]
#[derive(Clone)]
pub struct RouterOptions {
    pub body_limit_bytes: usize,
    /// Scrape endpoint, mounted when present
    pub metrics: Option<(PrometheusMetrics, String)>,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            body_limit_bytes: DEFAULT_BODY_LIMIT,
            metrics: None,
        }
    }
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::PUT,
            Method::PATCH,
            Method::POST,
            Method::DELETE,
        ])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

/// Create the full router with application state
pub fn create_router_with_state(state: AppState) -> Router {
    create_router_with_options(state, RouterOptions::default())
}

pub fn create_router_with_options(state: AppState, options: RouterOptions) -> Router {
    let x_request_id = HeaderName::from_static("x-request-id");

    let mut router = Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .route("/live", get(health::live_check))
        .nest("/api/v1", v1::create_v1_router())
        .with_state(state);

    if let Some((metrics, path)) = options.metrics {
        router = router.merge(create_metrics_router(metrics, &path));
    }

    // Layers run bottom-up: request id first, then tracing, then the rest
    router
        .layer(DefaultBodyLimit::max(options.body_limit_bytes))
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(logging_middleware))
        .layer(cors_layer())
        .layer(
            TraceLayer::new_for_http().make_span_with(|req: &Request<_>| {
                let request_id = req
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("-");
                tracing::info_span!(
                    "http_request",
                    method = %req.method(),
                    uri = %req.uri(),
                    request_id = %request_id
                )
            }),
        )
        .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
        .layer(SetRequestIdLayer::new(x_request_id, MakeRequestUuid))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::domain::user::{NewUser, User, UserRepository};
    use crate::infrastructure::auth::{JwtConfig, JwtGenerator, JwtService};
    use crate::infrastructure::storage::InMemoryStorage;
    use crate::infrastructure::user::{
        Argon2Hasher, PasswordHasher, StorageUserRepository, UserService,
    };

    struct TestApp {
        router: Router,
        token: String,
        jwt: Arc<JwtService>,
    }

    async fn test_app() -> TestApp {
        let repository = Arc::new(StorageUserRepository::new(Arc::new(
            InMemoryStorage::<User>::new(),
        )));
        let hasher = Arc::new(Argon2Hasher::with_params(1024, 1, 1).unwrap());

        let admin = User::new(
            NewUser {
                name: "Admin".to_string(),
                email: "admin@example.com".to_string(),
                phone: "0912345678".to_string(),
                age: 30,
                gender: "other".to_string(),
                address: "N/A".to_string(),
                role: "ADMIN".to_string(),
            },
            hasher.hash("admin-password").unwrap(),
            None,
        );
        let admin = repository.create(admin).await.unwrap();

        let jwt = Arc::new(JwtService::new(JwtConfig::new("router-test-secret", 1)));
        let token = jwt.generate(&admin).unwrap();

        let state = AppState::new(Arc::new(UserService::new(repository, hasher)), jwt.clone());

        TestApp {
            router: create_router_with_state(state),
            token,
            jwt,
        }
    }

    async fn send(
        app: &TestApp,
        method: &str,
        uri: &str,
        body: Option<Value>,
        authenticated: bool,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if authenticated {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", app.token));
        }
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        let response = app
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        (status, json)
    }

    fn new_user_body(email: &str) -> Value {
        json!({
            "name": "Tran Thi B",
            "email": email,
            "password": "secret123",
            "phone": "0987654321",
            "age": 25,
            "gender": "female",
            "address": "45 Le Loi",
            "role": "USER"
        })
    }

    #[tokio::test]
    async fn test_health_endpoints() {
        let app = test_app().await;

        let (status, body) = send(&app, "GET", "/health", None, false).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");

        let (status, body) = send(&app, "GET", "/ready", None, false).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["checks"][0]["name"], "user_storage");

        let (status, _) = send(&app, "GET", "/live", None, false).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_request_id_is_propagated() {
        let app = test_app().await;

        let response = app
            .router
            .clone()
            .oneshot(Request::builder().uri("/live").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_user_routes_require_auth() {
        let app = test_app().await;

        let (status, body) = send(&app, "GET", "/api/v1/user", None, false).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["statusCode"], 401);
        assert_eq!(body["error"], "Unauthorized");
    }

    #[tokio::test]
    async fn test_create_user_envelope() {
        let app = test_app().await;

        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/user",
            Some(new_user_body("b@example.com")),
            true,
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["statusCode"], 201);
        assert_eq!(body["message"], "User created successfully");
        assert!(body["data"]["_id"].is_string());
        let created_at = body["data"]["createdAt"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(created_at).is_ok());
        assert!(body["data"].get("password").is_none());
    }

    #[tokio::test]
    async fn test_create_duplicate_email_conflicts() {
        let app = test_app().await;

        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/user",
            Some(new_user_body("admin@example.com")),
            true,
        )
        .await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["message"], "Email admin@example.com is already exist");
    }

    #[tokio::test]
    async fn test_create_validation_error() {
        let app = test_app().await;

        let mut payload = new_user_body("c@example.com");
        payload["phone"] = json!("123");

        let (status, body) = send(&app, "POST", "/api/v1/user", Some(payload), true).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().contains("Phone"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let app = test_app().await;

        let response = app
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/user")
                    .header(header::AUTHORIZATION, format!("Bearer {}", app.token))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{oops"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_list_users_paginates() {
        let app = test_app().await;
        for i in 0..3 {
            send(
                &app,
                "POST",
                "/api/v1/user",
                Some(new_user_body(&format!("u{}@example.com", i))),
                true,
            )
            .await;
        }

        let (status, body) = send(
            &app,
            "GET",
            "/api/v1/user?current=1&pageSize=2&sort=email",
            None,
            true,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Fetch user with paginate");
        assert_eq!(body["data"]["meta"]["total"], 4);
        assert_eq!(body["data"]["meta"]["pages"], 2);
        assert_eq!(body["data"]["meta"]["pageSize"], 2);
        assert_eq!(body["data"]["result"].as_array().unwrap().len(), 2);
        assert!(body["data"]["result"][0].get("password").is_none());
    }

    #[tokio::test]
    async fn test_list_users_filter_and_errors() {
        let app = test_app().await;

        let (status, body) = send(&app, "GET", "/api/v1/user?role=ADMIN", None, true).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["meta"]["total"], 1);

        let (status, _) = send(&app, "GET", "/api/v1/user?password=x", None, true).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, "GET", "/api/v1/user?current=abc", None, true).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, "GET", "/api/v1/user?current=0", None, true).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_get_update_delete_flow() {
        let app = test_app().await;

        let (_, created) = send(
            &app,
            "POST",
            "/api/v1/user",
            Some(new_user_body("flow@example.com")),
            true,
        )
        .await;
        let id = created["data"]["_id"].as_str().unwrap().to_string();
        let uri = format!("/api/v1/user/{}", id);

        let (status, body) = send(&app, "GET", &uri, None, true).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Fetch user by id");
        assert_eq!(body["data"]["email"], "flow@example.com");
        assert_eq!(body["data"]["createdBy"]["email"], "admin@example.com");

        let (status, body) = send(&app, "PATCH", &uri, Some(json!({"age": 26})), true).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Update user by id");
        assert_eq!(body["data"]["matchedCount"], 1);
        assert_eq!(body["data"]["modifiedCount"], 1);

        let (status, body) = send(
            &app,
            "PATCH",
            &uri,
            Some(json!({"email": "other@example.com"})),
            true,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Email cannot be updated");

        let (status, body) = send(&app, "DELETE", &uri, None, true).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Delete user by id");
        assert_eq!(body["data"]["deleted"], 1);

        let (_, body) = send(&app, "DELETE", &uri, None, true).await;
        assert_eq!(body["data"]["deleted"], 0);

        let (status, _) = send(&app, "GET", &uri, None, true).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_get_user_invalid_id() {
        let app = test_app().await;

        let (status, body) = send(&app, "GET", "/api/v1/user/abc", None, true).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid id");
    }

    #[tokio::test]
    async fn test_login_and_me() {
        let app = test_app().await;

        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/auth/login",
            Some(json!({"username": "admin@example.com", "password": "admin-password"})),
            false,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["data"]["user"].get("password").is_none());

        let claims = app
            .jwt
            .validate(body["data"]["access_token"].as_str().unwrap())
            .unwrap();
        let expires_at =
            chrono::DateTime::parse_from_rfc3339(body["data"]["expires_at"].as_str().unwrap())
                .unwrap();
        assert_eq!(expires_at.timestamp(), claims.exp);
        assert_eq!(claims.exp - claims.iat, 3600);

        let (status, _) = send(
            &app,
            "POST",
            "/api/v1/auth/login",
            Some(json!({"username": "admin@example.com", "password": "wrong"})),
            false,
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = send(&app, "GET", "/api/v1/auth/me", None, true).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["email"], "admin@example.com");
    }

    #[tokio::test]
    async fn test_security_headers_present() {
        let app = test_app().await;

        let response = app
            .router
            .clone()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.headers()[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    }
}
