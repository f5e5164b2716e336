use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware::from_fn_with_state,
    routing::{get, put},
    Router,
};
use std::sync::Arc;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::SessionResolver;
use crate::config::{AppConfig, Environment, SecurityConfig};
use crate::database::directory::UserDirectory;
use crate::handlers;
use crate::middleware::{panic_response, session_middleware};

/// Shared per-process handles; cloned into every request
#[derive(Clone)]
pub struct AppState {
    pub directory: Arc<dyn UserDirectory>,
    pub sessions: SessionResolver,
}

impl AppState {
    pub fn new(directory: Arc<dyn UserDirectory>, sessions: SessionResolver) -> Self {
        Self { directory, sessions }
    }
}

pub fn app(state: AppState, config: &AppConfig) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/users/me", get(handlers::me_get).put(handlers::me_put))
        .route("/admin/users/:id/roles", put(handlers::update_user_roles))
        .layer(from_fn_with_state(state.clone(), session_middleware))
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(cors_layer(config.environment, &config.security))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(environment: Environment, security: &SecurityConfig) -> CorsLayer {
    if !security.enable_cors {
        return CorsLayer::new();
    }
    if environment == Environment::Development {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::PUT])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Identity;
    use crate::database::memory::MemoryUserDirectory;
    use crate::database::models::NewUser;
    use crate::types::Role;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    const SECRET: &str = "router-test-secret";

    fn router(directory: Arc<MemoryUserDirectory>) -> Router {
        let state = AppState::new(directory, SessionResolver::new(SECRET, 1));
        app(state, &AppConfig::development())
    }

    fn bearer(identity: &str) -> String {
        let token = SessionResolver::new(SECRET, 1).issue(&Identity::new(identity)).unwrap();
        format!("Bearer {token}")
    }

    async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn unauthenticated_requests_get_401_without_store_access() {
        let directory = Arc::new(MemoryUserDirectory::new());
        let requests = [
            Request::get("/users/me").body(Body::empty()).unwrap(),
            Request::put("/users/me").body(Body::from(r#"{"bio":"x"}"#)).unwrap(),
            Request::put("/admin/users/abc/roles")
                .body(Body::from(r#"{"roles":["admin"]}"#))
                .unwrap(),
            Request::get("/users/me")
                .header("authorization", "Bearer not-a-token")
                .body(Body::empty())
                .unwrap(),
        ];

        for request in requests {
            let (status, body) = send(router(directory.clone()), request).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(body["error"], "Unauthorized");
        }
        assert_eq!((directory.reads(), directory.writes()), (0, 0));
    }

    #[tokio::test]
    async fn me_round_trip_over_http() {
        let directory = Arc::new(MemoryUserDirectory::new());

        let put = Request::put("/users/me")
            .header("authorization", bearer("42"))
            .header("content-type", "application/json")
            .body(Body::from(r#"{"bio":"x","roles":["founder"]}"#))
            .unwrap();
        let (status, body) = send(router(directory.clone()), put).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"message": "Profile updated successfully"}));

        let get = Request::get("/users/me")
            .header("authorization", bearer("42"))
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(router(directory.clone()), get).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["bio"], "x");
        assert_eq!(body["roles"], json!(["user"]));
        assert!(body.get("password").is_none());
    }

    #[tokio::test]
    async fn role_update_maps_policy_outcomes_to_statuses() {
        let directory = Arc::new(MemoryUserDirectory::new());
        let mut admin = NewUser::new("admin-1", chrono::Utc::now());
        admin.roles = vec![Role::Admin];
        directory.insert(admin).await.unwrap();
        let mut founder = NewUser::new("founder-1", chrono::Utc::now());
        founder.roles = vec![Role::Founder];
        let target = directory.insert(founder).await.unwrap();

        let cases = [
            (json!({"roles": "admin"}), StatusCode::BAD_REQUEST),
            (json!({"roles": ["admin", "wizard"]}), StatusCode::BAD_REQUEST),
            (json!({"roles": ["admin"]}), StatusCode::FORBIDDEN),
            (json!({"roles": ["founder", "admin"]}), StatusCode::OK),
        ];

        for (payload, expected) in cases {
            let request = Request::put(format!("/admin/users/{}/roles", target.id))
                .header("authorization", bearer("admin-1"))
                .body(Body::from(payload.to_string()))
                .unwrap();
            let (status, body) = send(router(directory.clone()), request).await;
            assert_eq!(status, expected, "payload {payload}: {body}");
        }

        let stored = directory.find_by_id(target.id).await.unwrap().unwrap();
        assert_eq!(stored.roles, vec![Role::Founder, Role::Admin]);
    }

    #[tokio::test]
    async fn unknown_target_is_404() {
        let directory = Arc::new(MemoryUserDirectory::new());
        let mut admin = NewUser::new("admin-1", chrono::Utc::now());
        admin.roles = vec![Role::Admin];
        directory.insert(admin).await.unwrap();

        let request = Request::put(format!("/admin/users/{}/roles", uuid::Uuid::new_v4()))
            .header("authorization", bearer("admin-1"))
            .body(Body::from(r#"{"roles":[]}"#))
            .unwrap();
        let (status, body) = send(router(directory), request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"error": "User not found", "code": "NOT_FOUND"}));
    }

    #[tokio::test]
    async fn oversized_bodies_get_a_json_413_after_the_session_check() {
        let directory = Arc::new(MemoryUserDirectory::new());
        let mut config = AppConfig::development();
        config.api.max_request_size_bytes = 64;
        let state = AppState::new(directory.clone(), SessionResolver::new(SECRET, 1));
        let big = format!(r#"{{"bio":"{}"}}"#, "x".repeat(256));

        let request = Request::put("/users/me")
            .header("authorization", bearer("42"))
            .body(Body::from(big.clone()))
            .unwrap();
        let (status, body) = send(app(state.clone(), &config), request).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body, json!({"error": "Request body too large", "code": "PAYLOAD_TOO_LARGE"}));

        let request = Request::put("/admin/users/abc/roles").body(Body::from(big)).unwrap();
        let (status, _) = send(app(state, &config), request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(directory.writes(), 0);
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let request = Request::get("/health").body(Body::empty()).unwrap();
        let (status, body) = send(router(Arc::new(MemoryUserDirectory::new())), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }
}
