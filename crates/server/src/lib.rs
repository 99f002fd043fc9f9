//! Atelier marketplace API library.
//!
//! The binary in `main.rs` is a thin shell around [`app`]; keeping the
//! router here lets tests drive it without a socket.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod validation;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the full application with its middleware stack.
pub fn app(state: AppState) -> Router {
    routes::routes(state.config().api_quota)
        .layer(axum::middleware::from_fn(
            middleware::security_headers_middleware,
        ))
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::net::SocketAddr;
    use std::num::NonZeroU32;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::body::{Body, to_bytes};
    use axum::extract::ConnectInfo;
    use axum::http::{Method, Request, StatusCode, header};
    use serde_json::{Value, json};
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use super::*;
    use crate::config::tests::test_config;
    use crate::config::{ApiQuota, ServerConfig};
    use crate::middleware::AttemptLimiter;
    use crate::services::Outbox;

    /// Refuses every attempt.
    struct Exhausted;

    impl AttemptLimiter for Exhausted {
        fn try_acquire(&self, _key: &str) -> bool {
            false
        }
    }

    /// Allows every attempt and counts them.
    #[derive(Default)]
    struct Counting(AtomicUsize);

    impl AttemptLimiter for Counting {
        fn try_acquire(&self, _key: &str) -> bool {
            self.0.fetch_add(1, Ordering::SeqCst);
            true
        }
    }

    fn state_with(limiter: Option<Arc<dyn AttemptLimiter>>) -> AppState {
        state_from(test_config(), limiter)
    }

    fn state_from(config: ServerConfig, limiter: Option<Arc<dyn AttemptLimiter>>) -> AppState {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/atelier_test")
            .unwrap();
        let (outbox, _rx) = Outbox::detached(8);
        match limiter {
            Some(limiter) => {
                AppState::with_limiters(config, pool, outbox, limiter.clone(), limiter)
            }
            None => AppState::new(config, pool, outbox),
        }
    }

    fn request(method: Method, uri: &str, body: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if body.is_some() {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
        }
        let mut request = builder
            .body(body.map_or_else(Body::empty, |b| Body::from(b.to_owned())))
            .unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 4000))));
        request
    }

    async fn send(state: AppState, request: Request<Body>) -> (StatusCode, Value) {
        let response = app(state).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn issue_paths(body: &Value) -> Vec<&str> {
        body["details"]
            .as_array()
            .unwrap()
            .iter()
            .map(|issue| issue["path"].as_str().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_protected_routes_need_a_session() {
        for (method, uri) in [
            (Method::GET, "/api/requests"),
            (Method::GET, "/api/orders"),
            (Method::GET, "/api/notifications"),
            (Method::GET, "/api/admin/stats"),
        ] {
            let (status, body) = send(state_with(None), request(method, uri, None)).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
            assert_eq!(body, json!({ "error": "Unauthorized" }));
        }
    }

    #[tokio::test]
    async fn test_me_is_null_without_session() {
        let (status, body) =
            send(state_with(None), request(Method::GET, "/api/auth/me", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "user": null }));
    }

    #[tokio::test]
    async fn test_wrong_method_is_json_405() {
        let (status, body) =
            send(state_with(None), request(Method::GET, "/api/auth/login", None)).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body, json!({ "error": "Method Not Allowed" }));
    }

    #[tokio::test]
    async fn test_register_reports_every_invalid_field() {
        let payload = json!({ "email": "not-an-email", "password": "short" }).to_string();
        let (status, body) = send(
            state_with(None),
            request(Method::POST, "/api/auth/register", Some(&payload)),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid payload");
        let mut paths = issue_paths(&body);
        paths.sort_unstable();
        assert_eq!(paths, ["email", "name", "password"]);
    }

    #[tokio::test]
    async fn test_malformed_json_is_a_single_body_issue() {
        let (status, body) = send(
            state_with(None),
            request(Method::POST, "/api/auth/login", Some("{not json")),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(issue_paths(&body), ["body"]);
        assert_eq!(body["details"][0]["code"], "invalid_json");
    }

    #[tokio::test]
    async fn test_exhausted_limiter_rejects_login_and_register() {
        let login = json!({ "email": "a@example.com", "password": "password123" }).to_string();
        let register = json!({
            "email": "a@example.com",
            "password": "password123",
            "name": "Ada",
        })
        .to_string();

        for (uri, payload) in [("/api/auth/login", login), ("/api/auth/register", register)] {
            let (status, body) = send(
                state_with(Some(Arc::new(Exhausted))),
                request(Method::POST, uri, Some(&payload)),
            )
            .await;
            assert_eq!(status, StatusCode::TOO_MANY_REQUESTS, "{uri}");
            assert_eq!(
                body,
                json!({ "error": "Too many attempts. Please try again shortly." })
            );
        }
    }

    #[tokio::test]
    async fn test_invalid_bodies_still_spend_attempts() {
        let counting = Arc::new(Counting::default());
        let limiter: Arc<dyn AttemptLimiter> = counting.clone();
        let state = state_with(Some(limiter));

        for uri in ["/api/auth/login", "/api/auth/register"] {
            let (status, body) =
                send(state.clone(), request(Method::POST, uri, Some("{not json"))).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(issue_paths(&body), ["body"]);
        }
        assert_eq!(counting.0.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_exhausted_limiter_wins_over_malformed_body() {
        let (status, _) = send(
            state_with(Some(Arc::new(Exhausted))),
            request(Method::POST, "/api/auth/login", Some("{not json")),
        )
        .await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn test_api_quota_comes_from_config() {
        let mut config = test_config();
        config.api_quota = ApiQuota {
            per_second: NonZeroU32::MIN,
            burst: NonZeroU32::MIN.saturating_add(1),
        };
        let router = app(state_from(config, None));

        let mut statuses = Vec::new();
        for _ in 0..3 {
            let response = router
                .clone()
                .oneshot(request(Method::GET, "/api/auth/me", None))
                .await
                .unwrap();
            statuses.push(response.status());
        }
        assert_eq!(
            statuses,
            [StatusCode::OK, StatusCode::OK, StatusCode::TOO_MANY_REQUESTS]
        );

        // Outside /api nothing is throttled.
        let response = router
            .oneshot(request(Method::GET, "/health", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_forged_cookie_is_treated_as_anonymous() {
        // A forged cookie fails verification, so the request is anonymous.
        let mut req = request(Method::GET, "/api/requests/not-a-uuid", None);
        req.headers_mut()
            .insert(header::COOKIE, "session=forged".parse().unwrap());
        let (status, _) = send(state_with(None), req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_responses_carry_request_id_and_security_headers() {
        let response = app(state_with(None))
            .oneshot(request(Method::GET, "/health", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        assert_eq!(response.headers()[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    }
}
