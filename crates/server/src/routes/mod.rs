//! HTTP route handlers for the JSON API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                               - Liveness
//! GET  /health/ready                         - Database reachability
//!
//! # Session
//! POST /api/auth/register                    - Create customer account (rate limited)
//! POST /api/auth/login                       - Sign in (rate limited)
//! POST /api/auth/logout                      - Clear session cookie
//! GET  /api/auth/me                          - Current user or null
//!
//! # Catalog (public, active only)
//! GET  /api/products                         - Product list
//! GET  /api/products/{slug}                  - Product detail
//! GET  /api/services                         - Service list
//! GET  /api/services/{slug}                  - Service detail
//!
//! # Service requests
//! GET  /api/requests                         - List (?mine=1&limit&offset)
//! POST /api/requests                         - Open a request (customers)
//! GET  /api/requests/{id}                    - Request with thread, quote, deliverables
//! POST /api/requests/{id}/quote              - Send or replace quote (staff)
//! POST /api/requests/{id}/messages           - Post on thread
//! POST /api/requests/{id}/deliverables       - Post deliverable (staff)
//! POST /api/requests/{id}/status             - Set status by hand (staff)
//! POST /api/quotes/{id}/accept               - Accept quote (owner)
//! POST /api/quotes/{id}/decline              - Decline quote (owner)
//! POST /api/quotes/{id}/respond              - Accept or decline by action
//!
//! # Orders
//! GET  /api/orders                           - List (?mine=1)
//! POST /api/orders                           - Create order
//! POST /api/payments/mock                    - Mark order paid
//!
//! # Notifications
//! GET  /api/notifications                    - List (?userId= for admins)
//! POST /api/notifications/mark-read          - Mark own notifications read
//!
//! # Admin
//! GET  /api/admin/stats                      - Dashboard counters (staff)
//! GET|POST         /api/admin/products       - Manage products (staff)
//! PATCH|DELETE     /api/admin/products/{id}
//! GET|POST         /api/admin/services       - Manage services (staff)
//! PATCH|DELETE     /api/admin/services/{id}
//! GET|POST         /api/admin/users          - Manage users (admin)
//! PATCH|DELETE     /api/admin/users/{id}
//! POST /api/admin/notifications/broadcast    - Notify many users (admin)
//! ```
//!
//! A known path hit with the wrong method answers 405
//! `{"error":"Method Not Allowed"}`; unknown paths answer 404.

pub mod admin;
pub mod auth;
pub mod catalog;
pub mod notifications;
pub mod orders;
pub mod quotes;
pub mod requests;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::json;

use crate::config::ApiQuota;
use crate::middleware::api_rate_limiter;
use crate::state::AppState;

/// `{"success": true}`, the body of operations with nothing else to return.
pub(crate) fn success() -> Json<serde_json::Value> {
    Json(json!({ "success": true }))
}

/// Create the session routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
}

/// Create the public catalog routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(catalog::list_products))
        .route("/products/{slug}", get(catalog::show_product))
        .route("/services", get(catalog::list_services))
        .route("/services/{slug}", get(catalog::show_service))
}

/// Create the service request routes router.
pub fn request_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(requests::index).post(requests::create))
        .route("/{id}", get(requests::show))
        .route("/{id}/quote", post(requests::send_quote))
        .route("/{id}/messages", post(requests::post_message))
        .route("/{id}/deliverables", post(requests::post_deliverable))
        .route("/{id}/status", post(requests::set_status))
}

/// Create the quote decision routes router.
pub fn quote_routes() -> Router<AppState> {
    Router::new()
        .route("/{id}/accept", post(quotes::accept))
        .route("/{id}/decline", post(quotes::decline))
        .route("/{id}/respond", post(quotes::respond))
}

/// Create all `/api` routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .merge(catalog_routes())
        .nest("/requests", request_routes())
        .nest("/quotes", quote_routes())
        .route("/orders", get(orders::index).post(orders::create))
        .route("/payments/mock", post(orders::mock_pay))
        .route("/notifications", get(notifications::index))
        .route("/notifications/mark-read", post(notifications::mark_read))
        .nest("/admin", admin::routes())
        .method_not_allowed_fallback(method_not_allowed)
}

/// Create all routes. `/api` is throttled per client IP by `api_quota`.
pub fn routes(api_quota: ApiQuota) -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/api", api_routes().layer(api_rate_limiter(api_quota)))
        .method_not_allowed_fallback(method_not_allowed)
}

/// Liveness probe.
async fn health() -> &'static str {
    "ok"
}

/// Readiness probe: the database answers.
async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    match sqlx::query("SELECT 1").execute(state.pool()).await {
        Ok(_) => (StatusCode::OK, "ok"),
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "database unavailable")
        }
    }
}

async fn method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({ "error": "Method Not Allowed" })),
    )
}
