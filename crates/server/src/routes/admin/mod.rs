//! Staff back-office API.
//!
//! ```text
//! GET    /stats                    - Dashboard counters (editor+)
//! GET    /products                 - All products, inactive included (editor+)
//! POST   /products                 - Create product
//! PATCH  /products/{id}            - Update product
//! DELETE /products/{id}            - Delete product
//! GET    /services                 - All services (editor+)
//! POST   /services                 - Create service
//! PATCH  /services/{id}            - Update service
//! DELETE /services/{id}            - Delete service
//! GET    /users                    - All users (admin)
//! POST   /users                    - Create user with any role
//! PATCH  /users/{id}               - Update user
//! DELETE /users/{id}               - Delete user
//! POST   /notifications/broadcast  - Notify every user, or one role (admin)
//! ```

mod catalog;
mod users;

use axum::{
    Json, Router,
    extract::State,
    response::IntoResponse,
    routing::{get, patch, post},
};
use serde_json::json;
use tracing::instrument;

use atelier_core::{Action, Role};

use crate::db::{notifications, stats};
use crate::error::Result;
use crate::middleware::CurrentUser;
use crate::state::AppState;
use crate::validation::{BroadcastInput, ValidatedJson};

/// Orders shown beside the dashboard counters.
const RECENT_ORDERS: i64 = 5;

/// Build the admin router, nested under `/api/admin`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/stats", get(dashboard))
        .route(
            "/products",
            get(catalog::list_products).post(catalog::create_product),
        )
        .route(
            "/products/{id}",
            patch(catalog::update_product).delete(catalog::delete_product),
        )
        .route(
            "/services",
            get(catalog::list_services).post(catalog::create_service),
        )
        .route(
            "/services/{id}",
            patch(catalog::update_service).delete(catalog::delete_service),
        )
        .route("/users", get(users::index).post(users::create))
        .route("/users/{id}", patch(users::update).delete(users::delete))
        .route("/notifications/broadcast", post(broadcast))
}

#[instrument(skip_all)]
async fn dashboard(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<impl IntoResponse> {
    current.require_minimum_role(Role::Editor)?;

    let (counters, recent) = tokio::try_join!(
        stats::dashboard(state.pool()),
        stats::recent_orders(state.pool(), RECENT_ORDERS),
    )?;

    Ok(Json(json!({ "stats": counters, "recentOrders": recent })))
}

#[instrument(skip_all)]
async fn broadcast(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidatedJson(input): ValidatedJson<BroadcastInput>,
) -> Result<impl IntoResponse> {
    user.actor().authorize(Action::Broadcast)?;

    let audience = input.role.map_or("all", Role::as_str);
    let meta = json!({ "role": audience });
    let inserted =
        notifications::broadcast(state.pool(), input.role, &input.title, &input.body, &meta)
            .await?;

    tracing::info!(sender = %user.id, audience, inserted, "Broadcast sent");
    Ok(Json(json!({ "inserted": inserted })))
}
