//! Public catalog handlers. Only active entries are visible.

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderValue, header},
    response::IntoResponse,
};
use serde_json::json;

use crate::db::catalog;
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Catalog responses may be cached briefly by browsers and CDNs.
const CATALOG_CACHE: HeaderValue = HeaderValue::from_static("public, max-age=60");

fn cached(body: serde_json::Value) -> impl IntoResponse {
    ([(header::CACHE_CONTROL, CATALOG_CACHE)], Json(body))
}

pub async fn list_products(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let products = catalog::list_active_products(state.pool()).await?;
    Ok(cached(json!({ "products": products })))
}

pub async fn show_product(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse> {
    let product = catalog::active_product_by_slug(state.pool(), &slug)
        .await?
        .ok_or_else(|| AppError::not_found("Product not found"))?;
    Ok(cached(json!({ "product": product })))
}

pub async fn list_services(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let services = catalog::list_active_services(state.pool()).await?;
    Ok(cached(json!({ "services": services })))
}

pub async fn show_service(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse> {
    let service = catalog::active_service_by_slug(state.pool(), &slug)
        .await?
        .ok_or_else(|| AppError::not_found("Service not found"))?;
    Ok(cached(json!({ "service": service })))
}
