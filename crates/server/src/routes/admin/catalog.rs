//! Catalog management for editors and admins.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use tracing::instrument;

use atelier_core::{Action, ProductId, ServiceId};

use crate::db::catalog::{self, NewProduct, NewService, ProductChanges, ServiceChanges};
use crate::error::{AppError, Result};
use crate::middleware::CurrentUser;
use crate::models::SessionUser;
use crate::state::AppState;
use crate::validation::{ValidatedJson, parse_id};

const SLUG_TAKEN: &str = "Slug already exists";
const NO_UPDATES: &str = "No updates provided";

fn authorize(user: &SessionUser) -> Result<()> {
    Ok(user.actor().authorize(Action::ManageCatalog)?)
}

// =============================================================================
// Products
// =============================================================================

pub async fn list_products(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse> {
    authorize(&user)?;
    let products = catalog::list_products(state.pool()).await?;
    Ok(Json(json!({ "products": products })))
}

#[instrument(skip_all, fields(slug = %input.slug))]
pub async fn create_product(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidatedJson(input): ValidatedJson<NewProduct>,
) -> Result<impl IntoResponse> {
    authorize(&user)?;
    if catalog::product_slug_taken(state.pool(), &input.slug, None).await? {
        return Err(AppError::conflict(SLUG_TAKEN));
    }

    let product = catalog::create_product(state.pool(), input).await?;
    tracing::info!(product_id = %product.id, by = %user.id, "Product created");
    Ok((StatusCode::CREATED, Json(json!({ "product": product }))))
}

#[instrument(skip_all, fields(product_id = %id))]
pub async fn update_product(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    ValidatedJson(changes): ValidatedJson<ProductChanges>,
) -> Result<impl IntoResponse> {
    authorize(&user)?;
    let id: ProductId = parse_id(&id)?;
    if changes.is_empty() {
        return Err(AppError::bad_request(NO_UPDATES));
    }
    if let Some(slug) = changes.slug.as_deref()
        && catalog::product_slug_taken(state.pool(), slug, Some(id)).await?
    {
        return Err(AppError::conflict(SLUG_TAKEN));
    }

    let product = catalog::update_product(state.pool(), id, changes)
        .await?
        .ok_or_else(|| AppError::not_found("Product not found"))?;
    Ok(Json(json!({ "product": product })))
}

#[instrument(skip_all, fields(product_id = %id))]
pub async fn delete_product(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    authorize(&user)?;
    let id: ProductId = parse_id(&id)?;
    if catalog::delete_product(state.pool(), id).await? {
        tracing::info!(by = %user.id, "Product deleted");
    }
    Ok(super::super::success())
}

// =============================================================================
// Services
// =============================================================================

pub async fn list_services(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse> {
    authorize(&user)?;
    let services = catalog::list_services(state.pool()).await?;
    Ok(Json(json!({ "services": services })))
}

#[instrument(skip_all, fields(slug = %input.slug))]
pub async fn create_service(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidatedJson(input): ValidatedJson<NewService>,
) -> Result<impl IntoResponse> {
    authorize(&user)?;
    if catalog::service_slug_taken(state.pool(), &input.slug, None).await? {
        return Err(AppError::conflict(SLUG_TAKEN));
    }

    let service = catalog::create_service(state.pool(), input).await?;
    tracing::info!(service_id = %service.id, by = %user.id, "Service created");
    Ok((StatusCode::CREATED, Json(json!({ "service": service }))))
}

#[instrument(skip_all, fields(service_id = %id))]
pub async fn update_service(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    ValidatedJson(changes): ValidatedJson<ServiceChanges>,
) -> Result<impl IntoResponse> {
    authorize(&user)?;
    let id: ServiceId = parse_id(&id)?;
    if changes.is_empty() {
        return Err(AppError::bad_request(NO_UPDATES));
    }
    if let Some(slug) = changes.slug.as_deref()
        && catalog::service_slug_taken(state.pool(), slug, Some(id)).await?
    {
        return Err(AppError::conflict(SLUG_TAKEN));
    }

    let service = catalog::update_service(state.pool(), id, changes)
        .await?
        .ok_or_else(|| AppError::not_found("Service not found"))?;
    Ok(Json(json!({ "service": service })))
}

#[instrument(skip_all, fields(service_id = %id))]
pub async fn delete_service(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    authorize(&user)?;
    let id: ServiceId = parse_id(&id)?;
    if catalog::delete_service(state.pool(), id).await? {
        tracing::info!(by = %user.id, "Service deleted");
    }
    Ok(super::super::success())
}
