//! Catalog queries: products and services.
//!
//! Public reads only ever see active rows; the admin variants see all.

use sqlx::{PgExecutor, PgPool, Postgres, QueryBuilder};

use atelier_core::{Cents, ProductId, ServiceId};

use super::RepositoryError;
use crate::models::{Product, Service};

const PRODUCT_COLUMNS: &str = "id, slug, title, description, price_cents, is_active, sku, tags, \
     cover_image_url, digital_file_url, created_at, updated_at";

const SERVICE_COLUMNS: &str =
    "id, slug, title, description, base_price_cents, is_active, tags, created_at, updated_at";

/// A product to insert. `is_active` defaults to true, `tags` to empty.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub slug: String,
    pub title: String,
    pub description: String,
    pub price_cents: Cents,
    pub is_active: Option<bool>,
    pub sku: Option<String>,
    pub tags: Option<Vec<String>>,
    pub cover_image_url: Option<String>,
    pub digital_file_url: Option<String>,
}

/// Partial product update.
///
/// Nullable columns use `Option<Option<_>>`: `Some(None)` clears the value.
#[derive(Debug, Default, Clone)]
pub struct ProductChanges {
    pub slug: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub price_cents: Option<Cents>,
    pub is_active: Option<bool>,
    pub sku: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
    pub cover_image_url: Option<Option<String>>,
    pub digital_file_url: Option<Option<String>>,
}

impl ProductChanges {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.slug.is_none()
            && self.title.is_none()
            && self.description.is_none()
            && self.price_cents.is_none()
            && self.is_active.is_none()
            && self.sku.is_none()
            && self.tags.is_none()
            && self.cover_image_url.is_none()
            && self.digital_file_url.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct NewService {
    pub slug: String,
    pub title: String,
    pub description: String,
    pub base_price_cents: Cents,
    pub is_active: Option<bool>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Default, Clone)]
pub struct ServiceChanges {
    pub slug: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub base_price_cents: Option<Cents>,
    pub is_active: Option<bool>,
    pub tags: Option<Vec<String>>,
}

impl ServiceChanges {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.slug.is_none()
            && self.title.is_none()
            && self.description.is_none()
            && self.base_price_cents.is_none()
            && self.is_active.is_none()
            && self.tags.is_none()
    }
}

// =============================================================================
// Products
// =============================================================================

/// Active products, newest first.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn list_active_products(pool: &PgPool) -> Result<Vec<Product>, RepositoryError> {
    let rows = sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE is_active = TRUE ORDER BY created_at DESC"
    ))
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// All products, newest first.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn list_products(pool: &PgPool) -> Result<Vec<Product>, RepositoryError> {
    let rows = sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at DESC"
    ))
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// An active product by slug.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn active_product_by_slug(
    pool: &PgPool,
    slug: &str,
) -> Result<Option<Product>, RepositoryError> {
    let row = sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE slug = $1 AND is_active = TRUE"
    ))
    .bind(slug)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// An active product by id, for pricing order lines.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn active_product(
    executor: impl PgExecutor<'_>,
    id: ProductId,
) -> Result<Option<Product>, RepositoryError> {
    let row = sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 AND is_active = TRUE"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await?;
    Ok(row)
}

/// Whether a product other than `except` uses `slug`.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn product_slug_taken(
    pool: &PgPool,
    slug: &str,
    except: Option<ProductId>,
) -> Result<bool, RepositoryError> {
    let taken: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM products WHERE slug = $1 AND ($2::uuid IS NULL OR id <> $2))",
    )
    .bind(slug)
    .bind(except)
    .fetch_one(pool)
    .await?;
    Ok(taken)
}

/// Insert a product.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if the slug is taken.
pub async fn create_product(pool: &PgPool, input: NewProduct) -> Result<Product, RepositoryError> {
    sqlx::query_as::<_, Product>(&format!(
        "INSERT INTO products
             (slug, title, description, price_cents, is_active, sku, tags, cover_image_url, digital_file_url)
         VALUES ($1, $2, $3, $4, COALESCE($5, TRUE), $6, COALESCE($7, '{{}}'::text[]), $8, $9)
         RETURNING {PRODUCT_COLUMNS}"
    ))
    .bind(input.slug)
    .bind(input.title)
    .bind(input.description)
    .bind(input.price_cents)
    .bind(input.is_active)
    .bind(input.sku)
    .bind(input.tags)
    .bind(input.cover_image_url)
    .bind(input.digital_file_url)
    .fetch_one(pool)
    .await
    .map_err(|e| RepositoryError::from_unique(e, "slug"))
}

/// Apply `changes` to a product. Returns `None` if it does not exist.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if the new slug is taken.
pub async fn update_product(
    pool: &PgPool,
    id: ProductId,
    changes: ProductChanges,
) -> Result<Option<Product>, RepositoryError> {
    let mut qb = QueryBuilder::<Postgres>::new("UPDATE products SET ");
    let mut set = qb.separated(", ");
    if let Some(v) = changes.slug {
        set.push("slug = ").push_bind_unseparated(v);
    }
    if let Some(v) = changes.title {
        set.push("title = ").push_bind_unseparated(v);
    }
    if let Some(v) = changes.description {
        set.push("description = ").push_bind_unseparated(v);
    }
    if let Some(v) = changes.price_cents {
        set.push("price_cents = ").push_bind_unseparated(v);
    }
    if let Some(v) = changes.is_active {
        set.push("is_active = ").push_bind_unseparated(v);
    }
    if let Some(v) = changes.sku {
        set.push("sku = ").push_bind_unseparated(v);
    }
    if let Some(v) = changes.tags {
        set.push("tags = ").push_bind_unseparated(v);
    }
    if let Some(v) = changes.cover_image_url {
        set.push("cover_image_url = ").push_bind_unseparated(v);
    }
    if let Some(v) = changes.digital_file_url {
        set.push("digital_file_url = ").push_bind_unseparated(v);
    }
    set.push("updated_at = NOW()");
    qb.push(" WHERE id = ").push_bind(id);
    qb.push(" RETURNING ").push(PRODUCT_COLUMNS);

    qb.build_query_as::<Product>()
        .fetch_optional(pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "slug"))
}

/// Delete a product. Returns whether a row was removed.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if orders still reference it.
pub async fn delete_product(pool: &PgPool, id: ProductId) -> Result<bool, RepositoryError> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .map_err(RepositoryError::from_in_use)?;
    Ok(result.rows_affected() > 0)
}

// =============================================================================
// Services
// =============================================================================

/// Active services, newest first.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn list_active_services(pool: &PgPool) -> Result<Vec<Service>, RepositoryError> {
    let rows = sqlx::query_as::<_, Service>(&format!(
        "SELECT {SERVICE_COLUMNS} FROM services WHERE is_active = TRUE ORDER BY created_at DESC"
    ))
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// All services, newest first.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn list_services(pool: &PgPool) -> Result<Vec<Service>, RepositoryError> {
    let rows = sqlx::query_as::<_, Service>(&format!(
        "SELECT {SERVICE_COLUMNS} FROM services ORDER BY created_at DESC"
    ))
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// An active service by slug.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn active_service_by_slug(
    pool: &PgPool,
    slug: &str,
) -> Result<Option<Service>, RepositoryError> {
    let row = sqlx::query_as::<_, Service>(&format!(
        "SELECT {SERVICE_COLUMNS} FROM services WHERE slug = $1 AND is_active = TRUE"
    ))
    .bind(slug)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// An active service by id.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn active_service(
    executor: impl PgExecutor<'_>,
    id: ServiceId,
) -> Result<Option<Service>, RepositoryError> {
    let row = sqlx::query_as::<_, Service>(&format!(
        "SELECT {SERVICE_COLUMNS} FROM services WHERE id = $1 AND is_active = TRUE"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await?;
    Ok(row)
}

/// Whether a service other than `except` uses `slug`.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn service_slug_taken(
    pool: &PgPool,
    slug: &str,
    except: Option<ServiceId>,
) -> Result<bool, RepositoryError> {
    let taken: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM services WHERE slug = $1 AND ($2::uuid IS NULL OR id <> $2))",
    )
    .bind(slug)
    .bind(except)
    .fetch_one(pool)
    .await?;
    Ok(taken)
}

/// Insert a service.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if the slug is taken.
pub async fn create_service(pool: &PgPool, input: NewService) -> Result<Service, RepositoryError> {
    sqlx::query_as::<_, Service>(&format!(
        "INSERT INTO services (slug, title, description, base_price_cents, is_active, tags)
         VALUES ($1, $2, $3, $4, COALESCE($5, TRUE), COALESCE($6, '{{}}'::text[]))
         RETURNING {SERVICE_COLUMNS}"
    ))
    .bind(input.slug)
    .bind(input.title)
    .bind(input.description)
    .bind(input.base_price_cents)
    .bind(input.is_active)
    .bind(input.tags)
    .fetch_one(pool)
    .await
    .map_err(|e| RepositoryError::from_unique(e, "slug"))
}

/// Apply `changes` to a service. Returns `None` if it does not exist.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if the new slug is taken.
pub async fn update_service(
    pool: &PgPool,
    id: ServiceId,
    changes: ServiceChanges,
) -> Result<Option<Service>, RepositoryError> {
    let mut qb = QueryBuilder::<Postgres>::new("UPDATE services SET ");
    let mut set = qb.separated(", ");
    if let Some(v) = changes.slug {
        set.push("slug = ").push_bind_unseparated(v);
    }
    if let Some(v) = changes.title {
        set.push("title = ").push_bind_unseparated(v);
    }
    if let Some(v) = changes.description {
        set.push("description = ").push_bind_unseparated(v);
    }
    if let Some(v) = changes.base_price_cents {
        set.push("base_price_cents = ").push_bind_unseparated(v);
    }
    if let Some(v) = changes.is_active {
        set.push("is_active = ").push_bind_unseparated(v);
    }
    if let Some(v) = changes.tags {
        set.push("tags = ").push_bind_unseparated(v);
    }
    set.push("updated_at = NOW()");
    qb.push(" WHERE id = ").push_bind(id);
    qb.push(" RETURNING ").push(SERVICE_COLUMNS);

    qb.build_query_as::<Service>()
        .fetch_optional(pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "slug"))
}

/// Delete a service. Returns whether a row was removed.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if requests or orders still reference it.
pub async fn delete_service(pool: &PgPool, id: ServiceId) -> Result<bool, RepositoryError> {
    let result = sqlx::query("DELETE FROM services WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .map_err(RepositoryError::from_in_use)?;
    Ok(result.rows_affected() > 0)
}
