//! Products and services.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use atelier_core::{Cents, ProductId, ServiceId};

/// A product (usually digital) sold at a fixed price.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub price_cents: Cents,
    pub is_active: bool,
    pub sku: Option<String>,
    pub tags: Vec<String>,
    pub cover_image_url: Option<String>,
    pub digital_file_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A service customers can request a quote for.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: ServiceId,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub base_price_cents: Cents,
    pub is_active: bool,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
