//! Orders and their line items.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use atelier_core::{Cents, OrderId, OrderStatus, OrderType, ServiceRequestId, UserId};

/// An order row, used where ownership and type drive behaviour.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub total_cents: Cents,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: OrderType,
    pub service_request_id: Option<ServiceRequestId>,
    pub created_at: DateTime<Utc>,
}

/// An order with its line items embedded, for listings.
///
/// `items` is aggregated in SQL as a JSON array of
/// `{id, title, unitPriceCents, quantity, subtotalCents, productId, serviceId}`.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub id: OrderId,
    pub total_cents: Cents,
    pub status: OrderStatus,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: OrderType,
    pub created_at: DateTime<Utc>,
    pub service_request_id: Option<ServiceRequestId>,
    pub items: serde_json::Value,
}
