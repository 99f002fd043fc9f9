//! Dashboard counters for staff.

use serde::Serialize;
use sqlx::{FromRow, PgPool};

use atelier_core::{Cents, RequestStatus};

use super::RepositoryError;
use crate::models::Order;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub users: i64,
    pub products: i64,
    pub services: i64,
    /// Requests that still need work from someone.
    pub open_requests: i64,
    /// Sum of paid order totals.
    pub mock_revenue_cents: Cents,
}

/// Compute counters in one round trip.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn dashboard(pool: &PgPool) -> Result<DashboardStats, RepositoryError> {
    let stats = sqlx::query_as::<_, DashboardStats>(
        "SELECT
             (SELECT COUNT(*) FROM users) AS users,
             (SELECT COUNT(*) FROM products) AS products,
             (SELECT COUNT(*) FROM services) AS services,
             (SELECT COUNT(*) FROM service_requests WHERE status::text = ANY($1)) AS open_requests,
             (SELECT COALESCE(SUM(total_cents), 0)::bigint FROM orders WHERE status = 'paid')
                 AS mock_revenue_cents",
    )
    .bind(
        RequestStatus::ACTIVE
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>(),
    )
    .fetch_one(pool)
    .await?;
    Ok(stats)
}

/// The newest orders across all customers.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn recent_orders(pool: &PgPool, limit: i64) -> Result<Vec<Order>, RepositoryError> {
    let rows = sqlx::query_as::<_, Order>(
        "SELECT id, user_id, status, total_cents, type, service_request_id, created_at
         FROM orders
         ORDER BY created_at DESC
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
