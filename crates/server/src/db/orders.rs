//! Order and order-item queries.

use sqlx::{PgConnection, PgExecutor, PgPool};

use atelier_core::{Cents, OrderId, OrderType, PricedLine, ServiceRequestId, UserId};

use super::RepositoryError;
use crate::models::{Order, OrderSummary};

const ORDER_COLUMNS: &str = "id, user_id, status, total_cents, type, service_request_id, created_at";

/// Insert a `pending` order.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
pub async fn insert_order(
    executor: impl PgExecutor<'_>,
    user_id: UserId,
    kind: OrderType,
    total: Cents,
    service_request_id: Option<ServiceRequestId>,
) -> Result<Order, RepositoryError> {
    let order = sqlx::query_as::<_, Order>(&format!(
        "INSERT INTO orders (user_id, status, total_cents, type, service_request_id)
         VALUES ($1, 'pending', $2, $3, $4)
         RETURNING {ORDER_COLUMNS}"
    ))
    .bind(user_id)
    .bind(total)
    .bind(kind)
    .bind(service_request_id)
    .fetch_one(executor)
    .await?;
    Ok(order)
}

/// Write one priced line under an order.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
pub async fn insert_item(
    executor: impl PgExecutor<'_>,
    order_id: OrderId,
    line: &PricedLine,
) -> Result<(), RepositoryError> {
    sqlx::query(
        "INSERT INTO order_items
             (order_id, product_id, service_id, title, unit_price_cents, quantity, subtotal_cents)
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(order_id)
    .bind(line.source.product_id())
    .bind(line.source.service_id())
    .bind(&line.title)
    .bind(line.unit_price)
    .bind(line.quantity)
    .bind(line.subtotal)
    .execute(executor)
    .await?;
    Ok(())
}

/// Load an order and lock it until the surrounding transaction ends.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lock(conn: &mut PgConnection, id: OrderId) -> Result<Option<Order>, RepositoryError> {
    let order = sqlx::query_as::<_, Order>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(order)
}

/// Mark an order paid.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the update fails.
pub async fn mark_paid(executor: impl PgExecutor<'_>, id: OrderId) -> Result<(), RepositoryError> {
    sqlx::query("UPDATE orders SET status = 'paid', updated_at = NOW() WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}

/// Orders newest first with their items, optionally restricted to one
/// customer.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn list(
    pool: &PgPool,
    owner: Option<UserId>,
    limit: i64,
) -> Result<Vec<OrderSummary>, RepositoryError> {
    let rows = sqlx::query_as::<_, OrderSummary>(
        "SELECT o.id, o.total_cents, o.status, o.type, o.created_at, o.service_request_id,
                COALESCE(
                    json_agg(
                        json_build_object(
                            'id', oi.id,
                            'title', oi.title,
                            'unitPriceCents', oi.unit_price_cents,
                            'quantity', oi.quantity,
                            'subtotalCents', oi.subtotal_cents,
                            'productId', oi.product_id,
                            'serviceId', oi.service_id
                        ) ORDER BY oi.created_at
                    ) FILTER (WHERE oi.id IS NOT NULL),
                    '[]'::json
                ) AS items
         FROM orders o
         LEFT JOIN order_items oi ON oi.order_id = o.id
         WHERE ($1::uuid IS NULL OR o.user_id = $1)
         GROUP BY o.id
         ORDER BY o.created_at DESC
         LIMIT $2",
    )
    .bind(owner)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
