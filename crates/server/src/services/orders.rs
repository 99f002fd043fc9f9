//! Orders and mock payment.

use serde::Serialize;
use serde_json::json;
use sqlx::PgPool;

use atelier_core::{
    Action, Cents, LineSource, OrderId, OrderStatus, OrderType, PricedLine, RequestStatus,
    Transition, order_total,
};

use crate::db::notifications::{NewNotification, NotificationKind};
use crate::db::{catalog, orders, requests};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::models::{Order, OrderSummary, SessionUser};
use crate::services::lifecycle::note_transition;
use crate::services::outbox::Outbox;
use crate::validation::OrderCreateInput;

/// Default page size for order listings.
pub const LIST_LIMIT: i64 = 50;

/// A freshly created order with its priced lines.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedOrder {
    pub id: OrderId,
    pub total_cents: Cents,
    pub status: OrderStatus,
    #[serde(rename = "type")]
    pub kind: OrderType,
    pub items: Vec<PricedLine>,
}

pub struct OrderService<'a> {
    pool: &'a PgPool,
    outbox: &'a Outbox,
}

impl<'a> OrderService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, outbox: &'a Outbox) -> Self {
        Self { pool, outbox }
    }

    /// Price every line from the live catalog and write the order in one
    /// transaction. Titles and prices are copied, so later catalog edits
    /// leave the order untouched.
    ///
    /// # Errors
    ///
    /// 400 for a line referencing neither or both of product and service,
    /// 404 for unknown or inactive catalog entries.
    pub async fn create(&self, user: &SessionUser, input: OrderCreateInput) -> Result<CreatedOrder> {
        let sources = input
            .items
            .iter()
            .map(|item| item.source().map(|s| (s, item.quantity)))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(AppError::bad_request)?;

        let mut tx = self.pool.begin().await?;

        let mut lines = Vec::with_capacity(sources.len());
        for (source, quantity) in sources {
            let (title, unit_price) = match source {
                LineSource::Product(id) => catalog::active_product(&mut *tx, id)
                    .await?
                    .map(|p| (p.title, p.price_cents))
                    .ok_or_else(|| AppError::not_found("Product not found"))?,
                LineSource::Service(id) => catalog::active_service(&mut *tx, id)
                    .await?
                    .map(|s| (s.title, s.base_price_cents))
                    .ok_or_else(|| AppError::not_found("Service not found"))?,
            };
            let line = PricedLine::new(source, title, unit_price, quantity)
                .map_err(|e| AppError::bad_request(e.to_string()))?;
            lines.push(line);
        }
        let total = order_total(&lines).map_err(|e| AppError::bad_request(e.to_string()))?;

        let order = orders::insert_order(&mut *tx, user.id, input.kind, total, None).await?;
        for line in &lines {
            orders::insert_item(&mut *tx, order.id, line).await?;
        }
        tx.commit().await?;

        tracing::info!(
            order_id = %order.id,
            kind = %order.kind,
            total_cents = total.get(),
            lines = lines.len(),
            "Order created"
        );

        Ok(CreatedOrder {
            id: order.id,
            total_cents: order.total_cents,
            status: order.status,
            kind: order.kind,
            items: lines,
        })
    }

    /// Orders visible to the caller, newest first, items embedded.
    ///
    /// Customers only ever see their own. Staff see everyone's unless
    /// `mine` is set.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn list(&self, user: &SessionUser, mine: bool) -> Result<Vec<OrderSummary>> {
        let all = !mine && user.actor().authorize(Action::ListAllOrders).is_ok();
        let owner = (!all).then_some(user.id);
        Ok(orders::list(self.pool, owner, LIST_LIMIT).await?)
    }

    /// Mark an order paid without charging anyone.
    ///
    /// The order row is locked for the whole transaction, so concurrent
    /// calls for one order apply the side effects once. Paying an already
    /// paid order returns it unchanged.
    ///
    /// A digital order notifies its owner; a service order moves its
    /// request to `paid`.
    ///
    /// # Errors
    ///
    /// 404 if the order does not exist, 403 unless owner or staff.
    pub async fn mock_pay(&self, user: &SessionUser, order_id: OrderId) -> Result<Order> {
        let mut tx = self.pool.begin().await?;

        let mut order = orders::lock(&mut tx, order_id)
            .await?
            .ok_or_else(|| AppError::not_found("Order not found"))?;
        user.actor()
            .authorize(Action::PayOrder { owner: order.user_id })?;

        if order.status == OrderStatus::Paid {
            tx.commit().await?;
            return Ok(order);
        }

        orders::mark_paid(&mut *tx, order.id).await?;
        let moved = match (order.kind, order.service_request_id) {
            (OrderType::Service, Some(request_id)) => {
                let previous =
                    requests::set_status(&mut *tx, request_id, RequestStatus::Paid).await?;
                Some((request_id, previous))
            }
            _ => None,
        };
        tx.commit().await?;
        order.status = OrderStatus::Paid;

        if let Some((request_id, previous)) = moved {
            note_transition(request_id, previous, Transition::OrderPaid);
        }
        let order_ref = order.id.to_string();
        add_breadcrumb(
            "order",
            "Mock payment applied",
            Some(&[("order_id", order_ref.as_str())]),
        );

        if order.kind == OrderType::Digital {
            self.outbox.enqueue(NewNotification::new(
                order.user_id,
                NotificationKind::Order,
                "Digital order ready",
                "Your digital purchase is ready to download.",
                json!({ "orderId": order.id }),
            ));
        }

        Ok(order)
    }
}
