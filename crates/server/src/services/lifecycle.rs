//! Service-request lifecycle.
//!
//! Everything that moves a request along: creation, the thread, quotes,
//! deliverables and manual status changes. Status writes performed on the
//! system's own initiative are checked against the transition table in
//! `atelier_core::lifecycle` and logged at WARN when they leave the usual
//! flow; they are never refused, because staff can already set any status
//! by hand.
//!
//! Notifications go through the [`Outbox`] after the owning write has
//! committed.

use serde_json::json;
use sqlx::PgPool;

use atelier_core::{
    Action, LineSource, OrderId, OrderType, PricedLine, QuoteId, QuoteStatus,
    RequestStatus, ServiceRequestId, Transition, UserId,
};

use crate::db::notifications::{NewNotification, NotificationKind};
use crate::db::quotes::QuoteContext;
use crate::db::users::UserRepository;
use crate::db::{catalog, orders, quotes, requests, thread};
use crate::error::{AppError, Result};
use crate::models::{
    Deliverable, Message, Quote, RequestDetail, RequestSummary, ServiceRequest, SessionUser,
};
use crate::services::outbox::Outbox;
use crate::validation::{DeliverableInput, MessageInput, Pagination, QuoteInput, RequestCreateInput};

/// Staff members told about a customer's quote decision.
const STAFF_FANOUT: i64 = 10;

const REQUEST_NOT_FOUND: &str = "Request not found";
const QUOTE_NOT_FOUND: &str = "Quote not found";

/// Log a system-initiated status change that leaves the usual flow.
pub(crate) fn note_transition(
    request_id: ServiceRequestId,
    previous: Option<RequestStatus>,
    transition: Transition,
) {
    match previous {
        Some(from) if !transition.is_expected_from(from) => {
            tracing::warn!(
                request_id = %request_id,
                from = %from,
                to = %transition.target(),
                transition = transition.as_str(),
                "Unusual request status transition"
            );
        }
        Some(from) => {
            tracing::debug!(
                request_id = %request_id,
                from = %from,
                to = %transition.target(),
                "Request status changed"
            );
        }
        None => {}
    }
}

/// Outcome of accepting a quote.
#[derive(Debug, Clone, Copy)]
pub struct AcceptedQuote {
    pub order_id: OrderId,
    pub request_id: ServiceRequestId,
}

/// Lifecycle operations on behalf of one caller.
pub struct LifecycleService<'a> {
    pool: &'a PgPool,
    outbox: &'a Outbox,
}

impl<'a> LifecycleService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, outbox: &'a Outbox) -> Self {
        Self { pool, outbox }
    }

    /// Open a request against an active service.
    ///
    /// # Errors
    ///
    /// 403 for staff callers, 404 "Service not found" for unknown or
    /// inactive services.
    pub async fn create_request(
        &self,
        user: &SessionUser,
        input: RequestCreateInput,
    ) -> Result<ServiceRequest> {
        user.actor().authorize(Action::CreateServiceRequest)?;

        let service = catalog::active_service(self.pool, input.service_id)
            .await?
            .ok_or_else(|| AppError::not_found("Service not found"))?;

        let request = requests::insert(self.pool, user.id, service.id, &input.brief).await?;
        tracing::info!(request_id = %request.id, service = %service.slug, "Service request opened");
        Ok(request)
    }

    /// A request with its service, customer, thread, quote and deliverables.
    ///
    /// # Errors
    ///
    /// 404 if the request does not exist, 403 if the caller is neither its
    /// owner nor staff.
    pub async fn detail(&self, user: &SessionUser, id: ServiceRequestId) -> Result<RequestDetail> {
        let header = requests::header(self.pool, id)
            .await?
            .ok_or_else(|| AppError::not_found(REQUEST_NOT_FOUND))?;
        user.actor()
            .authorize(Action::ViewServiceRequest { owner: header.user_id })?;

        let (messages, quote, deliverables) = tokio::try_join!(
            thread::messages(self.pool, id),
            quotes::for_request(self.pool, id),
            thread::deliverables(self.pool, id),
        )?;

        Ok(RequestDetail {
            id: header.id,
            status: header.status,
            brief: header.brief.clone(),
            created_at: header.created_at,
            updated_at: header.updated_at,
            service: header.service(),
            customer: header.customer(),
            messages,
            quote,
            deliverables,
        })
    }

    /// Requests visible to the caller, newest first.
    ///
    /// Customers only ever see their own. Staff see everyone's unless
    /// `mine` is set.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn list(
        &self,
        user: &SessionUser,
        mine: bool,
        page: Pagination,
    ) -> Result<Vec<RequestSummary>> {
        let all = !mine && user.actor().authorize(Action::ListAllRequests).is_ok();
        let owner = (!all).then_some(user.id);
        Ok(requests::list(self.pool, owner, page.limit, page.offset).await?)
    }

    /// Send the request's quote, replacing any earlier one.
    ///
    /// # Errors
    ///
    /// 403 for customers, 404 if the request does not exist.
    pub async fn send_quote(
        &self,
        user: &SessionUser,
        request_id: ServiceRequestId,
        input: QuoteInput,
    ) -> Result<Quote> {
        user.actor().authorize(Action::SendQuote)?;

        let request = requests::get(self.pool, request_id)
            .await?
            .ok_or_else(|| AppError::not_found(REQUEST_NOT_FOUND))?;

        let mut tx = self.pool.begin().await?;
        let quote = quotes::upsert(&mut *tx, request_id, input.amount, input.notes.as_deref()).await?;
        let previous = requests::set_status(&mut *tx, request_id, RequestStatus::Quoted).await?;
        tx.commit().await?;
        note_transition(request_id, previous, Transition::QuoteSent);

        self.outbox.enqueue(NewNotification::new(
            request.user_id,
            NotificationKind::Quote,
            "Quote ready",
            "A new quote is ready for your review.",
            json!({ "requestId": request_id, "quoteId": quote.id }),
        ));

        Ok(quote)
    }

    /// Lock a quote the caller is about to decide on.
    async fn lock_open_quote(
        conn: &mut sqlx::PgConnection,
        user: &SessionUser,
        quote_id: QuoteId,
        verb: &str,
    ) -> Result<QuoteContext> {
        let quote = quotes::lock_with_context(conn, quote_id)
            .await?
            .ok_or_else(|| AppError::not_found(QUOTE_NOT_FOUND))?;
        user.actor()
            .authorize(Action::RespondToQuote { owner: quote.owner_id })?;
        if !quote.status.is_open() {
            return Err(AppError::bad_request(format!(
                "Quote cannot be {verb} in current state"
            )));
        }
        Ok(quote)
    }

    /// Accept a quote: one transaction marks it accepted, opens a pending
    /// service order for the quoted amount and moves the request to
    /// `in_progress`.
    ///
    /// # Errors
    ///
    /// 404 if the quote does not exist, 403 unless the caller owns the
    /// request, 400 unless the quote is `draft` or `sent`.
    pub async fn accept_quote(&self, user: &SessionUser, quote_id: QuoteId) -> Result<AcceptedQuote> {
        let mut tx = self.pool.begin().await?;
        let quote = Self::lock_open_quote(&mut tx, user, quote_id, "accepted").await?;

        let line = PricedLine::new(
            LineSource::Service(quote.service_id),
            quote.service_title.clone(),
            quote.amount_cents,
            1,
        )
        .map_err(|e| AppError::bad_request(e.to_string()))?;

        quotes::set_status(&mut *tx, quote.id, QuoteStatus::Accepted).await?;
        let order = orders::insert_order(
            &mut *tx,
            user.id,
            OrderType::Service,
            line.subtotal,
            Some(quote.service_request_id),
        )
        .await?;
        orders::insert_item(&mut *tx, order.id, &line).await?;
        let previous =
            requests::set_status(&mut *tx, quote.service_request_id, RequestStatus::InProgress)
                .await?;
        tx.commit().await?;
        note_transition(quote.service_request_id, previous, Transition::QuoteAccepted);

        tracing::info!(
            quote_id = %quote.id,
            order_id = %order.id,
            amount_cents = quote.amount_cents.get(),
            "Quote accepted"
        );

        self.notify_staff(NewNotification::new(
            user.id,
            NotificationKind::Quote,
            "Quote accepted",
            format!("{} accepted a quote for {}.", user.name, quote.service_title),
            json!({ "requestId": quote.service_request_id, "orderId": order.id }),
        ))
        .await;

        Ok(AcceptedQuote {
            order_id: order.id,
            request_id: quote.service_request_id,
        })
    }

    /// Decline a quote; the request is declined with it.
    ///
    /// # Errors
    ///
    /// 404 if the quote does not exist, 403 unless the caller owns the
    /// request, 400 unless the quote is `draft` or `sent`.
    pub async fn decline_quote(&self, user: &SessionUser, quote_id: QuoteId) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let quote = Self::lock_open_quote(&mut tx, user, quote_id, "declined").await?;

        quotes::set_status(&mut *tx, quote.id, QuoteStatus::Declined).await?;
        let previous =
            requests::set_status(&mut *tx, quote.service_request_id, RequestStatus::Declined)
                .await?;
        tx.commit().await?;
        note_transition(quote.service_request_id, previous, Transition::QuoteDeclined);

        self.notify_staff(NewNotification::new(
            user.id,
            NotificationKind::Quote,
            "Quote declined",
            format!("{} declined the quote.", user.name),
            json!({ "requestId": quote.service_request_id }),
        ))
        .await;

        Ok(())
    }

    /// Post on the request thread and notify the other side: staff posts
    /// reach the owner, owner posts reach the longest-standing staff member.
    ///
    /// # Errors
    ///
    /// 404 if the request does not exist, 403 unless owner or staff.
    pub async fn post_message(
        &self,
        user: &SessionUser,
        request_id: ServiceRequestId,
        input: MessageInput,
    ) -> Result<Message> {
        let request = requests::get(self.pool, request_id)
            .await?
            .ok_or_else(|| AppError::not_found(REQUEST_NOT_FOUND))?;
        user.actor()
            .authorize(Action::PostMessage { owner: request.user_id })?;

        let message = thread::insert_message(
            self.pool,
            request_id,
            user.id,
            user.role,
            &input.body,
            &input.attachments,
        )
        .await?;

        let recipient = if user.id == request.user_id {
            self.first_staff().await
        } else {
            Some(request.user_id)
        };
        if let Some(recipient) = recipient {
            self.outbox.enqueue(NewNotification::new(
                recipient,
                NotificationKind::Message,
                "New message on request",
                "There is a new message on your service request thread.",
                json!({ "requestId": request_id, "messageId": message.id }),
            ));
        }

        Ok(message)
    }

    /// Attach a deliverable and move the request to `delivered`.
    ///
    /// # Errors
    ///
    /// 403 for customers, 404 if the request does not exist.
    pub async fn post_deliverable(
        &self,
        user: &SessionUser,
        request_id: ServiceRequestId,
        input: DeliverableInput,
    ) -> Result<Deliverable> {
        user.actor().authorize(Action::PostDeliverable)?;

        let request = requests::get(self.pool, request_id)
            .await?
            .ok_or_else(|| AppError::not_found(REQUEST_NOT_FOUND))?;

        let deliverable = thread::insert_deliverable(
            self.pool,
            request_id,
            &input.title,
            input.description.as_deref(),
            &input.file_url,
        )
        .await?;
        let previous =
            requests::set_status(self.pool, request_id, RequestStatus::Delivered).await?;
        note_transition(request_id, previous, Transition::DeliverablePosted);

        self.outbox.enqueue(NewNotification::new(
            request.user_id,
            NotificationKind::Deliverable,
            "New deliverable",
            "A new deliverable has been posted to your request.",
            json!({ "requestId": request_id, "deliverableId": deliverable.id }),
        ));

        Ok(deliverable)
    }

    /// Set any status by hand.
    ///
    /// # Errors
    ///
    /// 403 for customers, 404 if the request does not exist.
    pub async fn set_status(
        &self,
        user: &SessionUser,
        request_id: ServiceRequestId,
        status: RequestStatus,
    ) -> Result<()> {
        user.actor().authorize(Action::SetRequestStatus)?;

        let previous = requests::set_status(self.pool, request_id, status)
            .await?
            .ok_or_else(|| AppError::not_found(REQUEST_NOT_FOUND))?;
        tracing::info!(
            request_id = %request_id,
            from = %previous,
            to = %status,
            staff_id = %user.id,
            "Request status set manually"
        );
        Ok(())
    }

    async fn first_staff(&self) -> Option<UserId> {
        match UserRepository::new(self.pool).first_staff().await {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(error = %e, "Could not look up staff recipient");
                None
            }
        }
    }

    /// Send `template` to up to [`STAFF_FANOUT`] staff members.
    async fn notify_staff(&self, template: NewNotification) {
        match UserRepository::new(self.pool).staff_ids(STAFF_FANOUT).await {
            Ok(staff) => self.outbox.enqueue_many(staff, &template),
            Err(e) => tracing::warn!(
                kind = %template.kind,
                error = %e,
                "Could not look up staff recipients"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use atelier_core::Cents;

    use super::*;

    #[test]
    fn test_quote_line_is_single_service_unit() {
        let line = PricedLine::new(
            LineSource::Service(atelier_core::ServiceId::generate()),
            "Brand refresh",
            Cents::new(50_000),
            1,
        );
        assert!(matches!(line, Ok(ref l) if l.subtotal == Cents::new(50_000)));
    }
}
