//! Quote queries. A request has at most one quote (unique on
//! `service_request_id`); sending again overwrites it in place.

use sqlx::{FromRow, PgConnection, PgExecutor};

use atelier_core::{Cents, QuoteId, QuoteStatus, ServiceId, ServiceRequestId, UserId};

use super::RepositoryError;
use crate::models::Quote;

const QUOTE_COLUMNS: &str = "id, amount_cents, notes, status, created_at";

/// A quote together with the request facts needed to act on it.
#[derive(Debug, Clone, FromRow)]
pub struct QuoteContext {
    pub id: QuoteId,
    pub status: QuoteStatus,
    pub amount_cents: Cents,
    pub service_request_id: ServiceRequestId,
    pub owner_id: UserId,
    pub service_id: ServiceId,
    pub service_title: String,
}

/// Create the request's quote, or replace amount and notes of the existing
/// one. Either way the quote ends up `sent`.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the statement fails.
pub async fn upsert(
    executor: impl PgExecutor<'_>,
    request_id: ServiceRequestId,
    amount: Cents,
    notes: Option<&str>,
) -> Result<Quote, RepositoryError> {
    let quote = sqlx::query_as::<_, Quote>(&format!(
        "INSERT INTO quotes (service_request_id, amount_cents, notes, status)
         VALUES ($1, $2, $3, 'sent')
         ON CONFLICT (service_request_id)
         DO UPDATE SET amount_cents = EXCLUDED.amount_cents,
                       notes = EXCLUDED.notes,
                       status = 'sent'
         RETURNING {QUOTE_COLUMNS}"
    ))
    .bind(request_id)
    .bind(amount)
    .bind(notes)
    .fetch_one(executor)
    .await?;
    Ok(quote)
}

/// The quote attached to a request, if any.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn for_request(
    executor: impl PgExecutor<'_>,
    request_id: ServiceRequestId,
) -> Result<Option<Quote>, RepositoryError> {
    let quote = sqlx::query_as::<_, Quote>(&format!(
        "SELECT {QUOTE_COLUMNS} FROM quotes WHERE service_request_id = $1"
    ))
    .bind(request_id)
    .fetch_optional(executor)
    .await?;
    Ok(quote)
}

/// Load a quote with its request and lock the quote row until the
/// surrounding transaction ends.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lock_with_context(
    conn: &mut PgConnection,
    id: QuoteId,
) -> Result<Option<QuoteContext>, RepositoryError> {
    let row = sqlx::query_as::<_, QuoteContext>(
        "SELECT q.id, q.status, q.amount_cents, q.service_request_id,
                sr.user_id AS owner_id, sr.service_id, s.title AS service_title
         FROM quotes q
         JOIN service_requests sr ON q.service_request_id = sr.id
         JOIN services s ON sr.service_id = s.id
         WHERE q.id = $1
         FOR UPDATE OF q",
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(row)
}

/// Set a quote's status.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the update fails.
pub async fn set_status(
    executor: impl PgExecutor<'_>,
    id: QuoteId,
    status: QuoteStatus,
) -> Result<(), RepositoryError> {
    sqlx::query("UPDATE quotes SET status = $2 WHERE id = $1")
        .bind(id)
        .bind(status)
        .execute(executor)
        .await?;
    Ok(())
}
