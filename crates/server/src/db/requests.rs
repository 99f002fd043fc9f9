//! Service request queries.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgExecutor, PgPool};

use atelier_core::{Email, RequestStatus, ServiceId, ServiceRequestId, UserId};

use super::RepositoryError;
use crate::models::{RequestSummary, ServiceRequest};
use crate::models::request::{CustomerRef, ServiceRef};

const REQUEST_COLUMNS: &str = "id, user_id, service_id, status, brief, created_at, updated_at";

/// A request joined with its service and customer.
#[derive(Debug, FromRow)]
pub struct RequestHeader {
    pub id: ServiceRequestId,
    pub user_id: UserId,
    pub service_id: ServiceId,
    pub status: RequestStatus,
    pub brief: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub service_title: String,
    pub service_slug: String,
    pub customer_name: String,
    pub customer_email: Email,
}

impl RequestHeader {
    #[must_use]
    pub fn service(&self) -> ServiceRef {
        ServiceRef {
            id: self.service_id,
            title: self.service_title.clone(),
            slug: self.service_slug.clone(),
        }
    }

    #[must_use]
    pub fn customer(&self) -> CustomerRef {
        CustomerRef {
            id: self.user_id,
            name: self.customer_name.clone(),
            email: self.customer_email.clone(),
        }
    }
}

/// Insert a new request in `open` status.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
pub async fn insert(
    pool: &PgPool,
    user_id: UserId,
    service_id: ServiceId,
    brief: &serde_json::Value,
) -> Result<ServiceRequest, RepositoryError> {
    let row = sqlx::query_as::<_, ServiceRequest>(&format!(
        "INSERT INTO service_requests (user_id, service_id, status, brief)
         VALUES ($1, $2, 'open', $3)
         RETURNING {REQUEST_COLUMNS}"
    ))
    .bind(user_id)
    .bind(service_id)
    .bind(brief)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// A bare request row.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get(
    executor: impl PgExecutor<'_>,
    id: ServiceRequestId,
) -> Result<Option<ServiceRequest>, RepositoryError> {
    let row = sqlx::query_as::<_, ServiceRequest>(&format!(
        "SELECT {REQUEST_COLUMNS} FROM service_requests WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await?;
    Ok(row)
}

/// A request with service and customer details.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn header(
    pool: &PgPool,
    id: ServiceRequestId,
) -> Result<Option<RequestHeader>, RepositoryError> {
    let row = sqlx::query_as::<_, RequestHeader>(
        "SELECT sr.id, sr.user_id, sr.service_id, sr.status, sr.brief, sr.created_at, sr.updated_at,
                s.title AS service_title, s.slug AS service_slug,
                u.name AS customer_name, u.email AS customer_email
         FROM service_requests sr
         JOIN services s ON sr.service_id = s.id
         JOIN users u ON sr.user_id = u.id
         WHERE sr.id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Requests newest first, optionally restricted to one customer.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn list(
    pool: &PgPool,
    owner: Option<UserId>,
    limit: i64,
    offset: i64,
) -> Result<Vec<RequestSummary>, RepositoryError> {
    let rows = sqlx::query_as::<_, RequestSummary>(
        "SELECT sr.id, sr.status, sr.created_at, sr.updated_at, sr.brief,
                s.title AS service_title, s.slug AS service_slug,
                u.name AS customer_name, u.email AS customer_email
         FROM service_requests sr
         JOIN services s ON sr.service_id = s.id
         JOIN users u ON sr.user_id = u.id
         WHERE ($1::uuid IS NULL OR sr.user_id = $1)
         ORDER BY sr.created_at DESC
         LIMIT $2 OFFSET $3",
    )
    .bind(owner)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Set a request's status and return the status it had before.
///
/// Returns `None` if the request does not exist.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the update fails.
pub async fn set_status(
    executor: impl PgExecutor<'_>,
    id: ServiceRequestId,
    status: RequestStatus,
) -> Result<Option<RequestStatus>, RepositoryError> {
    let previous: Option<RequestStatus> = sqlx::query_scalar(
        "WITH prev AS (
             SELECT id, status FROM service_requests WHERE id = $1 FOR UPDATE
         )
         UPDATE service_requests sr
         SET status = $2, updated_at = NOW()
         FROM prev
         WHERE sr.id = prev.id
         RETURNING prev.status",
    )
    .bind(id)
    .bind(status)
    .fetch_optional(executor)
    .await?;
    Ok(previous)
}
