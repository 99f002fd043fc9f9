//! Request thread: messages and deliverables.

use sqlx::PgPool;

use atelier_core::{Role, ServiceRequestId, UserId};

use super::RepositoryError;
use crate::models::{Deliverable, Message};

const DELIVERABLE_COLUMNS: &str = "id, title, description, file_url, created_at";

/// Post a message. `sender_role` is stored as a snapshot of the sender's
/// role at posting time.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
pub async fn insert_message(
    pool: &PgPool,
    request_id: ServiceRequestId,
    sender_id: UserId,
    sender_role: Role,
    body: &str,
    attachments: &[String],
) -> Result<Message, RepositoryError> {
    let message = sqlx::query_as::<_, Message>(
        "WITH m AS (
             INSERT INTO messages (service_request_id, sender_user_id, sender_role, body, attachments)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id, body, attachments, created_at, sender_user_id, sender_role
         )
         SELECT m.id, m.body, m.attachments, m.created_at,
                m.sender_user_id AS sender_id, u.name AS sender_name, m.sender_role
         FROM m
         JOIN users u ON u.id = m.sender_user_id",
    )
    .bind(request_id)
    .bind(sender_id)
    .bind(sender_role)
    .bind(body)
    .bind(attachments)
    .fetch_one(pool)
    .await?;
    Ok(message)
}

/// A request's messages, oldest first.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn messages(
    pool: &PgPool,
    request_id: ServiceRequestId,
) -> Result<Vec<Message>, RepositoryError> {
    let rows = sqlx::query_as::<_, Message>(
        "SELECT m.id, m.body, m.attachments, m.created_at,
                m.sender_user_id AS sender_id, u.name AS sender_name, m.sender_role
         FROM messages m
         JOIN users u ON m.sender_user_id = u.id
         WHERE m.service_request_id = $1
         ORDER BY m.created_at ASC",
    )
    .bind(request_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Attach a deliverable.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
pub async fn insert_deliverable(
    pool: &PgPool,
    request_id: ServiceRequestId,
    title: &str,
    description: Option<&str>,
    file_url: &str,
) -> Result<Deliverable, RepositoryError> {
    let row = sqlx::query_as::<_, Deliverable>(&format!(
        "INSERT INTO deliverables (service_request_id, title, description, file_url)
         VALUES ($1, $2, $3, $4)
         RETURNING {DELIVERABLE_COLUMNS}"
    ))
    .bind(request_id)
    .bind(title)
    .bind(description)
    .bind(file_url)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// A request's deliverables, newest first.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn deliverables(
    pool: &PgPool,
    request_id: ServiceRequestId,
) -> Result<Vec<Deliverable>, RepositoryError> {
    let rows = sqlx::query_as::<_, Deliverable>(&format!(
        "SELECT {DELIVERABLE_COLUMNS} FROM deliverables
         WHERE service_request_id = $1
         ORDER BY created_at DESC"
    ))
    .bind(request_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
