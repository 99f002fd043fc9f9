//! Notification inbox queries.

use std::fmt;

use sqlx::{PgExecutor, PgPool};

use atelier_core::{NotificationId, Role, UserId};

use super::RepositoryError;
use crate::models::Notification;

/// What a notification is about. Stored as text in `notifications.type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Quote,
    Message,
    Deliverable,
    Order,
    Broadcast,
}

impl NotificationKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Quote => "quote",
            Self::Message => "message",
            Self::Deliverable => "deliverable",
            Self::Order => "order",
            Self::Broadcast => "broadcast",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A notification waiting to be written.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: UserId,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub meta: serde_json::Value,
}

impl NewNotification {
    pub fn new(
        user_id: UserId,
        kind: NotificationKind,
        title: impl Into<String>,
        body: impl Into<String>,
        meta: serde_json::Value,
    ) -> Self {
        Self {
            user_id,
            kind,
            title: title.into(),
            body: body.into(),
            meta,
        }
    }
}

/// Write one notification.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
pub async fn insert(
    executor: impl PgExecutor<'_>,
    notification: &NewNotification,
) -> Result<(), RepositoryError> {
    sqlx::query(
        "INSERT INTO notifications (user_id, type, title, body, meta)
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(notification.user_id)
    .bind(notification.kind.as_str())
    .bind(&notification.title)
    .bind(&notification.body)
    .bind(&notification.meta)
    .execute(executor)
    .await?;
    Ok(())
}

/// A user's most recent notifications, newest first.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn list_for(
    pool: &PgPool,
    user_id: UserId,
    limit: i64,
) -> Result<Vec<Notification>, RepositoryError> {
    let rows = sqlx::query_as::<_, Notification>(
        "SELECT id, type, title, body, meta, read_at, created_at
         FROM notifications
         WHERE user_id = $1
         ORDER BY created_at DESC
         LIMIT $2",
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Mark the given notifications read. Ids owned by other users and ids
/// already read are ignored. Returns the number of rows changed.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the update fails.
pub async fn mark_read(
    pool: &PgPool,
    user_id: UserId,
    ids: &[NotificationId],
) -> Result<u64, RepositoryError> {
    let result = sqlx::query(
        "UPDATE notifications SET read_at = NOW()
         WHERE user_id = $1 AND id = ANY($2) AND read_at IS NULL",
    )
    .bind(user_id)
    .bind(ids)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// Send one notification to every user, or every user with `role`.
/// Returns the number of notifications written.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
pub async fn broadcast(
    pool: &PgPool,
    role: Option<Role>,
    title: &str,
    body: &str,
    meta: &serde_json::Value,
) -> Result<u64, RepositoryError> {
    let result = sqlx::query(
        "INSERT INTO notifications (user_id, type, title, body, meta)
         SELECT id, $2, $3, $4, $5 FROM users
         WHERE ($1::user_role IS NULL OR role = $1)",
    )
    .bind(role)
    .bind(NotificationKind::Broadcast.as_str())
    .bind(title)
    .bind(body)
    .bind(meta)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}
