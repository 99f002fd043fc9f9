//! Append-only audit log.

use sqlx::PgExecutor;
use uuid::Uuid;

use atelier_core::UserId;

use super::RepositoryError;

/// Record that `actor` did `action` to `entity`.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
pub async fn record(
    executor: impl PgExecutor<'_>,
    actor: Option<UserId>,
    action: &str,
    entity: &str,
    entity_id: Option<Uuid>,
    meta: &serde_json::Value,
) -> Result<(), RepositoryError> {
    sqlx::query(
        "INSERT INTO audit_log (actor_user_id, action, entity, entity_id, meta)
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(actor)
    .bind(action)
    .bind(entity)
    .bind(entity_id)
    .bind(meta)
    .execute(executor)
    .await?;
    Ok(())
}
