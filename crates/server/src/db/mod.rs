//! Database operations for the Atelier `PostgreSQL` database.
//!
//! ## Tables
//!
//! - `users` - Accounts with role and Argon2 password hash
//! - `products`, `services` - Catalog
//! - `service_requests` - Customer briefs moving through the lifecycle
//! - `quotes` - At most one per service request
//! - `messages`, `deliverables` - Request thread and posted files
//! - `orders`, `order_items` - Orders with snapshotted line prices
//! - `notifications` - Per-user inbox
//! - `audit_log` - Append-only record of sign-ins and registrations
//!
//! # Conventions
//!
//! Users go through [`users::UserRepository`]. Everything else is a free
//! function taking an executor so callers can run it on the pool or inside
//! a transaction they own.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p atelier-cli -- migrate
//! ```

pub mod audit;
pub mod catalog;
pub mod notifications;
pub mod orders;
pub mod quotes;
pub mod requests;
pub mod stats;
pub mod thread;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a unique-constraint violation to [`RepositoryError::Conflict`].
    pub(crate) fn from_unique(err: sqlx::Error, what: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.is_unique_violation()
        {
            return Self::Conflict(format!("{what} already exists"));
        }
        Self::Database(err)
    }

    /// Map a foreign-key violation on delete to [`RepositoryError::Conflict`].
    pub(crate) fn from_in_use(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.is_foreign_key_violation()
        {
            return Self::Conflict("still referenced".to_owned());
        }
        Self::Database(err)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
