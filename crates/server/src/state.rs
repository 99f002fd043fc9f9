//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ServerConfig;
use crate::middleware::rate_limit::{AttemptLimiter, GovernorAttemptLimiter};
use crate::services::auth::SessionTokens;
use crate::services::outbox::Outbox;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    pool: PgPool,
    outbox: Outbox,
    tokens: SessionTokens,
    login_attempts: Arc<dyn AttemptLimiter>,
    register_attempts: Arc<dyn AttemptLimiter>,
}

impl AppState {
    /// Create a new application state with governor-backed attempt limits
    /// taken from `config`.
    #[must_use]
    pub fn new(config: ServerConfig, pool: PgPool, outbox: Outbox) -> Self {
        let login = Arc::new(GovernorAttemptLimiter::per_minute(
            config.attempts.login_per_minute,
        ));
        let register = Arc::new(GovernorAttemptLimiter::per_minute(
            config.attempts.register_per_minute,
        ));
        Self::with_limiters(config, pool, outbox, login, register)
    }

    /// Create a new application state with explicit attempt limiters.
    #[must_use]
    pub fn with_limiters(
        config: ServerConfig,
        pool: PgPool,
        outbox: Outbox,
        login_attempts: Arc<dyn AttemptLimiter>,
        register_attempts: Arc<dyn AttemptLimiter>,
    ) -> Self {
        let tokens = SessionTokens::new(&config.jwt_secret);
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                outbox,
                tokens,
                login_attempts,
                register_attempts,
            }),
        }
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the notification outbox.
    #[must_use]
    pub fn outbox(&self) -> &Outbox {
        &self.inner.outbox
    }

    /// Get a reference to the session token signer.
    #[must_use]
    pub fn tokens(&self) -> &SessionTokens {
        &self.inner.tokens
    }

    #[must_use]
    pub fn login_attempts(&self) -> &dyn AttemptLimiter {
        self.inner.login_attempts.as_ref()
    }

    #[must_use]
    pub fn register_attempts(&self) -> &dyn AttemptLimiter {
        self.inner.register_attempts.as_ref()
    }
}
