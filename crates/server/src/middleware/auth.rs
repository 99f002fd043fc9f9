//! Authentication extractors.
//!
//! The session cookie is verified and the user reloaded from the database
//! on every request. A token for a deleted user resolves to no user.

use axum::{extract::FromRequestParts, http::request::Parts};

use atelier_core::{Role, policy};

use crate::db::users::UserRepository;
use crate::error::{AppError, set_sentry_user};
use crate::middleware::session::session_token;
use crate::models::SessionUser;
use crate::state::AppState;

/// Resolve a session token to the current user.
///
/// Missing, malformed or expired tokens yield `None`, as does a token whose
/// user no longer exists.
///
/// # Errors
///
/// Returns `AppError::Database` if the user lookup fails.
pub async fn authenticate(
    state: &AppState,
    token: Option<&str>,
) -> Result<Option<SessionUser>, AppError> {
    let Some(claims) = token.and_then(|t| state.tokens().verify(t)) else {
        return Ok(None);
    };
    let user = UserRepository::new(state.pool())
        .get_by_id(claims.user_id)
        .await?;
    Ok(user.map(SessionUser::from))
}

/// Resolved once per request and cached in the request extensions.
#[derive(Clone)]
struct Resolved(Option<SessionUser>);

async fn resolve(parts: &mut Parts, state: &AppState) -> Result<Option<SessionUser>, AppError> {
    if let Some(Resolved(user)) = parts.extensions.get::<Resolved>() {
        return Ok(user.clone());
    }
    let token = session_token(&parts.headers);
    let user = authenticate(state, token.as_deref()).await?;
    if let Some(user) = &user {
        set_sentry_user(&user.id, Some(user.email.as_str()));
    }
    parts.extensions.insert(Resolved(user.clone()));
    Ok(user)
}

/// Extractor that requires a signed-in user.
///
/// Rejects with 401 `{"error":"Unauthorized"}` otherwise.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(CurrentUser(user): CurrentUser) -> impl IntoResponse {
///     format!("Hello, {}!", user.name)
/// }
/// ```
pub struct CurrentUser(pub SessionUser);

impl CurrentUser {
    /// Require at least `role`.
    ///
    /// # Errors
    ///
    /// Returns 403 if the user's role ranks below `role`.
    pub fn require_minimum_role(&self, role: Role) -> Result<(), AppError> {
        Ok(policy::require_minimum_role(&self.0.actor(), role)?)
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        resolve(parts, state)
            .await?
            .map(Self)
            .ok_or(AppError::Unauthorized)
    }
}

/// Extractor that optionally gets the current user.
///
/// Unlike `CurrentUser`, this does not reject anonymous requests.
pub struct MaybeUser(pub Option<SessionUser>);

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self(resolve(parts, state).await?))
    }
}
