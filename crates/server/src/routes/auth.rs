//! Session route handlers: register, login, logout, whoami.

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde_json::json;

use crate::db::audit;
use crate::error::{AppError, Result, clear_sentry_user};
use crate::middleware::{ClientKey, MaybeUser, clear_session_cookie, session_cookie};
use crate::models::{SessionUser, User};
use crate::services::auth::AuthService;
use crate::state::AppState;
use crate::validation::{LoginInput, RegisterInput, parse_body};

/// Append an audit row, logging instead of failing.
async fn audit_auth_event(state: &AppState, user: &User, action: &str) {
    let meta = json!({ "email": user.email });
    if let Err(e) = audit::record(
        state.pool(),
        Some(user.id),
        action,
        "user",
        Some(user.id.as_uuid()),
        &meta,
    )
    .await
    {
        tracing::warn!(action, user_id = %user.id, error = %e, "Failed to write audit entry");
    }
}

/// Sign the user in: issue a token and build the cookie.
fn start_session(state: &AppState, user: &User) -> Result<String> {
    let token = state.tokens().issue(user.id, user.role)?;
    Ok(session_cookie(&token, state.config().secure_cookies()))
}

/// Create a customer account and sign it in.
///
/// Every attempt spends budget, including ones with an invalid body.
pub async fn register(
    State(state): State<AppState>,
    ClientKey(client): ClientKey,
    body: Bytes,
) -> Result<impl IntoResponse> {
    if !state.register_attempts().try_acquire(&client) {
        tracing::warn!(client = %client, "Registration rate limit hit");
        return Err(AppError::RateLimited);
    }
    let input: RegisterInput = parse_body(&body)?;

    let user = AuthService::new(state.pool())
        .register(&input.email, &input.name, &input.password)
        .await?;
    let cookie = start_session(&state, &user)?;

    tracing::info!(user_id = %user.id, "User registered");
    audit_auth_event(&state, &user, "user.register").await;

    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, cookie)],
        Json(SessionUser::from(user)),
    ))
}

/// Sign in with email and password.
///
/// Every attempt spends budget, including ones with an invalid body.
pub async fn login(
    State(state): State<AppState>,
    ClientKey(client): ClientKey,
    body: Bytes,
) -> Result<impl IntoResponse> {
    if !state.login_attempts().try_acquire(&client) {
        tracing::warn!(client = %client, "Login rate limit hit");
        return Err(AppError::RateLimited);
    }
    let input: LoginInput = parse_body(&body)?;

    let user = AuthService::new(state.pool())
        .login(&input.email, &input.password)
        .await?;
    let cookie = start_session(&state, &user)?;

    tracing::info!(user_id = %user.id, "User logged in");
    audit_auth_event(&state, &user, "user.login").await;

    Ok(([(header::SET_COOKIE, cookie)], Json(SessionUser::from(user))))
}

/// Clear the session cookie. Always succeeds.
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    clear_sentry_user();
    (
        [(
            header::SET_COOKIE,
            clear_session_cookie(state.config().secure_cookies()),
        )],
        super::success(),
    )
}

/// The current user, or `{"user": null}` when anonymous.
pub async fn me(MaybeUser(user): MaybeUser) -> Json<serde_json::Value> {
    Json(json!({ "user": user }))
}
