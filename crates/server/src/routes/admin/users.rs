//! Account management (admin only).

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use tracing::instrument;

use atelier_core::{Action, UserId};

use crate::db::RepositoryError;
use crate::db::users::{UserChanges, UserRepository};
use crate::error::{AppError, Result};
use crate::middleware::CurrentUser;
use crate::models::SessionUser;
use crate::services::auth::hash_password;
use crate::state::AppState;
use crate::validation::{AdminUserCreateInput, AdminUserUpdateInput, ValidatedJson, parse_id};

fn authorize(user: &SessionUser) -> Result<()> {
    Ok(user.actor().authorize(Action::ManageUsers)?)
}

/// Map a unique-email race on write to `message`.
fn email_conflict(err: RepositoryError, message: &str) -> AppError {
    match err {
        RepositoryError::Conflict(_) => AppError::conflict(message),
        other => other.into(),
    }
}

pub async fn index(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse> {
    authorize(&user)?;
    let users = UserRepository::new(state.pool()).list().await?;
    Ok(Json(json!({ "users": users })))
}

#[instrument(skip_all, fields(role = %input.role))]
pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidatedJson(input): ValidatedJson<AdminUserCreateInput>,
) -> Result<impl IntoResponse> {
    const TAKEN: &str = "Email already exists";

    authorize(&user)?;
    let repo = UserRepository::new(state.pool());
    if repo.email_taken(&input.email, None).await? {
        return Err(AppError::conflict(TAKEN));
    }

    let hash = hash_password(&input.password)?;
    let created = repo
        .create(&input.email, &input.name, input.role, &hash)
        .await
        .map_err(|e| email_conflict(e, TAKEN))?;

    tracing::info!(user_id = %created.id, by = %user.id, "User created");
    Ok((StatusCode::CREATED, Json(json!({ "user": created }))))
}

#[instrument(skip_all, fields(user_id = %id))]
pub async fn update(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    ValidatedJson(input): ValidatedJson<AdminUserUpdateInput>,
) -> Result<impl IntoResponse> {
    const TAKEN: &str = "Email already in use";

    authorize(&user)?;
    let id: UserId = parse_id(&id)?;
    if input.is_empty() {
        return Err(AppError::bad_request("No updates provided"));
    }

    let repo = UserRepository::new(state.pool());
    if let Some(email) = &input.email
        && repo.email_taken(email, Some(id)).await?
    {
        return Err(AppError::conflict(TAKEN));
    }

    let password_hash = input.password.as_deref().map(hash_password).transpose()?;
    let changes = UserChanges {
        email: input.email,
        name: input.name,
        role: input.role,
        password_hash,
    };
    let updated = repo
        .update(id, changes)
        .await
        .map_err(|e| email_conflict(e, TAKEN))?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    Ok(Json(json!({ "user": updated })))
}

#[instrument(skip_all, fields(user_id = %id))]
pub async fn delete(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    authorize(&user)?;
    let id: UserId = parse_id(&id)?;
    if id == user.id {
        return Err(AppError::bad_request("You cannot delete your own account"));
    }

    if UserRepository::new(state.pool()).delete(id).await? {
        tracing::info!(by = %user.id, "User deleted");
    }
    Ok(super::super::success())
}
