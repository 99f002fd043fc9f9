//! Notification inbox handlers.

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;

use atelier_core::{Action, UserId};

use crate::db::notifications;
use crate::error::Result;
use crate::middleware::CurrentUser;
use crate::state::AppState;
use crate::validation::{NotificationReadInput, ValidatedJson, parse_id, query_flag};

/// How many notifications a listing returns.
const LIST_LIMIT: i64 = 30;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub mine: Option<String>,
    pub user_id: Option<String>,
}

/// The caller's notifications, or another user's for admins.
pub async fn index(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse> {
    let target = match query.user_id.as_deref() {
        Some(raw) if !query_flag(query.mine.as_deref()) => {
            let owner: UserId = parse_id(raw)?;
            user.actor()
                .authorize(Action::ListNotifications { owner })?;
            owner
        }
        _ => user.id,
    };
    let notifications = notifications::list_for(state.pool(), target, LIST_LIMIT).await?;
    Ok(Json(json!({ "notifications": notifications })))
}

pub async fn mark_read(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidatedJson(input): ValidatedJson<NotificationReadInput>,
) -> Result<impl IntoResponse> {
    let updated = notifications::mark_read(state.pool(), user.id, &input.ids).await?;
    tracing::debug!(user_id = %user.id, updated, "Marked notifications read");
    Ok(super::success())
}
