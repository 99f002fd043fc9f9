//! Quote decision handlers. Only the customer who owns the request may
//! accept or decline.

use axum::{
    Json,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use serde_json::json;

use atelier_core::QuoteId;

use crate::error::Result;
use crate::middleware::CurrentUser;
use crate::models::SessionUser;
use crate::services::LifecycleService;
use crate::state::AppState;
use crate::validation::{QuoteAction, QuoteResponseInput, ValidatedJson, parse_id};

async fn decide(
    state: &AppState,
    user: &SessionUser,
    raw_id: &str,
    action: QuoteAction,
) -> Result<Response> {
    let id: QuoteId = parse_id(raw_id)?;
    let service = LifecycleService::new(state.pool(), state.outbox());
    match action {
        QuoteAction::Accept => {
            let accepted = service.accept_quote(user, id).await?;
            Ok(Json(json!({
                "orderId": accepted.order_id,
                "requestId": accepted.request_id,
            }))
            .into_response())
        }
        QuoteAction::Decline => {
            service.decline_quote(user, id).await?;
            Ok(super::success().into_response())
        }
    }
}

pub async fn accept(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Response> {
    decide(&state, &user, &id, QuoteAction::Accept).await
}

pub async fn decline(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Response> {
    decide(&state, &user, &id, QuoteAction::Decline).await
}

/// `{"action": "accept" | "decline"}` in one endpoint.
pub async fn respond(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    ValidatedJson(input): ValidatedJson<QuoteResponseInput>,
) -> Result<Response> {
    decide(&state, &user, &id, input.action).await
}
