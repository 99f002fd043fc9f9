//! Service request handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;

use atelier_core::ServiceRequestId;

use crate::error::Result;
use crate::middleware::CurrentUser;
use crate::services::LifecycleService;
use crate::state::AppState;
use crate::validation::{
    DeliverableInput, MessageInput, Pagination, QuoteInput, RequestCreateInput,
    RequestStatusInput, ValidatedJson, parse_id, query_flag,
};

/// Page size when `limit` is not given.
const DEFAULT_LIMIT: i64 = 50;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub mine: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

fn service(state: &AppState) -> LifecycleService<'_> {
    LifecycleService::new(state.pool(), state.outbox())
}

pub async fn index(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse> {
    let page = Pagination::from_query(
        query.limit.as_deref(),
        query.offset.as_deref(),
        DEFAULT_LIMIT,
    )?;
    let requests = service(&state)
        .list(&user, query_flag(query.mine.as_deref()), page)
        .await?;
    Ok(Json(json!({ "requests": requests })))
}

pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidatedJson(input): ValidatedJson<RequestCreateInput>,
) -> Result<impl IntoResponse> {
    let request = service(&state).create_request(&user, input).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "request": {
                "id": request.id,
                "status": request.status,
                "createdAt": request.created_at,
                "serviceId": request.service_id,
            }
        })),
    ))
}

pub async fn show(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let id: ServiceRequestId = parse_id(&id)?;
    let request = service(&state).detail(&user, id).await?;
    Ok(Json(json!({ "request": request })))
}

pub async fn send_quote(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    ValidatedJson(input): ValidatedJson<QuoteInput>,
) -> Result<impl IntoResponse> {
    let id: ServiceRequestId = parse_id(&id)?;
    let quote = service(&state).send_quote(&user, id, input).await?;
    Ok(Json(json!({ "quote": quote })))
}

pub async fn post_message(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    ValidatedJson(input): ValidatedJson<MessageInput>,
) -> Result<impl IntoResponse> {
    let id: ServiceRequestId = parse_id(&id)?;
    let message = service(&state).post_message(&user, id, input).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": {
                "id": message.id,
                "createdAt": message.created_at,
                "body": message.body,
                "attachments": message.attachments,
                "sender": {
                    "id": message.sender_id,
                    "name": message.sender_name,
                    "role": message.sender_role,
                },
            }
        })),
    ))
}

pub async fn post_deliverable(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    ValidatedJson(input): ValidatedJson<DeliverableInput>,
) -> Result<impl IntoResponse> {
    let id: ServiceRequestId = parse_id(&id)?;
    let deliverable = service(&state).post_deliverable(&user, id, input).await?;
    Ok((StatusCode::CREATED, Json(json!({ "deliverable": deliverable }))))
}

pub async fn set_status(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    ValidatedJson(input): ValidatedJson<RequestStatusInput>,
) -> Result<impl IntoResponse> {
    let id: ServiceRequestId = parse_id(&id)?;
    service(&state).set_status(&user, id, input.status).await?;
    Ok(super::success())
}
