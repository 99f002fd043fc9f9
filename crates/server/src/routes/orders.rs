//! Order and mock payment handlers.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;

use crate::error::Result;
use crate::middleware::CurrentUser;
use crate::services::OrderService;
use crate::state::AppState;
use crate::validation::{MockPaymentInput, OrderCreateInput, ValidatedJson, query_flag};

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub mine: Option<String>,
}

fn service(state: &AppState) -> OrderService<'_> {
    OrderService::new(state.pool(), state.outbox())
}

pub async fn index(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse> {
    let orders = service(&state)
        .list(&user, query_flag(query.mine.as_deref()))
        .await?;
    Ok(Json(json!({ "orders": orders })))
}

pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidatedJson(input): ValidatedJson<OrderCreateInput>,
) -> Result<impl IntoResponse> {
    let order = service(&state).create(&user, input).await?;
    Ok((StatusCode::CREATED, Json(json!({ "order": order }))))
}

pub async fn mock_pay(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidatedJson(input): ValidatedJson<MockPaymentInput>,
) -> Result<impl IntoResponse> {
    let order = service(&state).mock_pay(&user, input.order_id).await?;
    Ok(Json(json!({
        "order": {
            "id": order.id,
            "status": order.status,
            "type": order.kind,
        }
    })))
}
