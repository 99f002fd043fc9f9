//! Service requests and everything hanging off them.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use atelier_core::{
    Cents, DeliverableId, Email, MessageId, QuoteId, QuoteStatus, RequestStatus, Role, ServiceId,
    ServiceRequestId, UserId,
};

/// A bare service request row.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequest {
    pub id: ServiceRequestId,
    pub user_id: UserId,
    pub service_id: ServiceId,
    pub status: RequestStatus,
    pub brief: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Listing projection joined with service and customer.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RequestSummary {
    pub id: ServiceRequestId,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub brief: serde_json::Value,
    pub service_title: String,
    pub service_slug: String,
    pub customer_name: String,
    pub customer_email: Email,
}

/// The one quote attached to a request.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub id: QuoteId,
    pub amount_cents: Cents,
    pub notes: Option<String>,
    pub status: QuoteStatus,
    pub created_at: DateTime<Utc>,
}

/// A thread message with its sender.
///
/// `sender_role` is the role the sender had when posting.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub body: String,
    pub attachments: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub sender_id: UserId,
    pub sender_name: String,
    pub sender_role: Role,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Deliverable {
    pub id: DeliverableId,
    pub title: String,
    pub description: Option<String>,
    pub file_url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceRef {
    pub id: ServiceId,
    pub title: String,
    pub slug: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CustomerRef {
    pub id: UserId,
    pub name: String,
    pub email: Email,
}

/// Full request view: the request with its service, customer, thread
/// (oldest first), quote and deliverables (newest first).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestDetail {
    pub id: ServiceRequestId,
    pub status: RequestStatus,
    pub brief: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub service: ServiceRef,
    pub customer: CustomerRef,
    pub messages: Vec<Message>,
    pub quote: Option<Quote>,
    pub deliverables: Vec<Deliverable>,
}
