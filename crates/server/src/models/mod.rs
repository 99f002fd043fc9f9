//! Domain models for the API.
//!
//! Row types double as response bodies: they derive `FromRow` for reading
//! and `Serialize` with `camelCase` field names for the JSON API.

pub mod catalog;
pub mod notification;
pub mod order;
pub mod request;
pub mod session;
pub mod user;

pub use catalog::{Product, Service};
pub use notification::Notification;
pub use order::{Order, OrderSummary};
pub use request::{Deliverable, Message, Quote, RequestDetail, RequestSummary, ServiceRequest};
pub use session::SessionUser;
pub use user::User;
