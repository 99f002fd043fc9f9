//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Password registration/login and session tokens
//! - `lifecycle` - Service requests, quotes, thread and deliverables
//! - `orders` - Order creation and mock payment
//! - `outbox` - Best-effort notification delivery
//!
//! Services borrow the pool (and the outbox where they notify) for the
//! duration of one request; handlers construct them on the spot.

pub mod auth;
pub mod lifecycle;
pub mod orders;
pub mod outbox;

pub use lifecycle::LifecycleService;
pub use orders::OrderService;
pub use outbox::Outbox;
