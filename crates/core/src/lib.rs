//! Atelier Core - Shared domain library.
//!
//! This crate provides the domain vocabulary used across all Atelier components:
//! - `server` - The JSON API (catalog, service requests, orders, notifications)
//! - `cli` - Command-line tools for migrations, user bootstrap and seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure rules - no I/O, no database
//! access, no HTTP. Everything here can be unit tested without a runtime.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, emails, money, roles and statuses
//! - [`lifecycle`] - The service-request transition table
//! - [`policy`] - Capability checks over an actor and an action
//! - [`pricing`] - Order line snapshots and totals

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod lifecycle;
pub mod policy;
pub mod pricing;
pub mod types;

pub use lifecycle::Transition;
pub use policy::{Action, Actor, Denied};
pub use pricing::{LineSource, PricedLine, PricingError, order_total};
pub use types::*;
