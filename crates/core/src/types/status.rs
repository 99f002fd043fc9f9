//! Status enums for service requests, quotes and orders.
//!
//! Each enum maps to a `PostgreSQL` enum type of the same name (see the
//! server migrations) and serializes as `snake_case` on the wire.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when a status string is not one of the known values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind}: {value}")]
pub struct StatusParseError {
    /// Which status family was being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

macro_rules! string_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            /// Every value, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The wire/storage name.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = StatusParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(StatusParseError { kind: $kind, value: s.to_owned() }),
                }
            }
        }
    };
}

/// Lifecycle state of a service request.
///
/// See [`crate::lifecycle`] for the transitions the system performs on its
/// own. Staff may also set any of these values directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "request_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Open,
    NeedsInfo,
    Quoted,
    Paid,
    InProgress,
    Delivered,
    Completed,
    Declined,
}

string_enum!(RequestStatus, "request status", {
    Open => "open",
    NeedsInfo => "needs_info",
    Quoted => "quoted",
    Paid => "paid",
    InProgress => "in_progress",
    Delivered => "delivered",
    Completed => "completed",
    Declined => "declined",
});

impl RequestStatus {
    /// States counted as "open work" on the admin dashboard.
    pub const ACTIVE: [Self; 4] = [Self::Open, Self::NeedsInfo, Self::Quoted, Self::InProgress];
}

/// Status of the single quote attached to a service request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "quote_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum QuoteStatus {
    Draft,
    Sent,
    Accepted,
    Declined,
}

string_enum!(QuoteStatus, "quote status", {
    Draft => "draft",
    Sent => "sent",
    Accepted => "accepted",
    Declined => "declined",
});

impl QuoteStatus {
    /// Whether the customer may still accept or decline this quote.
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Draft | Self::Sent)
    }
}

/// Payment status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "order_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Paid,
}

string_enum!(OrderStatus, "order status", {
    Pending => "pending",
    Paid => "paid",
});

/// What an order is for; decides the side effect of paying it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "order_type", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    Digital,
    Service,
    Coaching,
}

string_enum!(OrderType, "order type", {
    Digital => "digital",
    Service => "service",
    Coaching => "coaching",
});
