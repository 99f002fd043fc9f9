//! Order line snapshots and totals.
//!
//! An order copies the title and current price of each referenced product
//! or service at creation time. Later catalog edits never change an
//! existing order.

use serde::Serialize;

use crate::types::{Cents, ProductId, ServiceId};

/// What an order line refers to. Exactly one of product or service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineSource {
    Product(ProductId),
    Service(ServiceId),
}

impl LineSource {
    #[must_use]
    pub const fn product_id(self) -> Option<ProductId> {
        match self {
            Self::Product(id) => Some(id),
            Self::Service(_) => None,
        }
    }

    #[must_use]
    pub const fn service_id(self) -> Option<ServiceId> {
        match self {
            Self::Service(id) => Some(id),
            Self::Product(_) => None,
        }
    }
}

/// Errors building order lines or totals.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PricingError {
    #[error("order must contain at least one item")]
    Empty,
    #[error("quantity must be positive, got {0}")]
    NonPositiveQuantity(i64),
    #[error("price cannot be negative")]
    NegativePrice,
    #[error("order amount overflows")]
    Overflow,
}

/// A priced order line: the snapshot written to `order_items`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricedLine {
    #[serde(skip)]
    pub source: LineSource,
    pub title: String,
    #[serde(rename = "unitPriceCents")]
    pub unit_price: Cents,
    pub quantity: i64,
    #[serde(rename = "subtotalCents")]
    pub subtotal: Cents,
}

impl PricedLine {
    /// Snapshot a line at `unit_price × quantity`.
    ///
    /// # Errors
    ///
    /// Fails on a non-positive quantity, a negative price, or overflow.
    pub fn new(
        source: LineSource,
        title: impl Into<String>,
        unit_price: Cents,
        quantity: i64,
    ) -> Result<Self, PricingError> {
        if quantity <= 0 {
            return Err(PricingError::NonPositiveQuantity(quantity));
        }
        if unit_price.is_negative() {
            return Err(PricingError::NegativePrice);
        }
        let subtotal = unit_price
            .checked_mul(quantity)
            .ok_or(PricingError::Overflow)?;

        Ok(Self {
            source,
            title: title.into(),
            unit_price,
            quantity,
            subtotal,
        })
    }
}

/// Sum of line subtotals.
///
/// # Errors
///
/// Fails when there are no lines or the sum overflows.
pub fn order_total(lines: &[PricedLine]) -> Result<Cents, PricingError> {
    if lines.is_empty() {
        return Err(PricingError::Empty);
    }
    lines.iter().try_fold(Cents::ZERO, |acc, line| {
        acc.checked_add(line.subtotal).ok_or(PricingError::Overflow)
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product_line(price: i64, qty: i64) -> Result<PricedLine, PricingError> {
        PricedLine::new(
            LineSource::Product(ProductId::generate()),
            "Poster",
            Cents::new(price),
            qty,
        )
    }

    #[test]
    fn test_subtotal_is_price_times_quantity() {
        let line = product_line(1_250, 3).unwrap();
        assert_eq!(line.subtotal, Cents::new(3_750));
        assert!(line.source.product_id().is_some());
        assert!(line.source.service_id().is_none());
    }

    #[test]
    fn test_total_sums_lines() {
        let service = PricedLine::new(
            LineSource::Service(ServiceId::generate()),
            "Brand refresh",
            Cents::new(50_000),
            1,
        )
        .unwrap();
        let lines = vec![product_line(1_000, 2).unwrap(), service];
        assert_eq!(order_total(&lines), Ok(Cents::new(52_000)));
    }

    #[test]
    fn test_rejects_bad_lines() {
        assert_eq!(product_line(100, 0), Err(PricingError::NonPositiveQuantity(0)));
        assert_eq!(product_line(-1, 1), Err(PricingError::NegativePrice));
        assert_eq!(product_line(i64::MAX, 2), Err(PricingError::Overflow));
        assert_eq!(order_total(&[]), Err(PricingError::Empty));
    }

    #[test]
    fn test_total_overflow() {
        let big = product_line(i64::MAX, 1).unwrap();
        assert_eq!(order_total(&[big.clone(), big]), Err(PricingError::Overflow));
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(product_line(500, 2).unwrap()).unwrap();
        assert_eq!(json["unitPriceCents"], 500);
        assert_eq!(json["subtotalCents"], 1_000);
        assert_eq!(json["quantity"], 2);
        assert!(json.get("source").is_none());
    }
}
