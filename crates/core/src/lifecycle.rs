//! Service-request lifecycle.
//!
//! The usual flow is:
//!
//! ```text
//! open ──quote──▶ quoted ──accept──▶ in_progress ──pay──▶ paid ──deliver──▶ delivered ──▶ completed
//!   │               │
//!   └──needs_info   └──decline──▶ declined
//! ```
//!
//! Staff can still set any status by hand; the table here describes the
//! transitions the system performs on its own and is used to flag
//! surprising jumps in logs. It never rejects a write.

use crate::types::RequestStatus;

/// A status change triggered by a lifecycle event rather than by staff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transition {
    /// Staff sent (or replaced) the quote.
    QuoteSent,
    /// The customer accepted the quote and an order was created.
    QuoteAccepted,
    /// The customer declined the quote.
    QuoteDeclined,
    /// The service order linked to the request was paid.
    OrderPaid,
    /// Staff posted a deliverable.
    DeliverablePosted,
}

impl Transition {
    /// Status the request ends up in.
    #[must_use]
    pub const fn target(self) -> RequestStatus {
        match self {
            Self::QuoteSent => RequestStatus::Quoted,
            Self::QuoteAccepted => RequestStatus::InProgress,
            Self::QuoteDeclined => RequestStatus::Declined,
            Self::OrderPaid => RequestStatus::Paid,
            Self::DeliverablePosted => RequestStatus::Delivered,
        }
    }

    /// Short name used in log fields.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::QuoteSent => "quote_sent",
            Self::QuoteAccepted => "quote_accepted",
            Self::QuoteDeclined => "quote_declined",
            Self::OrderPaid => "order_paid",
            Self::DeliverablePosted => "deliverable_posted",
        }
    }

    /// Whether applying this transition from `from` follows the usual flow.
    #[must_use]
    pub const fn is_expected_from(self, from: RequestStatus) -> bool {
        from.can_advance_to(self.target())
    }
}

impl RequestStatus {
    /// Whether `self -> next` is part of the usual flow.
    ///
    /// Staying in the same state is always allowed, so repeated quotes or
    /// deliverables are not flagged.
    #[must_use]
    pub const fn can_advance_to(self, next: Self) -> bool {
        use RequestStatus::{Completed, Declined, Delivered, InProgress, NeedsInfo, Open, Paid, Quoted};

        if self as u8 == next as u8 {
            return true;
        }

        match (self, next) {
            (Open | NeedsInfo, NeedsInfo | Quoted | Declined)
            | (Open, InProgress)
            | (Quoted, NeedsInfo | InProgress | Paid | Declined)
            | (InProgress, Paid | Delivered | Declined)
            | (Paid, InProgress | Delivered)
            | (Delivered, Completed | InProgress) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_is_expected() {
        let mut status = RequestStatus::Open;
        for step in [
            Transition::QuoteSent,
            Transition::QuoteAccepted,
            Transition::OrderPaid,
            Transition::DeliverablePosted,
        ] {
            assert!(step.is_expected_from(status), "{} from {status}", step.as_str());
            status = step.target();
        }
        assert!(status.can_advance_to(RequestStatus::Completed));
    }

    #[test]
    fn test_requote_is_not_flagged() {
        assert!(Transition::QuoteSent.is_expected_from(RequestStatus::Quoted));
    }

    #[test]
    fn test_decline_from_quoted() {
        assert!(Transition::QuoteDeclined.is_expected_from(RequestStatus::Quoted));
        assert_eq!(Transition::QuoteDeclined.target(), RequestStatus::Declined);
    }

    #[test]
    fn test_unusual_jumps_are_flagged() {
        assert!(!RequestStatus::Open.can_advance_to(RequestStatus::Completed));
        assert!(!RequestStatus::Declined.can_advance_to(RequestStatus::Open));
        assert!(!Transition::DeliverablePosted.is_expected_from(RequestStatus::Open));
    }
}
