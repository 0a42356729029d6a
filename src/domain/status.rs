use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::errors::DomainError;

/// Lifecycle status of an order.
///
/// `Pending` is assigned at creation and `Paid` by settlement. `Delivered` and
/// `Cancelled` are only reachable through an explicit status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Paid,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Pending,
        OrderStatus::Paid,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Paid => "PAID",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| DomainError::Internal(format!("Unknown order status '{s}'")))
    }
}

/// Outcome of requesting a status on an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The order already has the requested status; nothing must be written.
    Unchanged,
    /// The order moves to the contained status and must be persisted.
    Changed(OrderStatus),
}

/// Decide what happens when `requested` is applied to an order in `current`.
///
/// Re-applying the current status is a no-op so callers can safely retry.
/// Any other move is accepted: there is no transition graph.
pub fn transition(current: OrderStatus, requested: OrderStatus) -> Transition {
    if current == requested {
        Transition::Unchanged
    } else {
        Transition::Changed(requested)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_status_is_a_no_op() {
        for status in OrderStatus::ALL {
            assert_eq!(transition(status, status), Transition::Unchanged);
        }
    }

    #[test]
    fn any_other_status_is_accepted() {
        for from in OrderStatus::ALL {
            for to in OrderStatus::ALL.into_iter().filter(|s| *s != from) {
                assert_eq!(transition(from, to), Transition::Changed(to));
            }
        }
    }

    #[test]
    fn paid_can_be_moved_by_an_explicit_request() {
        assert_eq!(
            transition(OrderStatus::Paid, OrderStatus::Delivered),
            Transition::Changed(OrderStatus::Delivered)
        );
    }

    #[test]
    fn parses_storage_representation() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("paid".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn serializes_as_upper_case_name() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::Cancelled).unwrap(),
            "\"CANCELLED\""
        );
        let parsed: OrderStatus = serde_json::from_str("\"DELIVERED\"").unwrap();
        assert_eq!(parsed, OrderStatus::Delivered);
    }
}
