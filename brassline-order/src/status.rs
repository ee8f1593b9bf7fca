use serde::{Deserialize, Serialize};
use std::fmt;

/// Order status in the lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    RefundRequested,
    RefundProcessing,
    RefundCompleted,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 9] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
        OrderStatus::RefundRequested,
        OrderStatus::RefundProcessing,
        OrderStatus::RefundCompleted,
    ];

    /// Statuses reachable from this one in the normal flow.
    pub fn allowed_transitions(self) -> &'static [OrderStatus] {
        use OrderStatus::*;
        match self {
            Pending => &[Confirmed, Cancelled],
            Confirmed => &[Processing, Cancelled],
            Processing => &[Shipped, Cancelled],
            Shipped => &[Delivered],
            Delivered => &[RefundRequested],
            RefundRequested => &[RefundProcessing, Cancelled],
            RefundProcessing => &[RefundCompleted],
            Cancelled | RefundCompleted => &[],
        }
    }

    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        self.allowed_transitions().contains(&next)
    }

    pub fn is_terminal(self) -> bool {
        self.allowed_transitions().is_empty()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::RefundRequested => "refund_requested",
            OrderStatus::RefundProcessing => "refund_processing",
            OrderStatus::RefundCompleted => "refund_completed",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How admin status updates are checked.
///
/// `Permissive` accepts any status from any status, which is how the shop
/// has always behaved. `Strict` enforces `allowed_transitions`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionPolicy {
    #[default]
    Permissive,
    Strict,
}

impl TransitionPolicy {
    pub fn from_strict_flag(strict: bool) -> Self {
        if strict {
            TransitionPolicy::Strict
        } else {
            TransitionPolicy::Permissive
        }
    }

    pub fn permits(self, from: OrderStatus, to: OrderStatus) -> bool {
        match self {
            TransitionPolicy::Permissive => true,
            TransitionPolicy::Strict => from.can_transition_to(to),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_is_allowed() {
        use OrderStatus::*;
        let path = [Pending, Confirmed, Processing, Shipped, Delivered];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_refund_branch() {
        use OrderStatus::*;
        assert!(Delivered.can_transition_to(RefundRequested));
        assert!(RefundRequested.can_transition_to(RefundProcessing));
        assert!(RefundProcessing.can_transition_to(RefundCompleted));
        assert!(RefundCompleted.is_terminal());
    }

    #[test]
    fn test_cancel_only_from_early_states() {
        use OrderStatus::*;
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Processing.can_transition_to(Cancelled));
        assert!(!Shipped.can_transition_to(Cancelled));
        assert!(!Delivered.can_transition_to(Cancelled));
        assert!(Cancelled.is_terminal());
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_value(OrderStatus::RefundRequested).unwrap();
        assert_eq!(json, "refund_requested");
        for status in OrderStatus::ALL {
            let value = serde_json::to_value(status).unwrap();
            assert_eq!(value, status.as_str());
        }
    }

    #[test]
    fn test_policies() {
        use OrderStatus::*;
        assert!(TransitionPolicy::Permissive.permits(Delivered, Pending));
        assert!(!TransitionPolicy::Strict.permits(Delivered, Pending));
        assert_eq!(TransitionPolicy::from_strict_flag(false), TransitionPolicy::Permissive);
    }
}
