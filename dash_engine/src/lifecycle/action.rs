use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::db_types::OrderStatusType::{self, *};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleAction {
    /// Read access to a single order.
    View,
    /// The payment gateway reported a successful payment.
    ConfirmPayment,
    StartPreparing,
    MarkReady,
    /// A restaurant or dispatcher hands the order to a specific dasher.
    AssignDasher,
    /// A dasher claims an unassigned order for themselves.
    Accept,
    PickUp,
    Complete,
    Cancel,
}

impl LifecycleAction {
    /// The stored statuses from which this action may be applied.
    pub fn allowed_sources(&self) -> &'static [OrderStatusType] {
        use LifecycleAction::*;
        match self {
            View => &OrderStatusType::ALL,
            ConfirmPayment => &[Pending],
            StartPreparing => &[Confirmed],
            MarkReady => &[Preparing],
            AssignDasher => &[Confirmed, Preparing, Ready],
            Accept => &[Confirmed],
            PickUp => &[Ready],
            Complete => &[PickedUp],
            Cancel => &[Pending, Confirmed, Preparing, Ready],
        }
    }

    /// The status the order is in after the action, or `None` if the action leaves the status alone.
    pub fn target(&self) -> Option<OrderStatusType> {
        use LifecycleAction::*;
        match self {
            View | AssignDasher | Accept => None,
            ConfirmPayment => Some(Confirmed),
            StartPreparing => Some(Preparing),
            MarkReady => Some(Ready),
            PickUp => Some(PickedUp),
            Complete => Some(Delivered),
            Cancel => Some(Cancelled),
        }
    }

    /// True for the actions that set `dasher_id`. These are applied with a claim, never a plain status change.
    pub fn is_claim(&self) -> bool {
        matches!(self, LifecycleAction::AssignDasher | LifecycleAction::Accept)
    }

    /// True for the actions that only the order's assigned dasher may perform.
    pub fn requires_assigned_dasher(&self) -> bool {
        matches!(self, LifecycleAction::PickUp | LifecycleAction::Complete)
    }

    pub fn allows(&self, status: OrderStatusType) -> bool {
        self.allowed_sources().contains(&status)
    }

    /// The action a participant performs to move an order to `target`.
    ///
    /// `pending` is never a target, and `confirmed` is only reached through payment reconciliation. Both return
    /// `None`.
    pub fn for_target(target: OrderStatusType) -> Option<LifecycleAction> {
        match target {
            Preparing => Some(LifecycleAction::StartPreparing),
            Ready => Some(LifecycleAction::MarkReady),
            PickedUp => Some(LifecycleAction::PickUp),
            Delivered => Some(LifecycleAction::Complete),
            Cancelled => Some(LifecycleAction::Cancel),
            Pending | Confirmed => None,
        }
    }
}

impl Display for LifecycleAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use LifecycleAction::*;
        let s = match self {
            View => "view",
            ConfirmPayment => "confirm payment for",
            StartPreparing => "start preparing",
            MarkReady => "mark ready",
            AssignDasher => "assign a dasher to",
            Accept => "accept",
            PickUp => "pick up",
            Complete => "complete",
            Cancel => "cancel",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod test {
    use super::{LifecycleAction::*, *};

    const ACTIONS: [LifecycleAction; 9] =
        [View, ConfirmPayment, StartPreparing, MarkReady, AssignDasher, Accept, PickUp, Complete, Cancel];

    #[test]
    fn status_never_regresses() {
        let rank = |s: OrderStatusType| OrderStatusType::ALL.iter().position(|x| *x == s).unwrap();
        for action in ACTIONS {
            let Some(target) = action.target() else { continue };
            if target == Cancelled {
                continue;
            }
            for source in action.allowed_sources() {
                assert!(rank(target) > rank(*source), "{action:?} moves {source} back to {target}");
            }
        }
    }

    #[test]
    fn nothing_leaves_a_terminal_state() {
        for action in ACTIONS.into_iter().filter(|a| *a != View) {
            assert!(!action.allows(Delivered), "{action:?}");
            assert!(!action.allows(Cancelled), "{action:?}");
        }
    }

    #[test]
    fn cancellation_sources() {
        for status in OrderStatusType::ALL {
            assert_eq!(Cancel.allows(status), status.is_cancellable());
        }
        assert!(!Cancel.allows(PickedUp));
    }

    #[test]
    fn claims_leave_status_alone() {
        for action in ACTIONS {
            if action.is_claim() {
                assert!(action.target().is_none());
            }
        }
        assert!(Accept.allows(Confirmed) && !Accept.allows(Pending) && !Accept.allows(Ready));
        assert!(AssignDasher.allows(Ready) && !AssignDasher.allows(Pending) && !AssignDasher.allows(PickedUp));
    }

    #[test]
    fn target_mapping() {
        for status in OrderStatusType::ALL {
            match LifecycleAction::for_target(status) {
                Some(action) => assert_eq!(action.target(), Some(status)),
                None => assert!(matches!(status, Pending | Confirmed)),
            }
        }
    }
}
