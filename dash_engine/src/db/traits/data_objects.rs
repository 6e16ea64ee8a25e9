use crate::db_types::{Order, OrderStatusType, UserId};

/// The result of a guarded write.
#[derive(Debug, Clone)]
pub enum ConditionalUpdate<T = Order> {
    /// The guard held and the write went through. Carries the order as it is after the write.
    Applied(T),
    /// The guard did not hold at the time of the write. Nothing was changed.
    Rejected,
}

/// A status change that went through, along with the status it replaced.
///
/// `previous_status` is read by the same write that applied the change, so it is exact even when other writers
/// raced the caller.
#[derive(Debug, Clone)]
pub struct AppliedTransition {
    pub order: Order,
    pub previous_status: OrderStatusType,
}

/// A status change, guarded on the order's current state.
///
/// The write only happens if the order's status is one of `from` and, when `assigned_dasher` is set, the order is
/// assigned to that dasher. If the target status carries a timestamp, it is set as part of the same write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusTransition {
    pub from: Vec<OrderStatusType>,
    pub to: OrderStatusType,
    pub assigned_dasher: Option<UserId>,
    /// Clear `dasher_id` in the same write.
    pub release_dasher: bool,
}

impl StatusTransition {
    pub fn new(from: &[OrderStatusType], to: OrderStatusType) -> Self {
        Self { from: from.to_vec(), to, assigned_dasher: None, release_dasher: false }
    }

    pub fn for_dasher(mut self, dasher: &UserId) -> Self {
        self.assigned_dasher = Some(dasher.clone());
        self
    }

    pub fn releasing_dasher(mut self) -> Self {
        self.release_dasher = true;
        self
    }
}
