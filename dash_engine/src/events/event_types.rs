use serde::{Deserialize, Serialize};

use crate::{
    db_types::{Order, OrderStatusType, UserId},
    lifecycle::{Actor, LifecycleAction},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCreatedEvent {
    pub order: Order,
}

impl OrderCreatedEvent {
    pub fn new(order: Order) -> Self {
        Self { order }
    }
}

/// Payment for the order has been confirmed by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderConfirmedEvent {
    pub order: Order,
    pub intent_id: String,
}

impl OrderConfirmedEvent {
    pub fn new(order: Order, intent_id: String) -> Self {
        Self { order, intent_id }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DasherAssignedEvent {
    pub order: Order,
    pub dasher_id: UserId,
    /// Either [`LifecycleAction::Accept`] or [`LifecycleAction::AssignDasher`].
    pub via: LifecycleAction,
}

impl DasherAssignedEvent {
    pub fn new(order: Order, dasher_id: UserId, via: LifecycleAction) -> Self {
        Self { order, dasher_id, via }
    }
}

/// A forward status change made by a restaurant or dasher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChangedEvent {
    pub order: Order,
    pub old_status: OrderStatusType,
    pub new_status: OrderStatusType,
    pub actor: Actor,
}

impl StatusChangedEvent {
    pub fn new(order: Order, old_status: OrderStatusType, actor: Actor) -> Self {
        let new_status = order.status;
        Self { order, old_status, new_status, actor }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCancelledEvent {
    pub order: Order,
    pub previous_status: OrderStatusType,
    pub cancelled_by: Actor,
}

impl OrderCancelledEvent {
    pub fn new(order: Order, previous_status: OrderStatusType, cancelled_by: Actor) -> Self {
        Self { order, previous_status, cancelled_by }
    }
}
