//! The write path shared by every API that changes an order.
//!
//! Each change is checked twice. First against a fresh read, for a precise error. Then again by the guard on the
//! store's conditional update, which is what actually decides. If the guard rejects the update, the order has
//! changed in between and is re-read to report why.
use log::*;

use crate::{
    db::traits::{AppliedTransition, ConditionalUpdate, OrderStore, StatusTransition},
    db_types::{Order, OrderId, OrderStatusType, UserId},
    engine_api::errors::LifecycleError,
    lifecycle::{authorize, Actor, LifecycleAction},
};

pub(crate) async fn fetch_order<B: OrderStore>(db: &B, order_id: &OrderId) -> Result<Order, LifecycleError> {
    db.fetch_order_by_order_id(order_id)
        .await
        .map_err(|e| {
            error!("🗃️ Could not fetch order {order_id}: {e}");
            LifecycleError::from(e)
        })?
        .ok_or_else(|| LifecycleError::order_not_found(order_id))
}

/// Checks who is asking, then whether the stored status allows the action.
pub(crate) fn precheck(action: LifecycleAction, actor: &Actor, order: &Order) -> Result<(), LifecycleError> {
    authorize(action, actor, order).map_err(|denied| {
        debug!("🔄️ {denied}");
        LifecycleError::from(denied)
    })?;
    check_source(action, order)?;
    if action.is_claim() && order.dasher_id.is_some() {
        debug!("🔄️ Cannot {action} order {}: it already has a dasher", order.order_id);
        return Err(LifecycleError::AlreadyClaimed(order.order_id.clone()));
    }
    Ok(())
}

pub(crate) fn check_source(action: LifecycleAction, order: &Order) -> Result<(), LifecycleError> {
    if action.allows(order.status) {
        Ok(())
    } else {
        debug!("🔄️ Cannot {action} order {} while it is {}", order.order_id, order.status);
        Err(invalid_transition(action, &order.order_id, order.status))
    }
}

fn invalid_transition(action: LifecycleAction, order_id: &OrderId, status: OrderStatusType) -> LifecycleError {
    LifecycleError::InvalidTransition { order_id: order_id.clone(), action, status }
}

/// Applies the status change for `action`, guarded on its allowed sources and, if given, the assigned dasher.
///
/// The returned previous status comes from the write itself, not from any earlier read.
pub(crate) async fn apply_transition<B: OrderStore>(
    db: &B,
    order_id: &OrderId,
    action: LifecycleAction,
    assigned_dasher: Option<&UserId>,
) -> Result<AppliedTransition, LifecycleError> {
    let target = action
        .target()
        .ok_or_else(|| LifecycleError::Internal(format!("'{action}' does not change the order status")))?;
    let mut transition = StatusTransition::new(action.allowed_sources(), target);
    if let Some(dasher) = assigned_dasher {
        transition = transition.for_dasher(dasher);
    }
    if target == OrderStatusType::Cancelled {
        transition = transition.releasing_dasher();
    }
    let result = db.transition_status(order_id, transition).await.map_err(|e| {
        error!("🗃️ Could not {action} order {order_id}: {e}");
        LifecycleError::from(e)
    })?;
    match result {
        ConditionalUpdate::Applied(applied) => Ok(applied),
        ConditionalUpdate::Rejected => Err(explain_rejection(db, order_id, action, assigned_dasher).await),
    }
}

/// Sets the dasher on an unassigned order. At most one of any number of concurrent claims succeeds.
pub(crate) async fn apply_claim<B: OrderStore>(
    db: &B,
    order_id: &OrderId,
    dasher: &UserId,
    action: LifecycleAction,
) -> Result<Order, LifecycleError> {
    let result = db.claim_order(order_id, dasher, action.allowed_sources()).await.map_err(|e| {
        error!("🗃️ Could not {action} order {order_id}: {e}");
        LifecycleError::from(e)
    })?;
    match result {
        ConditionalUpdate::Applied(order) => Ok(order),
        ConditionalUpdate::Rejected => Err(explain_rejection(db, order_id, action, None).await),
    }
}

async fn explain_rejection<B: OrderStore>(
    db: &B,
    order_id: &OrderId,
    action: LifecycleAction,
    assigned_dasher: Option<&UserId>,
) -> LifecycleError {
    let current = match db.fetch_order_by_order_id(order_id).await {
        Ok(Some(order)) => order,
        Ok(None) => return LifecycleError::order_not_found(order_id),
        Err(e) => {
            error!("🗃️ Could not re-read order {order_id} after a rejected update: {e}");
            return e.into();
        },
    };
    debug!("🔄️ Guarded update to {action} order {order_id} was rejected. It is now {}", current.status);
    if action.is_claim() && current.dasher_id.is_some() {
        return LifecycleError::AlreadyClaimed(order_id.clone());
    }
    if !action.allows(current.status) {
        return invalid_transition(action, order_id, current.status);
    }
    if let Some(dasher) = assigned_dasher {
        if !current.is_assigned_to(dasher) {
            return LifecycleError::Forbidden(format!("Order {order_id} is not assigned to dasher {dasher}"));
        }
    }
    error!("🔄️ Guarded update to {action} order {order_id} was rejected, but the stored order allows it");
    LifecycleError::Internal(format!("Could not {action} order {order_id}"))
}
