use std::fmt::Debug;

use log::*;

use super::transitions::{apply_claim, fetch_order, precheck};
use crate::{
    db::traits::OrderStore,
    db_types::{Order, OrderId, OrderStatusType, UserId},
    engine_api::{errors::LifecycleError, order_objects::OrderQueryFilter},
    events::{DasherAssignedEvent, EventProducers},
    lifecycle::{Actor, LifecycleAction, Role},
};

/// `DasherApi` matches confirmed orders with dashers.
///
/// Dashers browse the pool of confirmed, unassigned orders and claim one with [`DasherApi::accept_order`].
/// Restaurants and dispatch can also hand an order to a dasher with [`DasherApi::assign_dasher`]. Both paths go
/// through the same atomic claim, which only succeeds while the order has no dasher, so they can never both win.
pub struct DasherApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for DasherApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DasherApi")
    }
}

impl<B> DasherApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> DasherApi<B>
where B: OrderStore
{
    /// Confirmed orders with no dasher, oldest first.
    pub async fn list_available_orders(&self, actor: &Actor) -> Result<Vec<Order>, LifecycleError> {
        if !matches!(actor.role, Role::Dasher | Role::Dispatch) {
            return Err(LifecycleError::Forbidden(format!("{actor} may not browse available orders")));
        }
        let query = OrderQueryFilter::default().with_status(OrderStatusType::Confirmed).unassigned();
        let orders = self.db.search_orders(query).await?;
        trace!("🛵️ {} orders are available for dashers", orders.len());
        Ok(orders)
    }

    /// Orders the dasher is still working on: assigned to them and not yet delivered or cancelled.
    pub async fn list_active_orders_for_dasher(
        &self,
        actor: &Actor,
        dasher_id: &UserId,
    ) -> Result<Vec<Order>, LifecycleError> {
        let allowed = actor.role == Role::Dispatch || (actor.role == Role::Dasher && &actor.id == dasher_id);
        if !allowed {
            return Err(LifecycleError::Forbidden(format!("{actor} may not list active orders for {dasher_id}")));
        }
        let query = OrderQueryFilter::default()
            .with_dasher_id(dasher_id.clone())
            .with_statuses(&OrderStatusType::ACTIVE_FOR_DASHER);
        Ok(self.db.search_orders(query).await?)
    }

    /// A dasher claims a confirmed, unassigned order for themselves.
    ///
    /// If several dashers race for the same order, exactly one succeeds. The others get
    /// [`LifecycleError::AlreadyClaimed`]. An order that is not `confirmed` yet is an
    /// [`LifecycleError::InvalidTransition`].
    pub async fn accept_order(&self, actor: &Actor, order_id: &OrderId) -> Result<Order, LifecycleError> {
        let order = fetch_order(&self.db, order_id).await?;
        precheck(LifecycleAction::Accept, actor, &order)?;
        let claimed = apply_claim(&self.db, order_id, &actor.id, LifecycleAction::Accept).await.map_err(|e| {
            if matches!(e, LifecycleError::AlreadyClaimed(_)) {
                info!("🛵️ Dasher {} lost the race for order {order_id}", actor.id);
            }
            e
        })?;
        info!("🛵️ Dasher {} accepted order {order_id}", actor.id);
        let event = DasherAssignedEvent::new(claimed.clone(), actor.id.clone(), LifecycleAction::Accept);
        self.producers.publish_dasher_assigned(event).await;
        Ok(claimed)
    }

    /// The owning restaurant or dispatch hands the order to `dasher_id`. Allowed while the order is `confirmed`,
    /// `preparing` or `ready` and has no dasher yet. The status is left alone.
    pub async fn assign_dasher(
        &self,
        actor: &Actor,
        order_id: &OrderId,
        dasher_id: &UserId,
    ) -> Result<Order, LifecycleError> {
        if dasher_id.as_str().trim().is_empty() {
            return Err(LifecycleError::InvalidRequest("A dasher id is required".into()));
        }
        let order = fetch_order(&self.db, order_id).await?;
        precheck(LifecycleAction::AssignDasher, actor, &order)?;
        let assigned = apply_claim(&self.db, order_id, dasher_id, LifecycleAction::AssignDasher).await?;
        info!("🛵️ {actor} assigned dasher {dasher_id} to order {order_id}");
        let event = DasherAssignedEvent::new(assigned.clone(), dasher_id.clone(), LifecycleAction::AssignDasher);
        self.producers.publish_dasher_assigned(event).await;
        Ok(assigned)
    }
}
