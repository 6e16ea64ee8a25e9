use std::{fmt::Debug, time::Duration};

use chrono::Utc;
use log::*;

use super::transitions::{apply_transition, fetch_order, precheck};
use crate::{
    config::EngineConfig,
    db::traits::OrderStore,
    db_types::{Order, OrderId, OrderStatusType, RestaurantId, UserId},
    engine_api::{
        errors::LifecycleError,
        order_objects::{CreatedOrder, NewOrderRequest, OrderQueryFilter},
    },
    events::{EventProducers, OrderCancelledEvent, OrderCreatedEvent, StatusChangedEvent},
    gateways::{bounded, CatalogGateway, PaymentGateway, PaymentMetadata},
    lifecycle::{authorize, Actor, LifecycleAction, Role},
    validation::OrderValidator,
};

/// `OrderFlowApi` is the primary API for customers and restaurants: creating orders, reading them, and moving them
/// through the kitchen.
///
/// Dasher assignment lives in [`crate::DasherApi`] and payment confirmation in [`crate::PaymentApi`].
pub struct OrderFlowApi<B, C, P> {
    db: B,
    validator: OrderValidator<C>,
    payments: P,
    gateway_timeout: Duration,
    producers: EventProducers,
}

impl<B, C, P> Debug for OrderFlowApi<B, C, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B, C, P> OrderFlowApi<B, C, P> {
    pub fn new(
        db: B,
        validator: OrderValidator<C>,
        payments: P,
        gateway_timeout: Duration,
        producers: EventProducers,
    ) -> Self {
        Self { db, validator, payments, gateway_timeout, producers }
    }

    pub fn from_config(db: B, catalog: C, payments: P, config: &EngineConfig, producers: EventProducers) -> Self {
        let validator = OrderValidator::new(catalog, config.fee_policy, config.gateway_timeout);
        Self::new(db, validator, payments, config.gateway_timeout, producers)
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B, C, P> OrderFlowApi<B, C, P>
where
    B: OrderStore,
    C: CatalogGateway,
    P: PaymentGateway,
{
    /// Creates a new order in `pending` status.
    ///
    /// The sequence is: validate and price the cart, authorize the payment, then store the order. If validation or
    /// authorization fails, nothing is stored. The returned client secret is the only copy the engine hands out.
    pub async fn create_order(&self, actor: &Actor, request: NewOrderRequest) -> Result<CreatedOrder, LifecycleError> {
        if actor.role != Role::Customer {
            debug!("🔄️ {actor} tried to create an order");
            return Err(LifecycleError::Forbidden(format!("Only customers may create orders, not {actor}")));
        }
        let draft = self.validator.validate(&actor.id, &request).await?;
        let order_id = OrderId::random();
        let metadata =
            PaymentMetadata::new(order_id.clone(), actor.id.clone(), draft.restaurant_id.clone(), &draft.price);
        let authorization =
            bounded(self.gateway_timeout, self.payments.authorize(draft.price.total, &metadata)).await.map_err(|e| {
                warn!("💳️ Payment authorization for order {order_id} failed: {e}. The order was not created.");
                LifecycleError::from(e)
            })?;
        let new_order = draft.into_new_order(order_id.clone(), Some(authorization.intent_id), Utc::now());
        let order = self.db.insert_order(new_order).await.map_err(|e| {
            error!("🗃️ Could not store order {order_id} after authorizing its payment: {e}");
            LifecycleError::from(e)
        })?;
        info!("🔄️📦️ Order {order_id} created for {} with a total of {}", order.customer_id, order.total);
        self.producers.publish_order_created(OrderCreatedEvent::new(order.clone())).await;
        Ok(CreatedOrder { order, client_secret: authorization.client_secret })
    }

    pub async fn get_order(&self, actor: &Actor, order_id: &OrderId) -> Result<Order, LifecycleError> {
        let order = fetch_order(&self.db, order_id).await?;
        authorize(LifecycleAction::View, actor, &order)?;
        Ok(order)
    }

    /// The customer's order history, newest first. Visible to the customer and to dispatch.
    pub async fn list_orders_for_customer(
        &self,
        actor: &Actor,
        customer_id: &UserId,
    ) -> Result<Vec<Order>, LifecycleError> {
        let allowed = actor.role == Role::Dispatch || (actor.role == Role::Customer && &actor.id == customer_id);
        if !allowed {
            return Err(LifecycleError::Forbidden(format!("{actor} may not list orders for customer {customer_id}")));
        }
        let query = OrderQueryFilter::default().with_customer_id(customer_id.clone()).newest_first();
        Ok(self.db.search_orders(query).await?)
    }

    /// The restaurant's orders, newest first. Visible to the restaurant and to dispatch.
    pub async fn list_orders_for_restaurant(
        &self,
        actor: &Actor,
        restaurant_id: &RestaurantId,
    ) -> Result<Vec<Order>, LifecycleError> {
        let allowed = actor.role == Role::Dispatch ||
            (actor.role == Role::Restaurant && actor.id.as_str() == restaurant_id.as_str());
        if !allowed {
            return Err(LifecycleError::Forbidden(format!(
                "{actor} may not list orders for restaurant {restaurant_id}"
            )));
        }
        let query = OrderQueryFilter::default().with_restaurant_id(restaurant_id.clone()).newest_first();
        Ok(self.db.search_orders(query).await?)
    }

    /// Every order ever assigned to the dasher, newest first. Visible to the dasher and to dispatch.
    pub async fn list_orders_for_dasher(
        &self,
        actor: &Actor,
        dasher_id: &UserId,
    ) -> Result<Vec<Order>, LifecycleError> {
        let allowed = actor.role == Role::Dispatch || (actor.role == Role::Dasher && &actor.id == dasher_id);
        if !allowed {
            return Err(LifecycleError::Forbidden(format!("{actor} may not list orders for dasher {dasher_id}")));
        }
        let query = OrderQueryFilter::default().with_dasher_id(dasher_id.clone()).newest_first();
        Ok(self.db.search_orders(query).await?)
    }

    /// Moves the order to `target` on behalf of `actor`.
    ///
    /// | Target      | Action         | Who                  | From                                  |
    /// |-------------|----------------|----------------------|---------------------------------------|
    /// | `preparing` | StartPreparing | owning restaurant    | `confirmed`                           |
    /// | `ready`     | MarkReady      | owning restaurant    | `preparing`                           |
    /// | `picked_up` | PickUp         | assigned dasher      | `ready`                               |
    /// | `delivered` | Complete       | assigned dasher      | `picked_up`                           |
    /// | `cancelled` | Cancel         | customer, restaurant | `pending`, `confirmed`, `preparing`, `ready` |
    ///
    /// `confirmed` is only reachable through payment reconciliation, so asking for it is `Forbidden`. Nothing ever
    /// moves back to `pending`, so asking for it is an `InvalidTransition`.
    pub async fn update_status(
        &self,
        actor: &Actor,
        order_id: &OrderId,
        target: OrderStatusType,
    ) -> Result<Order, LifecycleError> {
        match LifecycleAction::for_target(target) {
            Some(action) => self.perform(actor, order_id, action).await,
            None if target == OrderStatusType::Confirmed => {
                debug!("🔄️ {actor} tried to confirm order {order_id} directly");
                Err(LifecycleError::Forbidden("Orders are only confirmed by a successful payment".into()))
            },
            None => {
                let order = fetch_order(&self.db, order_id).await?;
                authorize(LifecycleAction::View, actor, &order)?;
                Err(LifecycleError::InvalidTransition {
                    order_id: order_id.clone(),
                    action: LifecycleAction::View,
                    status: order.status,
                })
            },
        }
    }

    pub async fn start_preparing(&self, actor: &Actor, order_id: &OrderId) -> Result<Order, LifecycleError> {
        self.perform(actor, order_id, LifecycleAction::StartPreparing).await
    }

    pub async fn mark_ready(&self, actor: &Actor, order_id: &OrderId) -> Result<Order, LifecycleError> {
        self.perform(actor, order_id, LifecycleAction::MarkReady).await
    }

    pub async fn pick_up(&self, actor: &Actor, order_id: &OrderId) -> Result<Order, LifecycleError> {
        self.perform(actor, order_id, LifecycleAction::PickUp).await
    }

    pub async fn complete_order(&self, actor: &Actor, order_id: &OrderId) -> Result<Order, LifecycleError> {
        self.perform(actor, order_id, LifecycleAction::Complete).await
    }

    /// Cancels the order. This is a status change only: no refund is issued, and any assigned dasher is released.
    pub async fn cancel_order(&self, actor: &Actor, order_id: &OrderId) -> Result<Order, LifecycleError> {
        self.perform(actor, order_id, LifecycleAction::Cancel).await
    }

    async fn perform(
        &self,
        actor: &Actor,
        order_id: &OrderId,
        action: LifecycleAction,
    ) -> Result<Order, LifecycleError> {
        let order = fetch_order(&self.db, order_id).await?;
        precheck(action, actor, &order)?;
        let dasher_guard = if action.requires_assigned_dasher() { Some(&actor.id) } else { None };
        let applied = apply_transition(&self.db, order_id, action, dasher_guard).await?;
        let (updated, from) = (applied.order, applied.previous_status);
        info!("🔄️ {actor} moved order {order_id} from {from} to {}", updated.status);
        if action == LifecycleAction::Cancel {
            let event = OrderCancelledEvent::new(updated.clone(), from, actor.clone());
            self.producers.publish_order_cancelled(event).await;
        } else {
            let event = StatusChangedEvent::new(updated.clone(), from, actor.clone());
            self.producers.publish_status_changed(event).await;
        }
        Ok(updated)
    }
}
