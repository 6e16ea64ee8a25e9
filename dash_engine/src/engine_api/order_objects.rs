use std::fmt::Display;

use chrono::{DateTime, Utc};
use dash_common::{Cents, Secret};
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{FoodId, Order, OrderId, OrderStatusType, RestaurantId, UserId},
    engine_api::errors::LifecycleError,
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderQueryFilter {
    pub order_id: Option<OrderId>,
    pub customer_id: Option<UserId>,
    pub restaurant_id: Option<RestaurantId>,
    pub dasher_id: Option<UserId>,
    #[serde(default)]
    pub statuses: Vec<OrderStatusType>,
    /// Only orders with no dasher assigned
    #[serde(default)]
    pub unassigned_only: bool,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    #[serde(default)]
    pub newest_first: bool,
    pub limit: Option<i64>,
}

impl OrderQueryFilter {
    pub fn with_order_id(mut self, order_id: OrderId) -> Self {
        self.order_id = Some(order_id);
        self
    }

    pub fn with_customer_id(mut self, customer_id: UserId) -> Self {
        self.customer_id = Some(customer_id);
        self
    }

    pub fn with_restaurant_id(mut self, restaurant_id: RestaurantId) -> Self {
        self.restaurant_id = Some(restaurant_id);
        self
    }

    pub fn with_dasher_id(mut self, dasher_id: UserId) -> Self {
        self.dasher_id = Some(dasher_id);
        self
    }

    pub fn with_status(mut self, status: OrderStatusType) -> Self {
        self.statuses.push(status);
        self
    }

    pub fn with_statuses(mut self, statuses: &[OrderStatusType]) -> Self {
        self.statuses.extend_from_slice(statuses);
        self
    }

    pub fn unassigned(mut self) -> Self {
        self.unassigned_only = true;
        self
    }

    pub fn newest_first(mut self) -> Self {
        self.newest_first = true;
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn since<T>(mut self, since: T) -> Result<Self, LifecycleError>
    where
        T: TryInto<DateTime<Utc>>,
        T::Error: Display,
    {
        let dt = since.try_into().map_err(|e| LifecycleError::InvalidRequest(e.to_string()))?;
        self.since = Some(dt);
        Ok(self)
    }

    pub fn until<T>(mut self, until: T) -> Result<Self, LifecycleError>
    where
        T: TryInto<DateTime<Utc>>,
        T::Error: Display,
    {
        let dt = until.try_into().map_err(|e| LifecycleError::InvalidRequest(e.to_string()))?;
        self.until = Some(dt);
        Ok(self)
    }

    /// True if the filter has no `WHERE` conditions. Ordering and limits don't count.
    pub fn is_empty(&self) -> bool {
        self.order_id.is_none() &&
            self.customer_id.is_none() &&
            self.restaurant_id.is_none() &&
            self.dasher_id.is_none() &&
            self.statuses.is_empty() &&
            !self.unassigned_only &&
            self.since.is_none() &&
            self.until.is_none()
    }
}

/// One line of a customer's cart, as sent by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItemRequest {
    pub food_id: FoodId,
    pub quantity: i64,
    /// Whatever price the client displayed. It is never used for pricing.
    #[serde(default, alias = "price")]
    pub client_price: Option<Cents>,
}

impl OrderItemRequest {
    pub fn new<F: Into<FoodId>>(food_id: F, quantity: i64) -> Self {
        Self { food_id: food_id.into(), quantity, client_price: None }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrderRequest {
    pub restaurant_id: RestaurantId,
    pub items: Vec<OrderItemRequest>,
    pub delivery_address: String,
    #[serde(default)]
    pub delivery_instructions: Option<String>,
}

/// A newly created order, together with the client secret the checkout UI needs to complete payment.
#[derive(Debug, Clone)]
pub struct CreatedOrder {
    pub order: Order,
    pub client_secret: Secret<String>,
}

/// An out-of-band notification from the payment gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub intent_id: String,
}

impl PaymentEvent {
    pub const SUCCESS_TYPES: [&'static str; 2] = ["payment_succeeded", "payment_intent.succeeded"];

    pub fn new<S: Into<String>>(event_type: S, intent_id: S) -> Self {
        Self { event_type: event_type.into(), intent_id: intent_id.into() }
    }

    pub fn is_success(&self) -> bool {
        PaymentEvent::SUCCESS_TYPES.contains(&self.event_type.as_str())
    }
}

/// What reconciling a payment event did to its order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentEventOutcome {
    /// The order moved from `pending` to `confirmed`.
    Confirmed(Order),
    /// The order had already been confirmed, or moved further along. Nothing was changed.
    AlreadyConfirmed(Order),
    /// The payment succeeded for an order that was cancelled. The event is acknowledged and the order is left
    /// alone; reversing the payment is up to a human.
    NeedsAttention(Order),
    /// The event is not a success event. Nothing was looked up or changed.
    Ignored,
}
