//! Order validation.
//!
//! [`OrderValidator::validate`] turns a customer's cart into a [`PricedOrderDraft`]. Every price comes from the
//! catalog at the time of validation. Prices the client sends are ignored. Validation has no side effects, so a failed
//! validation leaves nothing behind.
use std::time::Duration;

use chrono::{DateTime, Utc};
use dash_common::Cents;
use log::*;

use crate::{
    db_types::{LineItem, NewOrder, OrderId, PriceBreakdown, RestaurantId, UserId},
    engine_api::{
        errors::LifecycleError,
        order_objects::{NewOrderRequest, OrderItemRequest},
    },
    gateways::{bounded, CatalogGateway},
    helpers::FeePolicy,
};

/// A cart that has been checked against the catalog and priced, but not yet paid for or stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedOrderDraft {
    pub customer_id: UserId,
    pub restaurant_id: RestaurantId,
    pub line_items: Vec<LineItem>,
    pub price: PriceBreakdown,
    pub delivery_address: String,
    pub delivery_instructions: Option<String>,
}

impl PricedOrderDraft {
    pub fn into_new_order(
        self,
        order_id: OrderId,
        payment_intent_id: Option<String>,
        created_at: DateTime<Utc>,
    ) -> NewOrder {
        NewOrder {
            order_id,
            customer_id: self.customer_id,
            restaurant_id: self.restaurant_id,
            line_items: self.line_items,
            price: self.price,
            delivery_address: self.delivery_address,
            delivery_instructions: self.delivery_instructions,
            payment_intent_id,
            created_at,
        }
    }
}

pub struct OrderValidator<C> {
    catalog: C,
    fee_policy: FeePolicy,
    timeout: Duration,
}

impl<C> std::fmt::Debug for OrderValidator<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderValidator ({})", self.fee_policy)
    }
}

impl<C> OrderValidator<C> {
    pub fn new(catalog: C, fee_policy: FeePolicy, timeout: Duration) -> Self {
        Self { catalog, fee_policy, timeout }
    }
}

impl<C> OrderValidator<C>
where C: CatalogGateway
{
    /// Checks and prices a cart.
    ///
    /// The request is checked for shape first (items present, positive quantities, an address), then the restaurant,
    /// then each item in the order given. The first failure is returned. Repeated food ids are kept as separate lines.
    pub async fn validate(
        &self,
        customer_id: &UserId,
        request: &NewOrderRequest,
    ) -> Result<PricedOrderDraft, LifecycleError> {
        if request.items.is_empty() {
            return Err(LifecycleError::EmptyCart);
        }
        let quantities = request.items.iter().map(checked_quantity).collect::<Result<Vec<u32>, _>>()?;
        let delivery_address = request.delivery_address.trim();
        if delivery_address.is_empty() {
            return Err(LifecycleError::InvalidRequest("A delivery address is required".into()));
        }
        if request.restaurant_id.as_str().trim().is_empty() {
            return Err(LifecycleError::InvalidRequest("A restaurant id is required".into()));
        }
        let restaurant_id = &request.restaurant_id;
        if !bounded(self.timeout, self.catalog.restaurant_exists(restaurant_id)).await.map_err(|e| {
            warn!("🔄️ Catalog lookup for restaurant {restaurant_id} failed: {e}");
            LifecycleError::from(e)
        })? {
            return Err(LifecycleError::InvalidRequest(format!("Restaurant {restaurant_id} does not exist")));
        }

        let mut line_items = Vec::with_capacity(request.items.len());
        let mut subtotal = Cents::ZERO;
        for (item, quantity) in request.items.iter().zip(quantities) {
            let food = bounded(self.timeout, self.catalog.get_food_item(&item.food_id))
                .await
                .map_err(|e| {
                    warn!("🔄️ Catalog lookup for food item {} failed: {e}", item.food_id);
                    LifecycleError::from(e)
                })?
                .ok_or_else(|| LifecycleError::ItemNotFound(item.food_id.clone()))?;
            if !food.available {
                return Err(LifecycleError::ItemUnavailable(item.food_id.clone()));
            }
            if &food.restaurant_id != restaurant_id {
                return Err(LifecycleError::ItemRestaurantMismatch {
                    food_id: item.food_id.clone(),
                    restaurant_id: restaurant_id.clone(),
                });
            }
            if food.price.is_negative() {
                let (food_id, price) = (&item.food_id, food.price);
                warn!("🔄️ Catalog lists {food_id} at a negative price of {price}. Refusing to order it.");
                return Err(LifecycleError::InvalidRequest(format!("{} has no valid price", item.food_id)));
            }
            if let Some(client_price) = item.client_price {
                if client_price != food.price {
                    debug!(
                        "🔄️ Client sent {client_price} for {} but the catalog price is {}. Using the catalog \
                         price.",
                        item.food_id, food.price
                    );
                }
            }
            let line = LineItem { food_id: food.food_id, name: food.name, quantity, unit_price: food.price };
            subtotal = line
                .line_total()
                .and_then(|t| subtotal.checked_add(t))
                .ok_or_else(|| LifecycleError::InvalidRequest("The order total is too large".into()))?;
            line_items.push(line);
        }

        let price = self
            .fee_policy
            .quote(subtotal)
            .ok_or_else(|| LifecycleError::InvalidRequest("The order total is too large".into()))?;
        trace!("🔄️ Priced cart for {customer_id}: {price:?}");
        let delivery_instructions =
            request.delivery_instructions.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(String::from);
        Ok(PricedOrderDraft {
            customer_id: customer_id.clone(),
            restaurant_id: restaurant_id.clone(),
            line_items,
            price,
            delivery_address: delivery_address.to_string(),
            delivery_instructions,
        })
    }
}

fn checked_quantity(item: &OrderItemRequest) -> Result<u32, LifecycleError> {
    if item.quantity <= 0 {
        return Err(LifecycleError::InvalidRequest(format!(
            "Quantity for {} must be a positive integer, got {}",
            item.food_id, item.quantity
        )));
    }
    u32::try_from(item.quantity)
        .map_err(|_| LifecycleError::InvalidRequest(format!("Quantity for {} is too large", item.food_id)))
}
