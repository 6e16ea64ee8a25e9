use dash_common::{Cents, Secret};
use serde::{Deserialize, Serialize};

use super::GatewayError;
use crate::{
    db_types::{OrderId, PriceBreakdown, RestaurantId, UserId},
    helpers::PayoutSplit,
};

/// Attached to a payment authorization so that the gateway's records can be traced back to the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMetadata {
    pub order_id: OrderId,
    pub customer_id: UserId,
    pub restaurant_id: RestaurantId,
    pub food_total: Cents,
    pub delivery_fee: Cents,
    pub dasher_fee: Cents,
    pub payout: PayoutSplit,
}

impl PaymentMetadata {
    pub fn new(order_id: OrderId, customer_id: UserId, restaurant_id: RestaurantId, price: &PriceBreakdown) -> Self {
        Self {
            order_id,
            customer_id,
            restaurant_id,
            food_total: price.subtotal,
            delivery_fee: price.delivery_fee,
            dasher_fee: price.dasher_fee,
            payout: PayoutSplit::from(price),
        }
    }
}

/// The handle returned by the gateway for an authorized, not-yet-settled payment.
#[derive(Debug, Clone)]
pub struct PaymentAuthorization {
    pub intent_id: String,
    /// Handed to the checkout UI once. Never stored or logged.
    pub client_secret: Secret<String>,
}

#[allow(async_fn_in_trait)]
pub trait PaymentGateway {
    async fn authorize(&self, amount: Cents, metadata: &PaymentMetadata)
        -> Result<PaymentAuthorization, GatewayError>;
}
