use dash_common::Cents;
use serde::{Deserialize, Serialize};

use super::GatewayError;
use crate::db_types::{FoodId, RestaurantId};

/// The catalog's authoritative view of a food item at the time of the lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoodItem {
    pub food_id: FoodId,
    pub restaurant_id: RestaurantId,
    pub name: String,
    pub price: Cents,
    pub available: bool,
}

#[allow(async_fn_in_trait)]
pub trait CatalogGateway {
    /// Returns `None` if the catalog has no item with this id.
    async fn get_food_item(&self, food_id: &FoodId) -> Result<Option<FoodItem>, GatewayError>;

    async fn restaurant_exists(&self, restaurant_id: &RestaurantId) -> Result<bool, GatewayError>;
}
