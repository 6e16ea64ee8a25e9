use cucumber::given;
use dash_engine::db_types::{OrderStatusType, UserId};
use log::*;

use crate::{cucumber::DeliveryWorld, support::TestSystem};

#[given("a fresh install")]
async fn fresh_database(world: &mut DeliveryWorld) {
    let system = TestSystem::new().await;
    debug!("🚀️ Fresh install at {}", system.db_url);
    world.system = Some(system);
}

#[given(expr = "'{word}' sells {word} for {word}")]
async fn menu_item(world: &mut DeliveryWorld, restaurant: String, food: String, price: String) {
    let price = price.parse::<dash_common::Cents>().expect("Not a valid price");
    world.system().catalog.add_item(&restaurant, &food, &food, price.value());
}

#[given(expr = "a confirmed order [{word}] from customer '{word}'")]
async fn confirmed_order(world: &mut DeliveryWorld, label: String, customer: String) {
    let order = world.system().confirmed_order(&customer).await;
    assert_eq!(order.status, OrderStatusType::Confirmed);
    world.orders.insert(label, order.order_id);
}

#[given(expr = "a ready order [{word}] from customer '{word}' accepted by dasher '{word}'")]
async fn ready_order(world: &mut DeliveryWorld, label: String, customer: String, dasher: String) {
    let order = world.system().ready_order(&customer, &dasher).await;
    assert_eq!(order.dasher_id, Some(UserId::from(dasher)));
    world.orders.insert(label, order.order_id);
}
