use std::time::Duration;

use cucumber::{then, when};
use dash_common::Cents;
use dash_engine::{
    db_types::{OrderStatusType, RestaurantId, UserId},
    lifecycle::Actor,
    order_objects::PaymentEventOutcome,
    LifecycleError,
};

use crate::{cucumber::DeliveryWorld, support::cart};

async fn place_order(
    world: &mut DeliveryWorld,
    customer: &str,
    label: String,
    restaurant: &str,
    items: &[(&str, i64)],
) {
    let result = world.system().orders.create_order(&Actor::customer(customer), cart(restaurant, items)).await;
    let result = result.map(|created| created.order);
    if let Ok(order) = &result {
        world.orders.insert(label, order.order_id.clone());
    }
    world.record(result);
}

#[when(expr = "customer '{word}' places order [{word}] at '{word}' for {int} {word} and {int} {word}")]
async fn place_two_line_order(
    world: &mut DeliveryWorld,
    customer: String,
    label: String,
    restaurant: String,
    qty1: i64,
    food1: String,
    qty2: i64,
    food2: String,
) {
    place_order(world, &customer, label, &restaurant, &[(food1.as_str(), qty1), (food2.as_str(), qty2)]).await;
}

#[when(expr = "customer '{word}' places order [{word}] at '{word}' for {int} {word}")]
async fn place_one_line_order(
    world: &mut DeliveryWorld,
    customer: String,
    label: String,
    restaurant: String,
    qty: i64,
    food: String,
) {
    place_order(world, &customer, label, &restaurant, &[(food.as_str(), qty)]).await;
}

#[when("the payment gateway is down")]
async fn payment_gateway_down(world: &mut DeliveryWorld) {
    world.system().payments.set_failing(true);
}

#[when(expr = "the payment gateway takes {int}ms to answer")]
async fn payment_gateway_slow(world: &mut DeliveryWorld, ms: u64) {
    world.system().payments.set_delay(Duration::from_millis(ms));
}

#[when(expr = "the payment for order [{word}] succeeds")]
async fn payment_succeeds(world: &mut DeliveryWorld, label: String) {
    let sys = world.system();
    let order = sys.orders.get_order(&Actor::dispatch("ops"), &world.order_id(&label)).await.expect("Unknown order");
    let intent = order.payment_intent_id.clone().expect("Order has no payment intent");
    let result = sys.payment_api.on_payment_event("payment_succeeded", &intent).await.map(|outcome| match outcome {
        PaymentEventOutcome::Confirmed(o) |
        PaymentEventOutcome::AlreadyConfirmed(o) |
        PaymentEventOutcome::NeedsAttention(o) => o,
        PaymentEventOutcome::Ignored => order,
    });
    world.record(result);
}

#[when(expr = "dasher '{word}' accepts order [{word}]")]
async fn accept_order(world: &mut DeliveryWorld, dasher: String, label: String) {
    let result = world.system().dashers.accept_order(&Actor::dasher(dasher), &world.order_id(&label)).await;
    world.record(result);
}

#[when(expr = "dashers '{word}' and '{word}' accept order [{word}] at the same time")]
async fn race_for_order(world: &mut DeliveryWorld, first: String, second: String, label: String) {
    let id = world.order_id(&label);
    let sys = world.system();
    let (a, b) = (Actor::dasher(first.as_str()), Actor::dasher(second.as_str()));
    let (ra, rb) = tokio::join!(sys.dashers.accept_order(&a, &id), sys.dashers.accept_order(&b, &id));
    world.race_results = vec![(first, ra), (second, rb)];
}

#[when(expr = "'{word}' assigns dasher '{word}' to order [{word}]")]
async fn assign_dasher(world: &mut DeliveryWorld, restaurant: String, dasher: String, label: String) {
    let actor = Actor::restaurant(&RestaurantId::from(restaurant));
    let result = world.system().dashers.assign_dasher(&actor, &world.order_id(&label), &UserId::from(dasher)).await;
    world.record(result);
}

#[when(expr = "'{word}' starts preparing order [{word}]")]
async fn start_preparing(world: &mut DeliveryWorld, restaurant: String, label: String) {
    let actor = Actor::restaurant(&RestaurantId::from(restaurant));
    let result = world.system().orders.start_preparing(&actor, &world.order_id(&label)).await;
    world.record(result);
}

#[when(expr = "'{word}' marks order [{word}] ready")]
async fn mark_ready(world: &mut DeliveryWorld, restaurant: String, label: String) {
    let actor = Actor::restaurant(&RestaurantId::from(restaurant));
    let result = world.system().orders.mark_ready(&actor, &world.order_id(&label)).await;
    world.record(result);
}

#[when(expr = "dasher '{word}' picks up order [{word}]")]
async fn pick_up(world: &mut DeliveryWorld, dasher: String, label: String) {
    let result = world.system().orders.pick_up(&Actor::dasher(dasher), &world.order_id(&label)).await;
    world.record(result);
}

#[when(expr = "dasher '{word}' delivers order [{word}]")]
async fn deliver(world: &mut DeliveryWorld, dasher: String, label: String) {
    let result = world.system().orders.complete_order(&Actor::dasher(dasher), &world.order_id(&label)).await;
    world.record(result);
}

#[when(expr = "customer '{word}' cancels order [{word}]")]
async fn cancel(world: &mut DeliveryWorld, customer: String, label: String) {
    let result = world.system().orders.cancel_order(&Actor::customer(customer), &world.order_id(&label)).await;
    world.record(result);
}

#[then("the request succeeds")]
async fn request_succeeds(world: &mut DeliveryWorld) {
    match &world.last_result {
        Some(Ok(_)) => {},
        other => panic!("Expected the last request to succeed, but got {other:?}"),
    }
}

#[then(expr = "the request fails with {word}")]
async fn request_fails(world: &mut DeliveryWorld, expected: String) {
    let err = match &world.last_result {
        Some(Err(e)) => e,
        other => panic!("Expected the last request to fail with {expected}, but got {other:?}"),
    };
    assert_eq!(error_name(err), expected, "Unexpected error: {err}");
}

fn error_name(err: &LifecycleError) -> &'static str {
    match err {
        LifecycleError::InvalidRequest(_) => "InvalidRequest",
        LifecycleError::EmptyCart => "EmptyCart",
        LifecycleError::ItemNotFound(_) => "ItemNotFound",
        LifecycleError::ItemUnavailable(_) => "ItemUnavailable",
        LifecycleError::ItemRestaurantMismatch { .. } => "ItemRestaurantMismatch",
        LifecycleError::OrderNotFound(_) => "OrderNotFound",
        LifecycleError::Forbidden(_) => "Forbidden",
        LifecycleError::InvalidTransition { .. } => "InvalidTransition",
        LifecycleError::AlreadyClaimed(_) => "AlreadyClaimed",
        LifecycleError::UpstreamUnavailable(_) => "UpstreamUnavailable",
        LifecycleError::Internal(_) => "Internal",
    }
}

#[then(expr = "order [{word}] has status {word}")]
async fn order_has_status(world: &mut DeliveryWorld, label: String, status: String) {
    let expected = status.parse::<OrderStatusType>().expect("Not a valid order status");
    let order = world.system().orders.get_order(&Actor::dispatch("ops"), &world.order_id(&label)).await.unwrap();
    assert_eq!(order.status, expected);
}

#[then(expr = "order [{word}] is assigned to '{word}'")]
async fn order_is_assigned(world: &mut DeliveryWorld, label: String, dasher: String) {
    let order = world.system().orders.get_order(&Actor::dispatch("ops"), &world.order_id(&label)).await.unwrap();
    assert_eq!(order.dasher_id, Some(UserId::from(dasher)));
}

#[then(expr = "order [{word}] has no dasher")]
async fn order_has_no_dasher(world: &mut DeliveryWorld, label: String) {
    let order = world.system().orders.get_order(&Actor::dispatch("ops"), &world.order_id(&label)).await.unwrap();
    assert_eq!(order.dasher_id, None);
}

#[then(expr = "order [{word}] costs {word} for food, {word} delivery and {word} for the dasher, {word} in total")]
async fn order_costs(
    world: &mut DeliveryWorld,
    label: String,
    subtotal: String,
    delivery_fee: String,
    dasher_fee: String,
    total: String,
) {
    let order = world.system().orders.get_order(&Actor::dispatch("ops"), &world.order_id(&label)).await.unwrap();
    let parse = |s: &str| s.parse::<Cents>().expect("Not a valid amount");
    assert_eq!(order.subtotal, parse(&subtotal));
    assert_eq!(order.delivery_fee, parse(&delivery_fee));
    assert_eq!(order.dasher_fee, parse(&dasher_fee));
    assert_eq!(order.total, parse(&total));
    assert!(order.totals_are_consistent());
}

#[then(expr = "customer '{word}' has {int} orders")]
async fn customer_order_count(world: &mut DeliveryWorld, customer: String, count: usize) {
    let actor = Actor::customer(customer.as_str());
    let orders = world.system().orders.list_orders_for_customer(&actor, &UserId::from(customer)).await.unwrap();
    assert_eq!(orders.len(), count);
}

#[then(expr = "exactly one dasher won order [{word}] and the other was told it is already claimed")]
async fn one_winner(world: &mut DeliveryWorld, label: String) {
    let winners = world.race_results.iter().filter(|(_, r)| r.is_ok()).map(|(d, _)| d.clone()).collect::<Vec<_>>();
    let losers = world.race_results.iter().filter(|(_, r)| matches!(r, Err(LifecycleError::AlreadyClaimed(_)))).count();
    assert_eq!(winners.len(), 1, "{:?}", world.race_results);
    assert_eq!(losers, 1, "{:?}", world.race_results);
    let order = world.system().orders.get_order(&Actor::dispatch("ops"), &world.order_id(&label)).await.unwrap();
    assert_eq!(order.dasher_id, Some(UserId::from(winners[0].as_str())));
}
