#![allow(dead_code)]

use std::time::Duration;

use dash_engine::{
    db_types::{Order, RestaurantId},
    events::EventProducers,
    lifecycle::Actor,
    order_objects::{CreatedOrder, NewOrderRequest, OrderItemRequest, PaymentEventOutcome},
    test_utils::{
        fakes::{FakePaymentGateway, InMemoryCatalog},
        prepare_env::{drop_database, prepare_test_env, random_db_path},
    },
    DasherApi,
    EngineConfig,
    OrderFlowApi,
    OrderStore,
    PaymentApi,
    SqliteDatabase,
    WebhookConfig,
};
use log::*;

pub const WEBHOOK_SECRET: &str = "whsec_campus_test";

pub type TestOrderFlowApi = OrderFlowApi<SqliteDatabase, InMemoryCatalog, FakePaymentGateway>;

pub struct TestSystem {
    pub db_url: String,
    pub db: SqliteDatabase,
    pub catalog: InMemoryCatalog,
    pub payments: FakePaymentGateway,
    pub orders: TestOrderFlowApi,
    pub dashers: DasherApi<SqliteDatabase>,
    pub payment_api: PaymentApi<SqliteDatabase>,
}

pub fn test_config() -> EngineConfig {
    EngineConfig {
        gateway_timeout: Duration::from_millis(200),
        webhook: WebhookConfig::new(WEBHOOK_SECRET),
        ..EngineConfig::default()
    }
}

/// Bagel Barn sells bagels ($5.00), coffee ($3.00) and lox ($9.00). Taco Hut sells tacos ($4.00).
pub fn standard_menu() -> InMemoryCatalog {
    let catalog = InMemoryCatalog::new();
    catalog
        .add_item("bagel-barn", "bagel", "Everything bagel", 500)
        .add_item("bagel-barn", "coffee", "Drip coffee", 300)
        .add_item("bagel-barn", "lox", "Lox plate", 900)
        .add_item("taco-hut", "taco", "Al pastor taco", 400);
    catalog
}

pub fn cart(restaurant: &str, items: &[(&str, i64)]) -> NewOrderRequest {
    NewOrderRequest {
        restaurant_id: RestaurantId::from(restaurant),
        items: items.iter().map(|(food, qty)| OrderItemRequest::new(*food, *qty)).collect(),
        delivery_address: "Maple Hall, room 214".into(),
        delivery_instructions: Some("Leave at the front desk".into()),
    }
}

pub fn bagel_barn() -> Actor {
    Actor::restaurant(&RestaurantId::from("bagel-barn"))
}

impl TestSystem {
    pub async fn new() -> Self {
        Self::with_producers(EventProducers::default()).await
    }

    pub async fn with_producers(producers: EventProducers) -> Self {
        let db_url = random_db_path();
        let db = prepare_test_env(&db_url).await;
        let config = test_config();
        let catalog = standard_menu();
        let payments = FakePaymentGateway::new();
        let orders =
            OrderFlowApi::from_config(db.clone(), catalog.clone(), payments.clone(), &config, producers.clone());
        let dashers = DasherApi::new(db.clone(), producers.clone());
        let payment_api = PaymentApi::new(db.clone(), config.webhook.clone(), producers);
        debug!("🚀️ Test system ready on {db_url}");
        Self { db_url, db, catalog, payments, orders, dashers, payment_api }
    }

    /// Places a Bagel Barn order of two bagels and a coffee for `customer`.
    pub async fn place_order(&self, customer: &str) -> CreatedOrder {
        self.orders
            .create_order(&Actor::customer(customer), cart("bagel-barn", &[("bagel", 2), ("coffee", 1)]))
            .await
            .expect("Error creating order")
    }

    pub async fn pay(&self, order: &Order) -> PaymentEventOutcome {
        let intent = order.payment_intent_id.as_deref().expect("Order has no payment intent");
        self.payment_api.on_payment_event("payment_succeeded", intent).await.expect("Error confirming payment")
    }

    /// A paid-for order with no dasher.
    pub async fn confirmed_order(&self, customer: &str) -> Order {
        let created = self.place_order(customer).await;
        match self.pay(&created.order).await {
            PaymentEventOutcome::Confirmed(order) => order,
            other => panic!("Expected the order to be confirmed, got {other:?}"),
        }
    }

    /// A confirmed order, accepted by `dasher` and taken through to `ready` by the restaurant.
    pub async fn ready_order(&self, customer: &str, dasher: &str) -> Order {
        let order = self.confirmed_order(customer).await;
        self.dashers.accept_order(&Actor::dasher(dasher), &order.order_id).await.expect("Error accepting order");
        self.orders.start_preparing(&bagel_barn(), &order.order_id).await.expect("Error starting order");
        self.orders.mark_ready(&bagel_barn(), &order.order_id).await.expect("Error marking order ready")
    }

    pub async fn tear_down(mut self) {
        if let Err(e) = self.db.close().await {
            error!("🚀️ Failed to close database: {e}");
        }
        drop_database(&self.db_url).await;
    }
}
