use chrono::Utc;
use dash_common::Cents;
use mockall::mock;

use crate::{
    db::traits::{AppliedTransition, ConditionalUpdate, OrderStore, OrderStoreError, StatusTransition},
    db_types::{FoodId, NewOrder, Order, OrderId, OrderStatusType, RestaurantId, UserId},
    gateways::{CatalogGateway, FoodItem, GatewayError, PaymentAuthorization, PaymentGateway, PaymentMetadata},
    order_objects::OrderQueryFilter,
};

mock! {
    pub Store {}
    impl Clone for Store {
        fn clone(&self) -> Self;
    }
    impl OrderStore for Store {
        fn url(&self) -> &str;
        async fn insert_order(&self, order: NewOrder) -> Result<Order, OrderStoreError>;
        async fn fetch_order_by_order_id(&self, order_id: &OrderId) -> Result<Option<Order>, OrderStoreError>;
        async fn fetch_order_by_payment_intent(&self, intent_id: &str) -> Result<Option<Order>, OrderStoreError>;
        async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderStoreError>;
        async fn transition_status(
            &self,
            order_id: &OrderId,
            transition: StatusTransition,
        ) -> Result<ConditionalUpdate<AppliedTransition>, OrderStoreError>;
        async fn claim_order(
            &self,
            order_id: &OrderId,
            dasher: &UserId,
            allowed: &[OrderStatusType],
        ) -> Result<ConditionalUpdate, OrderStoreError>;
        async fn close(&mut self) -> Result<(), OrderStoreError>;
    }
}

mock! {
    pub Catalog {}
    impl CatalogGateway for Catalog {
        async fn get_food_item(&self, food_id: &FoodId) -> Result<Option<FoodItem>, GatewayError>;
        async fn restaurant_exists(&self, restaurant_id: &RestaurantId) -> Result<bool, GatewayError>;
    }
}

mock! {
    pub Payments {}
    impl PaymentGateway for Payments {
        async fn authorize(
            &self,
            amount: Cents,
            metadata: &PaymentMetadata,
        ) -> Result<PaymentAuthorization, GatewayError>;
    }
}

pub fn order(status: OrderStatusType, dasher: Option<&str>) -> Order {
    let now = Utc::now();
    Order {
        id: 7,
        order_id: OrderId::from("o-7"),
        customer_id: UserId::from("alice"),
        restaurant_id: RestaurantId::from("bagel-barn"),
        dasher_id: dasher.map(UserId::from),
        line_items: vec![],
        subtotal: Cents::from(1000),
        delivery_fee: Cents::from(50),
        dasher_fee: Cents::from(300),
        total: Cents::from(1350),
        status,
        delivery_address: "Dorm 4".into(),
        delivery_instructions: None,
        payment_intent_id: Some("pi_7".into()),
        created_at: now,
        updated_at: now,
        confirmed_at: None,
        ready_at: None,
        picked_up_at: None,
        delivered_at: None,
    }
}
