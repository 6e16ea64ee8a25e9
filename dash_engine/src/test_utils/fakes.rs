use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
        Mutex,
        RwLock,
    },
    time::Duration,
};

use dash_common::{Cents, Secret};

use crate::{
    db_types::{FoodId, RestaurantId},
    gateways::{
        CatalogGateway,
        FoodItem,
        GatewayError,
        Identity,
        IdentityProvider,
        PaymentAuthorization,
        PaymentGateway,
        PaymentMetadata,
    },
};

#[derive(Default)]
struct CatalogState {
    restaurants: HashSet<RestaurantId>,
    items: HashMap<FoodId, FoodItem>,
}

/// A catalog held in memory. Clones share the same menu, so a test can change prices or availability after handing
/// a clone to the engine.
#[derive(Clone, Default)]
pub struct InMemoryCatalog {
    state: Arc<RwLock<CatalogState>>,
    offline: Arc<AtomicBool>,
    delay_ms: Arc<AtomicU64>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_restaurant(&self, restaurant_id: &str) -> &Self {
        self.state.write().unwrap().restaurants.insert(RestaurantId::from(restaurant_id));
        self
    }

    /// Adds (or replaces) a menu item, registering its restaurant as well. `price` is in cents.
    pub fn add_item(&self, restaurant_id: &str, food_id: &str, name: &str, price: i64) -> &Self {
        let item = FoodItem {
            food_id: FoodId::from(food_id),
            restaurant_id: RestaurantId::from(restaurant_id),
            name: name.to_string(),
            price: Cents::from(price),
            available: true,
        };
        let mut state = self.state.write().unwrap();
        state.restaurants.insert(item.restaurant_id.clone());
        state.items.insert(item.food_id.clone(), item);
        self
    }

    pub fn set_available(&self, food_id: &str, available: bool) {
        if let Some(item) = self.state.write().unwrap().items.get_mut(&FoodId::from(food_id)) {
            item.available = available;
        }
    }

    pub fn set_price(&self, food_id: &str, price: i64) {
        if let Some(item) = self.state.write().unwrap().items.get_mut(&FoodId::from(food_id)) {
            item.price = Cents::from(price);
        }
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Makes every call take at least this long.
    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    async fn simulate_network(&self) -> Result<(), GatewayError> {
        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.offline.load(Ordering::SeqCst) {
            return Err(GatewayError::Unavailable("catalog is offline".into()));
        }
        Ok(())
    }
}

impl CatalogGateway for InMemoryCatalog {
    async fn get_food_item(&self, food_id: &FoodId) -> Result<Option<FoodItem>, GatewayError> {
        self.simulate_network().await?;
        Ok(self.state.read().unwrap().items.get(food_id).cloned())
    }

    async fn restaurant_exists(&self, restaurant_id: &RestaurantId) -> Result<bool, GatewayError> {
        self.simulate_network().await?;
        Ok(self.state.read().unwrap().restaurants.contains(restaurant_id))
    }
}

/// A payment gateway that records every authorization. Intent ids are `pi_<order id>`.
#[derive(Clone, Default)]
pub struct FakePaymentGateway {
    authorizations: Arc<Mutex<Vec<(Cents, PaymentMetadata)>>>,
    failing: Arc<AtomicBool>,
    delay_ms: Arc<AtomicU64>,
}

impl FakePaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// Every successful authorization so far, in order.
    pub fn authorizations(&self) -> Vec<(Cents, PaymentMetadata)> {
        self.authorizations.lock().unwrap().clone()
    }
}

impl PaymentGateway for FakePaymentGateway {
    async fn authorize(
        &self,
        amount: Cents,
        metadata: &PaymentMetadata,
    ) -> Result<PaymentAuthorization, GatewayError> {
        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(GatewayError::Unavailable("payment gateway is down".into()));
        }
        self.authorizations.lock().unwrap().push((amount, metadata.clone()));
        let intent_id = format!("pi_{}", metadata.order_id);
        let client_secret = Secret::new(format!("{intent_id}_secret_{}", rand::random::<u32>()));
        Ok(PaymentAuthorization { intent_id, client_secret })
    }
}

/// Maps fixed bearer tokens to identities.
#[derive(Clone, Default)]
pub struct StaticIdentityProvider {
    tokens: HashMap<String, Identity>,
}

impl StaticIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: &str, identity: Identity) -> Self {
        self.tokens.insert(token.to_string(), identity);
        self
    }
}

impl IdentityProvider for StaticIdentityProvider {
    async fn verify(&self, bearer: &str) -> Result<Identity, GatewayError> {
        self.tokens.get(bearer).cloned().ok_or_else(|| GatewayError::Rejected("unknown token".into()))
    }
}
