use std::{collections::HashMap, fmt::Debug};

use cucumber::World;
use dash_engine::{
    db_types::{Order, OrderId},
    LifecycleError,
};

use crate::support::TestSystem;

/// State shared between the steps of one scenario. Orders are referred to by a label given in the feature file, and
/// the result of the last `When` step is kept so that `Then` steps can check it.
#[derive(Default, World)]
pub struct DeliveryWorld {
    pub system: Option<TestSystem>,
    pub orders: HashMap<String, OrderId>,
    pub last_result: Option<Result<Order, LifecycleError>>,
    pub race_results: Vec<(String, Result<Order, LifecycleError>)>,
}

impl Debug for DeliveryWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeliveryWorld")
            .field("db", &self.system.as_ref().map(|s| s.db_url.as_str()))
            .field("orders", &self.orders)
            .field("last_result", &self.last_result)
            .finish()
    }
}

impl DeliveryWorld {
    pub fn system(&self) -> &TestSystem {
        self.system.as_ref().expect("Test system not initialised. Did you forget 'Given a fresh install'?")
    }

    pub fn order_id(&self, label: &str) -> OrderId {
        self.orders.get(label).cloned().unwrap_or_else(|| panic!("No order labelled [{label}]"))
    }

    pub fn record(&mut self, result: Result<Order, LifecycleError>) {
        self.last_result = Some(result);
    }
}
