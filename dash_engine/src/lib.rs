//! Campus delivery order engine
//!
//! This library holds the order lifecycle for a campus food-delivery service: customers order from restaurants,
//! pay through an external payment gateway, and dashers deliver. It owns the rules and nothing else. Menus,
//! payments and identities belong to external services, reached through the traits in [`gateways`].
//!
//! The library is divided into these main sections:
//! 1. Storage ([`mod@db`]). SQLite is the supported backend. You should never need to touch the database directly;
//!    go through the public API instead. The data types stored there are defined in [`db_types`] and are public.
//! 2. The lifecycle rules ([`lifecycle`]): the transition table and the role table, as plain data and pure functions.
//! 3. Order validation ([`validation`]), which prices carts from the catalog and never from the client.
//! 4. The public API ([`engine_api`]): [`OrderFlowApi`], [`DasherApi`] and [`PaymentApi`].
//!
//! The engine also emits lifecycle events that hosts can subscribe to, for example to notify a dasher when an order
//! is assigned to them. See [`events`].
pub mod config;
pub mod db;
pub mod db_types;
pub mod events;
pub mod gateways;
pub mod helpers;
pub mod lifecycle;
pub mod validation;

mod engine_api;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use config::{EngineConfig, WebhookConfig};
#[cfg(feature = "sqlite")]
pub use db::sqlite::{SqliteDatabase, SqliteDatabaseError};
pub use db::traits::{AppliedTransition, ConditionalUpdate, OrderStore, OrderStoreError, StatusTransition};
pub use engine_api::{
    dasher_api::DasherApi,
    errors::{ErrorKind, LifecycleError},
    order_flow_api::OrderFlowApi,
    order_objects,
    payment_api::PaymentApi,
};
