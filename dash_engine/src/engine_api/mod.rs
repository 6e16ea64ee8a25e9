//! # Order lifecycle engine public API
//!
//! The `engine_api` module exposes the programmatic API of the engine. It is split by caller, so a host can wire up
//! only what it needs:
//!
//! * [`order_flow_api`] creates orders for customers and moves them through the kitchen for restaurants. It also
//!   covers pick-up, delivery and cancellation.
//! * [`dasher_api`] lists available orders and assigns them to dashers, atomically.
//! * [`payment_api`] reconciles payment-gateway events (including signed callbacks) with orders.
//!
//! Every API that changes an order checks the actor against [`crate::lifecycle::authorize`] and the stored status
//! against the transition table, then writes through a guarded update on the [`crate::OrderStore`].
//!
//! # API usage
//!
//! ```rust,ignore
//! use dash_engine::{DasherApi, SqliteDatabase, events::EventProducers, lifecycle::Actor};
//! let db = SqliteDatabase::new_with_url("sqlite://data/dash_orders.db", 10).await?;
//! db.migrate().await?;
//! let api = DasherApi::new(db, EventProducers::default());
//! let dasher = Actor::dasher("dasher-42");
//! let available = api.list_available_orders(&dasher).await?;
//! let mine = api.accept_order(&dasher, &available[0].order_id).await?;
//! ```
pub mod dasher_api;
pub mod errors;
pub mod order_flow_api;
pub mod order_objects;
pub mod payment_api;

mod transitions;

#[cfg(test)]
pub(crate) mod mocks;
