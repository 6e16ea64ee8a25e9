//! #  Storage backend contracts.
//!
//! * [`OrderStore`] persists orders and applies guarded status and dasher changes atomically.
//! * [`ConditionalUpdate`] reports whether a guarded change was applied. A rejection carries no reason; callers
//!   re-read the order to work out why.
mod data_objects;
mod errors;
mod order_store;

pub use data_objects::{AppliedTransition, ConditionalUpdate, StatusTransition};
pub use errors::OrderStoreError;
pub use order_store::OrderStore;
