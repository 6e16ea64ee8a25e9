//! # The order lifecycle as data
//!
//! [`LifecycleAction`] holds the transition table: which stored statuses each action may start from and where it
//! leads. [`authorize`] holds the role table: which actors may attempt each action on a given order. Both are pure,
//! so they can be tested without a store, and the engine APIs consult them before every write.
mod access;
mod action;

pub use access::{authorize, resolve_actor, AccessDenied, Actor, Role};
pub use action::LifecycleAction;
