//! #  Order storage.
//!
//! The [`traits`] module defines the contract a storage backend must honour to hold orders for the engine. The
//! SQLite backend in [`sqlite`] is the only supported implementation.
//!
//! Every status or dasher change goes through a single conditional update, so that two racing writers can never both
//! observe success for the same transition.
pub mod traits;

#[cfg(feature = "sqlite")]
pub mod sqlite;
