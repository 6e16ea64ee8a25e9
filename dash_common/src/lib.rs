mod cents;

pub mod helpers;
pub mod op;
mod secret;

pub use cents::{BasisPoints, Cents, CentsConversionError};
pub use secret::Secret;
