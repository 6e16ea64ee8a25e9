//! # External collaborators
//!
//! The engine does not own menus, payments or identities. It talks to the services that do through these traits:
//!
//! * [`CatalogGateway`] is the authority on food items, prices and restaurants.
//! * [`PaymentGateway`] authorizes payments. Confirmations arrive later as signed callbacks, handled by
//!   [`crate::PaymentApi`].
//! * [`IdentityProvider`] turns a bearer credential into a user id and role.
//!
//! Every call is bounded with [`bounded`]. A call that runs past the configured timeout is a failure.
use std::{future::Future, time::Duration};

use thiserror::Error;

mod catalog;
mod identity;
mod payment;

pub use catalog::{CatalogGateway, FoodItem};
pub use identity::{Identity, IdentityProvider};
pub use payment::{PaymentAuthorization, PaymentGateway, PaymentMetadata};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("The upstream service is unavailable: {0}")]
    Unavailable(String),
    #[error("The upstream service rejected the request: {0}")]
    Rejected(String),
    #[error("The upstream service did not respond within {0:?}")]
    Timeout(Duration),
}

/// Runs a gateway call, failing with [`GatewayError::Timeout`] if it does not complete within `limit`.
pub async fn bounded<T, F>(limit: Duration, call: F) -> Result<T, GatewayError>
where F: Future<Output = Result<T, GatewayError>> {
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(GatewayError::Timeout(limit)),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn slow_calls_time_out() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, GatewayError>(1)
        };
        let err = bounded(Duration::from_millis(10), slow).await.unwrap_err();
        assert_eq!(err, GatewayError::Timeout(Duration::from_millis(10)));
    }

    #[tokio::test]
    async fn fast_calls_pass_through() {
        let fast = async { Ok::<_, GatewayError>(42) };
        assert_eq!(bounded(Duration::from_millis(100), fast).await.unwrap(), 42);
        let failing = async { Err::<i32, _>(GatewayError::Unavailable("down".into())) };
        let err = bounded(Duration::from_millis(100), failing).await.unwrap_err();
        assert!(matches!(err, GatewayError::Unavailable(_)));
    }
}
