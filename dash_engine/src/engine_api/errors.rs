use thiserror::Error;

use crate::{
    db::traits::OrderStoreError,
    db_types::{FoodId, OrderId, OrderStatusType, RestaurantId},
    gateways::GatewayError,
    helpers::WebhookSignatureError,
    lifecycle::{AccessDenied, LifecycleAction},
};

/// Broad classes of [`LifecycleError`], for callers that only need to know how to react.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidRequest,
    NotFound,
    Forbidden,
    /// The stored state does not allow the request. Re-read before deciding whether to try again.
    Conflict,
    Upstream,
    Internal,
}

impl ErrorKind {
    /// Only upstream failures may be retried as-is, with backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Upstream)
    }

    pub fn http_status(&self) -> u16 {
        match self {
            ErrorKind::InvalidRequest => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::Forbidden => 403,
            ErrorKind::Conflict => 409,
            ErrorKind::Upstream => 503,
            ErrorKind::Internal => 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("The order has no items")]
    EmptyCart,
    #[error("Food item {0} does not exist")]
    ItemNotFound(FoodId),
    #[error("Food item {0} is not available")]
    ItemUnavailable(FoodId),
    #[error("Food item {food_id} is not sold by restaurant {restaurant_id}")]
    ItemRestaurantMismatch { food_id: FoodId, restaurant_id: RestaurantId },
    #[error("Order not found: {0}")]
    OrderNotFound(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Cannot {action} order {order_id} while it is {status}")]
    InvalidTransition { order_id: OrderId, action: LifecycleAction, status: OrderStatusType },
    #[error("Order {0} has already been claimed by another dasher")]
    AlreadyClaimed(OrderId),
    #[error("An upstream service is unavailable: {0}")]
    UpstreamUnavailable(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LifecycleError {
    pub fn kind(&self) -> ErrorKind {
        use LifecycleError::*;
        match self {
            InvalidRequest(_) | EmptyCart | ItemUnavailable(_) | ItemRestaurantMismatch { .. } => {
                ErrorKind::InvalidRequest
            },
            ItemNotFound(_) | OrderNotFound(_) => ErrorKind::NotFound,
            Forbidden(_) => ErrorKind::Forbidden,
            InvalidTransition { .. } | AlreadyClaimed(_) => ErrorKind::Conflict,
            UpstreamUnavailable(_) => ErrorKind::Upstream,
            Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn order_not_found(order_id: &OrderId) -> Self {
        LifecycleError::OrderNotFound(order_id.to_string())
    }
}

impl From<OrderStoreError> for LifecycleError {
    fn from(e: OrderStoreError) -> Self {
        LifecycleError::Internal(e.to_string())
    }
}

impl From<GatewayError> for LifecycleError {
    fn from(e: GatewayError) -> Self {
        LifecycleError::UpstreamUnavailable(e.to_string())
    }
}

impl From<AccessDenied> for LifecycleError {
    fn from(e: AccessDenied) -> Self {
        LifecycleError::Forbidden(e.to_string())
    }
}

impl From<WebhookSignatureError> for LifecycleError {
    fn from(e: WebhookSignatureError) -> Self {
        LifecycleError::Forbidden(e.to_string())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn only_upstream_failures_are_retryable() {
        let errors = [
            LifecycleError::InvalidRequest("bad".into()),
            LifecycleError::EmptyCart,
            LifecycleError::ItemNotFound("f1".into()),
            LifecycleError::OrderNotFound("o1".into()),
            LifecycleError::Forbidden("no".into()),
            LifecycleError::AlreadyClaimed("o1".into()),
            LifecycleError::Internal("db".into()),
        ];
        for e in errors {
            assert!(!e.kind().is_retryable(), "{e}");
        }
        assert!(LifecycleError::from(GatewayError::Unavailable("x".into())).kind().is_retryable());
    }

    #[test]
    fn status_hints() {
        let conflict = LifecycleError::InvalidTransition {
            order_id: "o1".into(),
            action: LifecycleAction::Cancel,
            status: OrderStatusType::PickedUp,
        };
        assert_eq!(conflict.kind().http_status(), 409);
        assert_eq!(conflict.to_string(), "Cannot cancel order o1 while it is picked_up");
        assert_eq!(LifecycleError::EmptyCart.kind().http_status(), 400);
        assert_eq!(LifecycleError::from(OrderStoreError::DatabaseError("x".into())).kind().http_status(), 500);
        assert_eq!(LifecycleError::from(WebhookSignatureError::SignatureMismatch).kind(), ErrorKind::Forbidden);
    }
}
