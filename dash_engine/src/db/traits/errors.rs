use thiserror::Error;

use crate::db_types::OrderId;

#[derive(Debug, Clone, Error)]
pub enum OrderStoreError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Order {0} already exists")]
    DuplicateOrder(OrderId),
    #[error("Payment intent {0} is already linked to another order")]
    DuplicatePaymentIntent(String),
    #[error("Stored order record could not be read: {0}")]
    CorruptRecord(String),
}
