use thiserror::Error;

use crate::{db::traits::OrderStoreError, db_types::OrderId};

#[derive(Debug, Error)]
pub enum SqliteDatabaseError {
    #[error("Database connection error: {0}")]
    DriverError(#[from] sqlx::Error),
    #[error("Database migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),
    #[error("Cannot insert duplicate order {0}")]
    DuplicateOrder(OrderId),
    #[error("Payment intent {0} is already linked to an order")]
    DuplicatePaymentIntent(String),
    #[error("Could not serialize line items: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl From<SqliteDatabaseError> for OrderStoreError {
    fn from(e: SqliteDatabaseError) -> Self {
        match e {
            SqliteDatabaseError::DuplicateOrder(id) => OrderStoreError::DuplicateOrder(id),
            SqliteDatabaseError::DuplicatePaymentIntent(id) => OrderStoreError::DuplicatePaymentIntent(id),
            SqliteDatabaseError::DriverError(sqlx::Error::ColumnDecode { index, source }) => {
                OrderStoreError::CorruptRecord(format!("column {index}: {source}"))
            },
            SqliteDatabaseError::DriverError(sqlx::Error::Decode(e)) => OrderStoreError::CorruptRecord(e.to_string()),
            e => OrderStoreError::DatabaseError(e.to_string()),
        }
    }
}
