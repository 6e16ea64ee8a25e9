use super::{AppliedTransition, ConditionalUpdate, OrderStoreError, StatusTransition};
use crate::{
    db_types::{NewOrder, Order, OrderId, OrderStatusType, UserId},
    order_objects::OrderQueryFilter,
};

/// The storage contract for orders.
///
/// Implementations must guarantee that [`OrderStore::transition_status`] and [`OrderStore::claim_order`] are
/// evaluated and applied as one atomic step. Checking the guard and then writing in a separate statement is not
/// acceptable, since concurrent callers would both pass the check.
#[allow(async_fn_in_trait)]
pub trait OrderStore: Clone {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Stores a brand-new order in `pending` status.
    ///
    /// Fails with [`OrderStoreError::DuplicateOrder`] if the order id is taken, or
    /// [`OrderStoreError::DuplicatePaymentIntent`] if the payment intent is already linked to another order.
    async fn insert_order(&self, order: NewOrder) -> Result<Order, OrderStoreError>;

    async fn fetch_order_by_order_id(&self, order_id: &OrderId) -> Result<Option<Order>, OrderStoreError>;

    async fn fetch_order_by_payment_intent(&self, intent_id: &str) -> Result<Option<Order>, OrderStoreError>;

    /// Returns all orders matching the filter. Ordering is oldest first unless the filter asks otherwise.
    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderStoreError>;

    /// Applies a guarded status change.
    ///
    /// Sets `updated_at`, and the lifecycle timestamp that belongs to the target status, in the same write. The
    /// status the order held just before the write is reported alongside the updated order.
    async fn transition_status(
        &self,
        order_id: &OrderId,
        transition: StatusTransition,
    ) -> Result<ConditionalUpdate<AppliedTransition>, OrderStoreError>;

    /// Assigns `dasher` to the order if, and only if, no dasher is assigned yet and the order's status is one of
    /// `allowed`. Among any number of concurrent callers, at most one is applied.
    async fn claim_order(
        &self,
        order_id: &OrderId,
        dasher: &UserId,
        allowed: &[OrderStatusType],
    ) -> Result<ConditionalUpdate, OrderStoreError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), OrderStoreError> {
        Ok(())
    }
}
