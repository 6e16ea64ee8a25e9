use chrono::Utc;
use log::*;
use sqlx::{sqlite::SqliteRow, FromRow, QueryBuilder, Row, Sqlite, SqliteConnection};

use crate::{
    db::{
        sqlite::SqliteDatabaseError,
        traits::{AppliedTransition, ConditionalUpdate, StatusTransition},
    },
    db_types::{LineItem, NewOrder, Order, OrderId, OrderStatusType, UserId},
    order_objects::OrderQueryFilter,
};

const ORDER_COLUMNS: &str = "id, order_id, customer_id, restaurant_id, dasher_id, line_items, subtotal, delivery_fee, \
                             dasher_fee, total, status, delivery_address, delivery_instructions, payment_intent_id, \
                             created_at, updated_at, confirmed_at, ready_at, picked_up_at, delivered_at";

impl<'r> FromRow<'r, SqliteRow> for Order {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let status = row
            .try_get::<String, _>("status")?
            .parse::<OrderStatusType>()
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        let line_items = serde_json::from_str::<Vec<LineItem>>(row.try_get("line_items")?)
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        Ok(Order {
            id: row.try_get("id")?,
            order_id: row.try_get("order_id")?,
            customer_id: row.try_get("customer_id")?,
            restaurant_id: row.try_get("restaurant_id")?,
            dasher_id: row.try_get("dasher_id")?,
            line_items,
            subtotal: row.try_get("subtotal")?,
            delivery_fee: row.try_get("delivery_fee")?,
            dasher_fee: row.try_get("dasher_fee")?,
            total: row.try_get("total")?,
            status,
            delivery_address: row.try_get("delivery_address")?,
            delivery_instructions: row.try_get("delivery_instructions")?,
            payment_intent_id: row.try_get("payment_intent_id")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            confirmed_at: row.try_get("confirmed_at")?,
            ready_at: row.try_get("ready_at")?,
            picked_up_at: row.try_get("picked_up_at")?,
            delivered_at: row.try_get("delivered_at")?,
        })
    }
}

/// Inserts a new order in `pending` status and returns the stored record.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, SqliteDatabaseError> {
    let line_items = serde_json::to_string(&order.line_items)?;
    let sql = format!(
        r#"
        INSERT INTO orders (
            order_id,
            customer_id,
            restaurant_id,
            line_items,
            subtotal,
            delivery_fee,
            dasher_fee,
            total,
            status,
            delivery_address,
            delivery_instructions,
            payment_intent_id,
            created_at,
            updated_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'pending', $9, $10, $11, $12, $13)
        RETURNING {ORDER_COLUMNS};
        "#
    );
    let result = sqlx::query_as::<_, Order>(&sql)
        .bind(&order.order_id)
        .bind(&order.customer_id)
        .bind(&order.restaurant_id)
        .bind(line_items)
        .bind(order.price.subtotal)
        .bind(order.price.delivery_fee)
        .bind(order.price.dasher_fee)
        .bind(order.price.total)
        .bind(&order.delivery_address)
        .bind(&order.delivery_instructions)
        .bind(&order.payment_intent_id)
        .bind(order.created_at)
        .bind(order.created_at)
        .fetch_one(conn)
        .await;
    match result {
        Ok(order) => Ok(order),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            if e.message().contains("payment_intent_id") {
                Err(SqliteDatabaseError::DuplicatePaymentIntent(order.payment_intent_id.unwrap_or_default()))
            } else {
                Err(SqliteDatabaseError::DuplicateOrder(order.order_id))
            }
        },
        Err(e) => Err(e.into()),
    }
}

pub async fn fetch_order_by_order_id(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, SqliteDatabaseError> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE order_id = $1");
    let order = sqlx::query_as::<_, Order>(&sql).bind(order_id).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_order_by_payment_intent(
    intent_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, SqliteDatabaseError> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE payment_intent_id = $1");
    let order = sqlx::query_as::<_, Order>(&sql).bind(intent_id).fetch_optional(conn).await?;
    Ok(order)
}

/// Fetches orders according to criteria specified in the `OrderQueryFilter`
///
/// Resulting orders are ordered by `created_at` in ascending order, unless `newest_first` is set on the filter. Ties
/// are broken on the row id, so the ordering is stable.
pub async fn fetch_orders(
    query: OrderQueryFilter,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, SqliteDatabaseError> {
    let mut builder = QueryBuilder::<Sqlite>::new(format!("SELECT {ORDER_COLUMNS} FROM orders "));
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(order_id) = query.order_id {
        where_clause.push("order_id = ");
        where_clause.push_bind_unseparated(order_id.to_string());
    }
    if let Some(customer_id) = query.customer_id {
        where_clause.push("customer_id = ");
        where_clause.push_bind_unseparated(customer_id.to_string());
    }
    if let Some(restaurant_id) = query.restaurant_id {
        where_clause.push("restaurant_id = ");
        where_clause.push_bind_unseparated(restaurant_id.to_string());
    }
    if let Some(dasher_id) = query.dasher_id {
        where_clause.push("dasher_id = ");
        where_clause.push_bind_unseparated(dasher_id.to_string());
    }
    if query.unassigned_only {
        where_clause.push("dasher_id IS NULL");
    }
    if !query.statuses.is_empty() {
        where_clause.push("status IN (");
        for (i, status) in query.statuses.iter().enumerate() {
            if i > 0 {
                where_clause.push_unseparated(", ");
            }
            where_clause.push_bind_unseparated(status.as_str());
        }
        where_clause.push_unseparated(")");
    }
    if let Some(since) = query.since {
        where_clause.push("created_at >= ");
        where_clause.push_bind_unseparated(since);
    }
    if let Some(until) = query.until {
        where_clause.push("created_at < ");
        where_clause.push_bind_unseparated(until);
    }
    if query.newest_first {
        builder.push(" ORDER BY created_at DESC, id DESC");
    } else {
        builder.push(" ORDER BY created_at ASC, id ASC");
    }
    if let Some(limit) = query.limit {
        builder.push(" LIMIT ");
        builder.push_bind(limit);
    }

    trace!("🗃️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as::<Order>().fetch_all(conn).await?;
    trace!("🗃️ Result of fetch_orders: {:?}", orders.len());
    Ok(orders)
}

impl<'r> FromRow<'r, SqliteRow> for AppliedTransition {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let previous_status = row
            .try_get::<String, _>("previous_status")?
            .parse::<OrderStatusType>()
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        Ok(AppliedTransition { order: Order::from_row(row)?, previous_status })
    }
}

/// Moves an order to a new status in a single `UPDATE .. RETURNING` statement. The guard (allowed source statuses
/// and, optionally, the assigned dasher) is part of the `WHERE` clause, so the check and the write cannot be
/// interleaved with another writer.
pub async fn transition_status(
    order_id: &OrderId,
    transition: StatusTransition,
    conn: &mut SqliteConnection,
) -> Result<ConditionalUpdate<AppliedTransition>, SqliteDatabaseError> {
    if transition.from.is_empty() {
        return Ok(ConditionalUpdate::Rejected);
    }
    let now = Utc::now();
    // SQLite evaluates every SET expression against the row as it was before the update
    let mut builder = QueryBuilder::<Sqlite>::new("UPDATE orders SET previous_status = status, status = ");
    builder.push_bind(transition.to.as_str());
    builder.push(", updated_at = ");
    builder.push_bind(now);
    if let Some(field) = transition.to.timestamp_field() {
        builder.push(format!(", {} = ", field.column()));
        builder.push_bind(now);
    }
    if transition.release_dasher {
        builder.push(", dasher_id = NULL");
    }
    builder.push(" WHERE order_id = ");
    builder.push_bind(order_id.to_string());
    builder.push(" AND status IN (");
    let mut statuses = builder.separated(", ");
    for status in &transition.from {
        statuses.push_bind(status.as_str());
    }
    statuses.push_unseparated(")");
    if let Some(dasher) = &transition.assigned_dasher {
        builder.push(" AND dasher_id = ");
        builder.push_bind(dasher.to_string());
    }
    builder.push(format!(" RETURNING {ORDER_COLUMNS}, previous_status"));

    trace!("🗃️ Executing transition: {}", builder.sql());
    let updated = builder.build_query_as::<AppliedTransition>().fetch_optional(conn).await?;
    match updated {
        Some(applied) => {
            debug!("🗃️ Order {order_id} moved from {} to {}", applied.previous_status, applied.order.status);
            Ok(ConditionalUpdate::Applied(applied))
        },
        None => {
            debug!("🗃️ Transition of order {order_id} to {} was rejected by its guard", transition.to);
            Ok(ConditionalUpdate::Rejected)
        },
    }
}

/// Sets `dasher_id` only if it is currently unset and the order is in one of the `allowed` statuses.
pub async fn claim_order(
    order_id: &OrderId,
    dasher: &UserId,
    allowed: &[OrderStatusType],
    conn: &mut SqliteConnection,
) -> Result<ConditionalUpdate, SqliteDatabaseError> {
    if allowed.is_empty() {
        return Ok(ConditionalUpdate::Rejected);
    }
    let mut builder = QueryBuilder::<Sqlite>::new("UPDATE orders SET dasher_id = ");
    builder.push_bind(dasher.to_string());
    builder.push(", updated_at = ");
    builder.push_bind(Utc::now());
    builder.push(" WHERE order_id = ");
    builder.push_bind(order_id.to_string());
    builder.push(" AND dasher_id IS NULL AND status IN (");
    let mut statuses = builder.separated(", ");
    for status in allowed {
        statuses.push_bind(status.as_str());
    }
    statuses.push_unseparated(")");
    builder.push(format!(" RETURNING {ORDER_COLUMNS}"));

    let updated = builder.build_query_as::<Order>().fetch_optional(conn).await?;
    match updated {
        Some(order) => {
            debug!("🗃️ Order {order_id} claimed by dasher {dasher}");
            Ok(ConditionalUpdate::Applied(order))
        },
        None => {
            debug!("🗃️ Claim of order {order_id} by dasher {dasher} was rejected");
            Ok(ConditionalUpdate::Rejected)
        },
    }
}
