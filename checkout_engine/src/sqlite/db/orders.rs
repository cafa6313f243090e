use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewOrder, NewOrderItem, Order, OrderId, OrderItem, OrderStatusType},
    traits::StoreError,
};

/// Inserts a new order and its line items using the given connection. This is not atomic. Embed this call
/// inside a transaction and pass `&mut *tx` as the connection argument.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, StoreError> {
    if fetch_order(&order.order_id, conn).await?.is_some() {
        return Err(StoreError::OrderAlreadyExists(order.order_id));
    }
    let total = order
        .total()
        .ok_or_else(|| StoreError::InvalidOrder(format!("The total of order {} is too large", order.order_id)))?;
    let NewOrder { order_id, customer_id, items, currency, shipping, created_at } = order;
    let inserted: Order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                order_id,
                customer_id,
                total,
                currency,
                full_name,
                email,
                address,
                city,
                zip,
                country,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11)
            RETURNING *;
        "#,
    )
    .bind(order_id.as_str())
    .bind(customer_id)
    .bind(total)
    .bind(currency)
    .bind(shipping.full_name)
    .bind(shipping.email)
    .bind(shipping.address)
    .bind(shipping.city)
    .bind(shipping.zip)
    .bind(shipping.country)
    .bind(created_at)
    .fetch_one(&mut *conn)
    .await?;
    for item in items {
        insert_order_item(&inserted.order_id, item, conn).await?;
    }
    debug!("📝️ Order [{}] inserted with total {}", inserted.order_id, inserted.total);
    Ok(inserted)
}

async fn insert_order_item(
    order_id: &OrderId,
    item: NewOrderItem,
    conn: &mut SqliteConnection,
) -> Result<OrderItem, StoreError> {
    let item = sqlx::query_as(
        "INSERT INTO order_items (order_id, product_id, quantity, unit_price) VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(order_id.as_str())
    .bind(item.product_id)
    .bind(item.quantity)
    .bind(item.unit_price)
    .fetch_one(conn)
    .await?;
    Ok(item)
}

pub async fn fetch_order(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order =
        sqlx::query_as("SELECT * FROM orders WHERE order_id = $1").bind(order_id.as_str()).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_order_items(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<Vec<OrderItem>, sqlx::Error> {
    let items = sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 ORDER BY id")
        .bind(order_id.as_str())
        .fetch_all(conn)
        .await?;
    Ok(items)
}

/// Stores the processor intent id on the order. Returns `None` if the order does not exist.
pub async fn set_intent_id(
    order_id: &OrderId,
    intent_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as(
        "UPDATE orders SET intent_id = $1, updated_at = CURRENT_TIMESTAMP WHERE order_id = $2 RETURNING *",
    )
    .bind(intent_id)
    .bind(order_id.as_str())
    .fetch_optional(conn)
    .await?;
    Ok(order)
}

/// Moves a `Pending` order to `new_status`.
///
/// The update is conditional on the current status, so it is a no-op (returning `None`) for orders that are already
/// `Paid` or `Cancelled`.
pub async fn transition_pending_order(
    order_id: &OrderId,
    new_status: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order: Option<Order> = sqlx::query_as(
        r#"
        UPDATE orders SET status = $1, updated_at = CURRENT_TIMESTAMP
        WHERE order_id = $2 AND status = 'Pending'
        RETURNING *
        "#,
    )
    .bind(new_status)
    .bind(order_id.as_str())
    .fetch_optional(conn)
    .await?;
    trace!("📝️ Order [{order_id}] transition to {new_status}: {}", if order.is_some() { "done" } else { "skipped" });
    Ok(order)
}
