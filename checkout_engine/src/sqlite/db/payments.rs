use log::trace;
use sqlx::SqliteConnection;

use crate::db_types::{Cents, OrderId, Payment, PaymentStatus};

pub async fn fetch_payment_for_order(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, sqlx::Error> {
    let payment = sqlx::query_as("SELECT * FROM payments WHERE order_id = $1")
        .bind(order_id.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(payment)
}

pub async fn insert_payment(
    order_id: &OrderId,
    intent_id: Option<&str>,
    status: PaymentStatus,
    amount: Cents,
    currency: &str,
    conn: &mut SqliteConnection,
) -> Result<Payment, sqlx::Error> {
    let payment = sqlx::query_as(
        r#"
        INSERT INTO payments (order_id, intent_id, status, amount, currency)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(order_id.as_str())
    .bind(intent_id)
    .bind(status)
    .bind(amount)
    .bind(currency)
    .fetch_one(conn)
    .await?;
    trace!("💰️ Payment record created for order [{order_id}] with status {status}");
    Ok(payment)
}

/// Creates the payment record for an order if there isn't one, or sets the intent id on the existing record.
/// The status of an existing record is left alone.
pub async fn upsert_intent(
    order_id: &OrderId,
    intent_id: &str,
    amount: Cents,
    currency: &str,
    conn: &mut SqliteConnection,
) -> Result<Payment, sqlx::Error> {
    let payment = sqlx::query_as(
        r#"
        INSERT INTO payments (order_id, intent_id, status, amount, currency)
        VALUES ($1, $2, 'Pending', $3, $4)
        ON CONFLICT (order_id) DO UPDATE SET intent_id = excluded.intent_id, updated_at = CURRENT_TIMESTAMP
        RETURNING *
        "#,
    )
    .bind(order_id.as_str())
    .bind(intent_id)
    .bind(amount)
    .bind(currency)
    .fetch_one(conn)
    .await?;
    Ok(payment)
}

/// Settles a `Pending` payment record. Returns `None` if the record is missing or already settled.
pub async fn settle_pending_payment(
    order_id: &OrderId,
    intent_id: &str,
    status: PaymentStatus,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, sqlx::Error> {
    let payment = sqlx::query_as(
        r#"
        UPDATE payments SET status = $1, intent_id = COALESCE(intent_id, $2), updated_at = CURRENT_TIMESTAMP
        WHERE order_id = $3 AND status = 'Pending'
        RETURNING *
        "#,
    )
    .bind(status)
    .bind(intent_id)
    .bind(order_id.as_str())
    .fetch_optional(conn)
    .await?;
    Ok(payment)
}
