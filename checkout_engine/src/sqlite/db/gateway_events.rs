use sqlx::SqliteConnection;

use crate::db_types::OrderId;

/// Records a gateway event id. Returns `false` if the id had already been recorded.
pub async fn record_event(
    event_id: &str,
    order_id: &OrderId,
    kind: &str,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO gateway_events (event_id, order_id, kind) VALUES ($1, $2, $3) ON CONFLICT (event_id) DO NOTHING",
    )
    .bind(event_id)
    .bind(order_id.as_str())
    .bind(kind)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn event_exists(event_id: &str, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM gateway_events WHERE event_id = $1")
        .bind(event_id)
        .fetch_one(conn)
        .await?;
    Ok(count > 0)
}
