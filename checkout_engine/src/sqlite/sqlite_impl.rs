//! `SqliteDatabase` is a concrete implementation of a checkout engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements [`OrderPaymentDatabase`].
use std::fmt::Debug;

use log::*;
use sqlx::{migrate, SqliteConnection, SqlitePool};

use super::db::{db_url, gateway_events, new_pool, orders, payments};
use crate::{
    db_types::{Cents, NewOrder, Order, OrderId, OrderItem, Payment, PaymentOutcome},
    traits::{OrderPaymentDatabase, StoreError, TransitionResult},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl OrderPaymentDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_order(&self, order: NewOrder) -> Result<Order, StoreError> {
        let mut tx = self.pool.begin().await?;
        let item_count = order.items.len();
        let order = orders::insert_order(order, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order [{}] with {item_count} items has been saved in the DB", order.order_id);
        Ok(order)
    }

    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_items(&self, order_id: &OrderId) -> Result<Vec<OrderItem>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let items = orders::fetch_order_items(order_id, &mut conn).await?;
        Ok(items)
    }

    async fn fetch_payment_for_order(&self, order_id: &OrderId) -> Result<Option<Payment>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let payment = payments::fetch_payment_for_order(order_id, &mut conn).await?;
        Ok(payment)
    }

    async fn attach_payment_intent(
        &self,
        order_id: &OrderId,
        intent_id: &str,
        amount: Cents,
        currency: &str,
    ) -> Result<Payment, StoreError> {
        let mut tx = self.pool.begin().await?;
        if orders::set_intent_id(order_id, intent_id, &mut tx).await?.is_none() {
            return Err(StoreError::OrderNotFound(order_id.clone()));
        }
        let payment = payments::upsert_intent(order_id, intent_id, amount, currency, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Intent {intent_id} attached to order [{order_id}]");
        Ok(payment)
    }

    /// Takes a settled payment outcome, and in a single atomic transaction,
    /// * checks the order exists and that the amount and currency match it,
    /// * records the gateway event id. If it was already recorded, nothing further is done.
    /// * settles the payment record if it is still pending, creating it if the intent was never requested through us,
    /// * moves the order out of `Pending`.
    async fn apply_payment_outcome(
        &self,
        event_id: &str,
        outcome: &PaymentOutcome,
    ) -> Result<TransitionResult, StoreError> {
        let mut conn = self.pool.acquire().await?;
        // Take the write lock up front. A deferred transaction that reads first cannot always upgrade to a writer when
        // another delivery is doing the same, and fails with SQLITE_BUSY instead of waiting its turn.
        sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;
        let result = settle_outcome(event_id, outcome, &mut conn).await;
        let end = if matches!(result, Ok(TransitionResult::Recorded { .. })) { "COMMIT" } else { "ROLLBACK" };
        if let Err(e) = sqlx::query(end).execute(&mut *conn).await {
            error!("🗃️ {end} failed for gateway event {event_id}. The connection is discarded. {e}");
            drop(conn.detach());
            return Err(e.into());
        }
        if let Ok(TransitionResult::Recorded { order, changed, .. }) = &result {
            let order_id = &order.order_id;
            debug!("🗃️ Gateway event {event_id} applied. Order [{order_id}] is {} (changed: {changed})", order.status);
        }
        result
    }

    async fn gateway_event_exists(&self, event_id: &str) -> Result<bool, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let exists = gateway_events::event_exists(event_id, &mut conn).await?;
        Ok(exists)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the `CHECKOUT_DATABASE_URL` environment variable
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Brings the schema up to date with the migrations embedded in this crate.
    pub async fn run_migrations(&self) -> Result<(), StoreError> {
        migrate!("./src/sqlite/migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::DatabaseError(format!("Migration failed: {e}")))?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&mut self) -> Result<(), sqlx::Error> {
        self.pool.close().await;
        Ok(())
    }
}

/// The body of [`SqliteDatabase::apply_payment_outcome`]. The caller owns the transaction. Only a `Recorded` result
/// may be committed.
async fn settle_outcome(
    event_id: &str,
    outcome: &PaymentOutcome,
    conn: &mut SqliteConnection,
) -> Result<TransitionResult, StoreError> {
    let order_id = &outcome.order_id;
    let Some(order) = orders::fetch_order(order_id, conn).await? else {
        return Ok(TransitionResult::UnknownOrder);
    };
    if order.total != outcome.amount || !order.currency.eq_ignore_ascii_case(&outcome.currency) {
        return Ok(TransitionResult::Mismatch {
            expected: order.total,
            received: outcome.amount,
            currency: outcome.currency.clone(),
        });
    }
    let kind = outcome.payment_status().to_string();
    if !gateway_events::record_event(event_id, order_id, &kind, conn).await? {
        trace!("🗃️ Gateway event {event_id} has already been applied. Rolling back.");
        return Ok(TransitionResult::Duplicate);
    }
    let status = outcome.payment_status();
    let payment = match payments::fetch_payment_for_order(order_id, conn).await? {
        Some(p) if p.status.is_terminal() => p,
        Some(_) => payments::settle_pending_payment(order_id, &outcome.intent_id, status, conn)
            .await?
            .ok_or_else(|| StoreError::DatabaseError(format!("Payment for order {order_id} vanished")))?,
        None => {
            let intent = Some(outcome.intent_id.as_str());
            payments::insert_payment(order_id, intent, status, outcome.amount, &outcome.currency, conn).await?
        },
    };
    let (order, changed) = match orders::transition_pending_order(order_id, outcome.order_status(), conn).await? {
        Some(updated) => (updated, true),
        None => (order, false),
    };
    Ok(TransitionResult::Recorded { order, payment, changed })
}
