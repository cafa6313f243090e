use thiserror::Error;

use crate::db_types::{Cents, NewOrder, Order, OrderId, OrderItem, Payment, PaymentOutcome};

/// The result of applying a settled payment outcome to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionResult {
    /// The gateway event id has been applied before. Nothing was written.
    Duplicate,
    /// No order matches the outcome's order id. Nothing was written.
    UnknownOrder,
    /// The outcome does not match the order's total or currency. Nothing was written.
    Mismatch { expected: Cents, received: Cents, currency: String },
    /// The outcome was recorded. `changed` is false when the order had already left `Pending`.
    Recorded { order: Order, payment: Payment, changed: bool },
}

/// The storage behaviour required by the order flow.
///
/// All methods that write more than one row do so atomically.
#[allow(async_fn_in_trait)]
pub trait OrderPaymentDatabase: Clone {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Stores a new order and its line items in a single transaction, with status `Pending`.
    async fn insert_order(&self, order: NewOrder) -> Result<Order, StoreError>;

    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, StoreError>;

    async fn fetch_order_items(&self, order_id: &OrderId) -> Result<Vec<OrderItem>, StoreError>;

    async fn fetch_payment_for_order(&self, order_id: &OrderId) -> Result<Option<Payment>, StoreError>;

    /// Links a processor intent to an order. In one transaction, the intent id is written to the order, and the
    /// order's payment record is created (status `Pending`) or, if it already exists, given the intent id.
    async fn attach_payment_intent(
        &self,
        order_id: &OrderId,
        intent_id: &str,
        amount: Cents,
        currency: &str,
    ) -> Result<Payment, StoreError>;

    /// Applies a settled payment outcome exactly once per `event_id`.
    ///
    /// In one transaction: the event id is recorded, the payment record is upserted with the outcome's status (only
    /// if it is still `Pending`), and the order moves to `Paid` or `Cancelled` only if it is still `Pending`.
    /// If the event id has been seen, the order is unknown, or the amounts disagree, the transaction is rolled back.
    async fn apply_payment_outcome(
        &self,
        event_id: &str,
        outcome: &PaymentOutcome,
    ) -> Result<TransitionResult, StoreError>;

    /// True if the gateway event id has already been applied.
    async fn gateway_event_exists(&self, event_id: &str) -> Result<bool, StoreError>;
}

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("Cannot insert order, since it already exists with id {0}")]
    OrderAlreadyExists(OrderId),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Cannot insert order. {0}")]
    InvalidOrder(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::DatabaseError(e.to_string())
    }
}
