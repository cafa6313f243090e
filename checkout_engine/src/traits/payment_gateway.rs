use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db_types::{Cents, OrderId};

/// What the order flow needs from a payment processor.
#[allow(async_fn_in_trait)]
pub trait PaymentGateway {
    /// Creates a chargeable intent. Calls with the same `idempotency_key` must return the same intent.
    async fn create_intent(&self, request: IntentRequest) -> Result<PaymentIntent, GatewayError>;

    async fn retrieve_intent(&self, intent_id: &str) -> Result<PaymentIntent, GatewayError>;

    /// Authenticates a webhook callback against the untouched request body and parses it.
    ///
    /// A bad signature must return [`GatewayError::InvalidSignature`]. A correctly signed body that cannot be parsed
    /// returns [`GatewayError::MalformedEvent`].
    fn verify_and_parse_event(&self, raw_body: &[u8], signature: &str) -> Result<GatewayEvent, GatewayError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentRequest {
    pub order_id: OrderId,
    pub amount: Cents,
    pub currency: String,
    pub user_email: String,
    pub idempotency_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub intent_id: String,
    pub client_secret: String,
    pub amount: Cents,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayEventKind {
    PaymentSucceeded,
    PaymentFailed,
    Other(String),
}

/// The intent carried by a payment event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentDetails {
    pub intent_id: String,
    pub amount: Cents,
    pub currency: String,
    /// The `order_id` metadata attached when the intent was created, if present.
    pub order_id: Option<OrderId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayEvent {
    pub id: String,
    pub kind: GatewayEventKind,
    /// Present for payment events. `None` for event kinds we don't handle.
    pub intent: Option<IntentDetails>,
}

#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("Webhook signature is invalid. {0}")]
    InvalidSignature(String),
    #[error("Webhook payload could not be interpreted. {0}")]
    MalformedEvent(String),
    #[error("The payment processor is unavailable. {0}")]
    Unavailable(String),
    #[error("The payment processor rejected the request. {0}")]
    Rejected(String),
}
