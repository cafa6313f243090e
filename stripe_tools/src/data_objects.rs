use std::collections::HashMap;

use checkout_common::Cents;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::StripeApiError;

/// The subset of a Stripe PaymentIntent object that the checkout flow uses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StripePaymentIntent {
    pub id: String,
    /// Amount in the currency's minor unit.
    pub amount: i64,
    pub currency: String,
    pub status: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl StripePaymentIntent {
    pub fn amount(&self) -> Cents {
        Cents::from(self.amount)
    }

    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str).filter(|s| !s.is_empty())
    }
}

/// Parameters for `POST /v1/payment_intents`.
#[derive(Debug, Clone)]
pub struct NewPaymentIntent {
    pub amount: Cents,
    pub currency: String,
    pub metadata: Vec<(String, String)>,
    /// Sent as the `Idempotency-Key` header. Stripe returns the original intent for a repeated key.
    pub idempotency_key: String,
}

impl NewPaymentIntent {
    pub fn new<S: Into<String>>(amount: Cents, currency: S, idempotency_key: S) -> Self {
        Self { amount, currency: currency.into(), metadata: Vec::new(), idempotency_key: idempotency_key.into() }
    }

    pub fn with_metadata<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.metadata.push((key.into(), value.into()));
        self
    }

    /// Stripe's form encoding, with nested metadata keys written as `metadata[key]`.
    pub fn form_params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("amount".to_string(), self.amount.value().to_string()),
            ("currency".to_string(), self.currency.to_lowercase()),
            ("automatic_payment_methods[enabled]".to_string(), "true".to_string()),
        ];
        for (k, v) in &self.metadata {
            params.push((format!("metadata[{k}]"), v.clone()));
        }
        params
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripeEventData {
    pub object: Value,
}

/// A webhook event envelope. Only `payment_intent.*` events carry an intent in `data.object`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripeEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub created: i64,
    pub data: StripeEventData,
}

impl StripeEvent {
    pub fn payment_intent(&self) -> Result<StripePaymentIntent, StripeApiError> {
        serde_json::from_value(self.data.object.clone()).map_err(|e| StripeApiError::InvalidPayload(e.to_string()))
    }
}
