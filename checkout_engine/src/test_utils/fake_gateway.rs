use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use serde::{Deserialize, Serialize};

use crate::{
    db_types::{Cents, OrderId},
    traits::{
        GatewayError,
        GatewayEvent,
        GatewayEventKind,
        IntentDetails,
        IntentRequest,
        PaymentGateway,
        PaymentIntent,
    },
};

/// The only signature [`FakeGateway`] accepts.
pub const FAKE_SIGNATURE: &str = "fake-signature";

/// An in-memory payment gateway that behaves like a well-mannered processor: one intent per idempotency key, and
/// webhook bodies in a simple JSON format (see [`FakeEvent`]) that must be "signed" with [`FAKE_SIGNATURE`].
#[derive(Debug, Clone, Default)]
pub struct FakeGateway {
    state: Arc<Mutex<FakeState>>,
}

#[derive(Debug, Default)]
struct FakeState {
    by_key: HashMap<String, String>,
    intents: HashMap<String, PaymentIntent>,
    requests: Vec<IntentRequest>,
    create_calls: usize,
    retrieve_calls: usize,
    unavailable: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FakeEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub intent: Option<FakeIntent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FakeIntent {
    pub intent_id: String,
    pub amount: i64,
    pub currency: String,
    pub order_id: Option<String>,
}

impl FakeGateway {
    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// While set, every intent call fails with [`GatewayError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state().unavailable = unavailable;
    }

    pub fn create_calls(&self) -> usize {
        self.state().create_calls
    }

    pub fn retrieve_calls(&self) -> usize {
        self.state().retrieve_calls
    }

    /// The number of distinct intents that exist, i.e. how many times the customer could be charged.
    pub fn intent_count(&self) -> usize {
        self.state().intents.len()
    }

    pub fn requests(&self) -> Vec<IntentRequest> {
        self.state().requests.clone()
    }

    /// A webhook body for a payment event against `order_id`.
    pub fn event_body(event_id: &str, kind: &str, order_id: Option<&OrderId>, amount: Cents, currency: &str) -> Vec<u8> {
        let event = FakeEvent {
            id: event_id.to_string(),
            kind: kind.to_string(),
            intent: Some(FakeIntent {
                intent_id: format!("pi_for_{}", order_id.map(OrderId::as_str).unwrap_or("nothing")),
                amount: amount.value(),
                currency: currency.to_string(),
                order_id: order_id.map(|id| id.to_string()),
            }),
        };
        serde_json::to_vec(&event).unwrap_or_default()
    }

    pub fn succeeded_body(event_id: &str, order_id: &OrderId, amount: Cents) -> Vec<u8> {
        Self::event_body(event_id, "succeeded", Some(order_id), amount, "usd")
    }

    pub fn failed_body(event_id: &str, order_id: &OrderId, amount: Cents) -> Vec<u8> {
        Self::event_body(event_id, "failed", Some(order_id), amount, "usd")
    }
}

impl PaymentGateway for FakeGateway {
    async fn create_intent(&self, request: IntentRequest) -> Result<PaymentIntent, GatewayError> {
        let mut state = self.state();
        if state.unavailable {
            return Err(GatewayError::Unavailable("The fake gateway is switched off".into()));
        }
        state.create_calls += 1;
        state.requests.push(request.clone());
        if let Some(existing) = state.by_key.get(&request.idempotency_key).and_then(|id| state.intents.get(id)) {
            return Ok(existing.clone());
        }
        let n = state.intents.len() + 1;
        let intent = PaymentIntent {
            intent_id: format!("pi_fake_{n}"),
            client_secret: format!("pi_fake_{n}_secret"),
            amount: request.amount,
            currency: request.currency.clone(),
        };
        state.by_key.insert(request.idempotency_key, intent.intent_id.clone());
        state.intents.insert(intent.intent_id.clone(), intent.clone());
        Ok(intent)
    }

    async fn retrieve_intent(&self, intent_id: &str) -> Result<PaymentIntent, GatewayError> {
        let mut state = self.state();
        if state.unavailable {
            return Err(GatewayError::Unavailable("The fake gateway is switched off".into()));
        }
        state.retrieve_calls += 1;
        state.intents.get(intent_id).cloned().ok_or_else(|| GatewayError::Rejected(format!("No such intent: {intent_id}")))
    }

    fn verify_and_parse_event(&self, raw_body: &[u8], signature: &str) -> Result<GatewayEvent, GatewayError> {
        if signature != FAKE_SIGNATURE {
            return Err(GatewayError::InvalidSignature("Signature does not match".into()));
        }
        let event: FakeEvent =
            serde_json::from_slice(raw_body).map_err(|e| GatewayError::MalformedEvent(e.to_string()))?;
        let kind = match event.kind.as_str() {
            "succeeded" => GatewayEventKind::PaymentSucceeded,
            "failed" => GatewayEventKind::PaymentFailed,
            other => GatewayEventKind::Other(other.to_string()),
        };
        let intent = event.intent.map(|i| IntentDetails {
            intent_id: i.intent_id,
            amount: Cents::from(i.amount),
            currency: i.currency,
            order_id: i.order_id.map(OrderId::from),
        });
        Ok(GatewayEvent { id: event.id, kind, intent })
    }
}
