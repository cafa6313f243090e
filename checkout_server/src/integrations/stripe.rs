//! Stripe as the checkout engine's payment gateway.
//!
//! Intents are created with the order's idempotency key and tagged with `order_id` and `user_email` metadata.
//! Webhooks are authenticated with the endpoint's signing secret before anything in the body is trusted. Only
//! `payment_intent.succeeded` and `payment_intent.payment_failed` are acted on; every other event type is passed to
//! the engine as [`GatewayEventKind::Other`].
use checkout_engine::{
    db_types::OrderId,
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
use log::*;
use stripe_tools::{
    NewPaymentIntent,
    StripeApi,
    StripeApiError,
    StripeConfig,
    StripeEvent,
    StripePaymentIntent,
    WebhookVerifier,
};

pub const PAYMENT_SUCCEEDED: &str = "payment_intent.succeeded";
pub const PAYMENT_FAILED: &str = "payment_intent.payment_failed";

#[derive(Clone)]
pub struct StripeGateway {
    api: StripeApi,
    verifier: WebhookVerifier,
}

impl StripeGateway {
    pub fn new(config: StripeConfig) -> Result<Self, StripeApiError> {
        let api = StripeApi::new(config)?;
        let verifier = api.webhook_verifier();
        Ok(Self { api, verifier })
    }
}

impl PaymentGateway for StripeGateway {
    async fn create_intent(&self, request: IntentRequest) -> Result<PaymentIntent, GatewayError> {
        let IntentRequest { order_id, amount, currency, user_email, idempotency_key } = request;
        let params = NewPaymentIntent::new(amount, currency, idempotency_key)
            .with_metadata("order_id", order_id.as_str())
            .with_metadata("user_email", user_email);
        let intent = self.api.create_payment_intent(&params).await.map_err(to_gateway_error)?;
        to_payment_intent(intent)
    }

    async fn retrieve_intent(&self, intent_id: &str) -> Result<PaymentIntent, GatewayError> {
        let intent = self.api.retrieve_payment_intent(intent_id).await.map_err(to_gateway_error)?;
        to_payment_intent(intent)
    }

    fn verify_and_parse_event(&self, raw_body: &[u8], signature: &str) -> Result<GatewayEvent, GatewayError> {
        let event = self.verifier.construct_event(raw_body, signature).map_err(to_gateway_error)?;
        Ok(gateway_event(event))
    }
}

fn gateway_event(event: StripeEvent) -> GatewayEvent {
    let kind = match event.event_type.as_str() {
        PAYMENT_SUCCEEDED => GatewayEventKind::PaymentSucceeded,
        PAYMENT_FAILED => GatewayEventKind::PaymentFailed,
        other => return GatewayEvent { id: event.id, kind: GatewayEventKind::Other(other.to_string()), intent: None },
    };
    // A payment event without a readable intent is handed on without one. The engine logs and acknowledges it.
    let intent = match event.payment_intent() {
        Ok(pi) => Some(intent_details(pi)),
        Err(e) => {
            warn!("💳️ Event {} ({}) does not contain a usable payment intent. {e}", event.id, event.event_type);
            None
        },
    };
    GatewayEvent { id: event.id, kind, intent }
}

fn intent_details(pi: StripePaymentIntent) -> IntentDetails {
    let order_id = pi.metadata_value("order_id").or_else(|| pi.metadata_value("orderId")).map(OrderId::from);
    IntentDetails { amount: pi.amount(), currency: pi.currency, order_id, intent_id: pi.id }
}

fn to_payment_intent(pi: StripePaymentIntent) -> Result<PaymentIntent, GatewayError> {
    let amount = pi.amount();
    let client_secret = pi
        .client_secret
        .filter(|s| !s.is_empty())
        .ok_or_else(|| GatewayError::Rejected(format!("Intent {} was returned without a client secret", pi.id)))?;
    Ok(PaymentIntent { intent_id: pi.id, client_secret, amount, currency: pi.currency })
}

fn to_gateway_error(e: StripeApiError) -> GatewayError {
    if e.is_transient() {
        return GatewayError::Unavailable(e.to_string());
    }
    match e {
        StripeApiError::MalformedSignatureHeader(_)
        | StripeApiError::StaleTimestamp { .. }
        | StripeApiError::SignatureMismatch => GatewayError::InvalidSignature(e.to_string()),
        StripeApiError::InvalidPayload(_) => GatewayError::MalformedEvent(e.to_string()),
        StripeApiError::Initialization(_) => GatewayError::Unavailable(e.to_string()),
        e => GatewayError::Rejected(e.to_string()),
    }
}
