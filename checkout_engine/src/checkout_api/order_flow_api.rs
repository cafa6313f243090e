use std::fmt::Debug;

use log::*;

use crate::{
    checkout_api::{
        errors::OrderFlowError,
        order_objects::{EventOutcome, FullOrder, PaymentIntentResponse},
        status_notifier::current_status,
    },
    db_types::{NewOrder, Order, OrderId, OrderStatusType, Payment, PaymentOutcome},
    events::{EventProducers, OrderCancelledEvent, OrderPaidEvent, OrderPaymentStatus, StatusFeed},
    traits::{
        GatewayError,
        GatewayEvent,
        GatewayEventKind,
        IntentDetails,
        IntentRequest,
        OrderPaymentDatabase,
        PaymentGateway,
        TransitionResult,
    },
};

/// `OrderFlowApi` is the only component allowed to move an order and its payment record between states.
///
/// Intents are requested through it, and every gateway callback (or simulated payment) is applied through it.
/// Committed transitions are published to the [`StatusFeed`] and to the order hooks.
pub struct OrderFlowApi<B, G> {
    db: B,
    gateway: G,
    producers: EventProducers,
    feed: StatusFeed,
}

impl<B, G> Debug for OrderFlowApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B, G> OrderFlowApi<B, G> {
    pub fn new(db: B, gateway: G, producers: EventProducers, feed: StatusFeed) -> Self {
        Self { db, gateway, producers, feed }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn status_feed(&self) -> &StatusFeed {
        &self.feed
    }
}

impl<B, G> OrderFlowApi<B, G>
where
    B: OrderPaymentDatabase,
    G: PaymentGateway,
{
    /// Stores a new order from a finalized cart. The order starts out `Pending`, with its total fixed at the sum of
    /// the line items.
    pub async fn create_order(&self, order: NewOrder) -> Result<Order, OrderFlowError> {
        order.validate().map_err(OrderFlowError::InvalidOrder)?;
        let order = self.db.insert_order(order).await?;
        info!("🔄️📦️ Order [{}] created for {}. Total {} {}", order.order_id, order.customer_id, order.total, order.currency);
        Ok(order)
    }

    /// Fetches an order with its items and payment record. Only the order's owner may see it.
    pub async fn fetch_order(&self, order_id: &OrderId, requester: &str) -> Result<FullOrder, OrderFlowError> {
        let order = self.owned_order(order_id, requester).await?;
        let items = self.db.fetch_order_items(order_id).await?;
        let payment = self.db.fetch_payment_for_order(order_id).await?;
        Ok(FullOrder { order, items, payment })
    }

    /// Returns a payment intent the requester can use to pay for their pending order.
    ///
    /// Intents are created with the idempotency key `order-<order id>`. If the order already has an intent, that
    /// intent is fetched from the gateway instead, so repeated calls never produce a second chargeable intent.
    /// Gateway failures are returned to the caller without retrying.
    pub async fn request_payment_intent(
        &self,
        order_id: &OrderId,
        requester: &str,
    ) -> Result<PaymentIntentResponse, OrderFlowError> {
        let order = self.owned_order(order_id, requester).await?;
        if order.status != OrderStatusType::Pending {
            debug!("🔄️💳️ Intent requested for order [{order_id}], but it is already {}", order.status);
            return Err(OrderFlowError::OrderAlreadyProcessed(order_id.clone(), order.status));
        }
        let existing = self
            .db
            .fetch_payment_for_order(order_id)
            .await?
            .and_then(|p| p.intent_id)
            .or_else(|| order.intent_id.clone());
        let intent = match existing {
            Some(intent_id) => {
                debug!("🔄️💳️ Order [{order_id}] already has intent {intent_id}. Fetching it.");
                self.gateway.retrieve_intent(&intent_id).await?
            },
            None => {
                let request = IntentRequest {
                    order_id: order_id.clone(),
                    amount: order.total,
                    currency: order.currency.clone(),
                    user_email: order.customer_id.clone(),
                    idempotency_key: order_id.idempotency_key(),
                };
                self.gateway.create_intent(request).await?
            },
        };
        if intent.amount != order.total {
            error!(
                "🔄️💳️ Intent {} is for {}, but order [{order_id}] totals {}. Refusing to hand it out.",
                intent.intent_id, intent.amount, order.total
            );
            return Err(GatewayError::Rejected(format!("Intent {} does not match the order total", intent.intent_id))
                .into());
        }
        self.db.attach_payment_intent(order_id, &intent.intent_id, order.total, &order.currency).await?;
        info!("🔄️💳️ Intent {} issued for order [{order_id}]", intent.intent_id);
        Ok(PaymentIntentResponse {
            order_id: order_id.clone(),
            intent_id: intent.intent_id,
            client_secret: intent.client_secret,
            amount: order.total,
            currency: order.currency,
        })
    }

    /// Authenticates and applies a raw gateway callback.
    ///
    /// Only an invalid signature or a database failure produce an error. Everything else, including duplicates and
    /// events we can't use, is reported as an [`EventOutcome`] so that the caller acknowledges it.
    pub async fn process_gateway_event(&self, raw_body: &[u8], signature: &str) -> Result<EventOutcome, OrderFlowError> {
        let event = match self.gateway.verify_and_parse_event(raw_body, signature) {
            Ok(event) => event,
            Err(GatewayError::MalformedEvent(reason)) => {
                warn!("🔄️🪝️ Correctly signed gateway event could not be parsed. {reason}");
                return Ok(EventOutcome::Malformed { event_id: None, reason });
            },
            Err(e) => {
                warn!("🔄️🪝️ Rejecting gateway event. {e}");
                return Err(e.into());
            },
        };
        self.apply_event(event).await
    }

    /// Applies an authenticated gateway event. Each event id is applied at most once.
    pub async fn apply_event(&self, event: GatewayEvent) -> Result<EventOutcome, OrderFlowError> {
        let GatewayEvent { id: event_id, kind, intent } = event;
        if self.db.gateway_event_exists(&event_id).await? {
            debug!("🔄️🪝️ Gateway event {event_id} has already been applied");
            return Ok(EventOutcome::Duplicate { event_id });
        }
        let succeeded = match kind {
            GatewayEventKind::PaymentSucceeded => true,
            GatewayEventKind::PaymentFailed => false,
            GatewayEventKind::Other(kind) => {
                debug!("🔄️🪝️ Ignoring {kind} event {event_id}");
                return Ok(EventOutcome::Ignored { event_id, kind });
            },
        };
        let Some(IntentDetails { intent_id, amount, currency, order_id }) = intent else {
            warn!("🔄️🪝️ Payment event {event_id} carries no payment intent");
            let reason = "Payment event carries no payment intent".to_string();
            return Ok(EventOutcome::Malformed { event_id: Some(event_id), reason });
        };
        let Some(order_id) = order_id else {
            warn!("🔄️🪝️ Intent {intent_id} in event {event_id} has no order_id metadata. It cannot be matched.");
            let reason = format!("Intent {intent_id} has no order_id metadata");
            return Ok(EventOutcome::Malformed { event_id: Some(event_id), reason });
        };
        let outcome = PaymentOutcome { order_id: order_id.clone(), intent_id, amount, currency, succeeded };
        match self.db.apply_payment_outcome(&event_id, &outcome).await? {
            TransitionResult::Duplicate => {
                debug!("🔄️🪝️ Gateway event {event_id} was applied concurrently");
                Ok(EventOutcome::Duplicate { event_id })
            },
            TransitionResult::UnknownOrder => {
                warn!("🔄️🪝️ Gateway event {event_id} refers to order [{order_id}], which does not exist");
                Ok(EventOutcome::UnknownOrder { event_id, order_id })
            },
            TransitionResult::Mismatch { expected, received, currency } => {
                error!(
                    "🔄️🪝️ Gateway event {event_id} reports {received} {currency} for order [{order_id}], which \
                     totals {expected}. The event is not applied."
                );
                let reason = format!("Expected {expected}, but the event reports {received} {currency}");
                Ok(EventOutcome::Malformed { event_id: Some(event_id), reason })
            },
            TransitionResult::Recorded { order, payment, changed } => {
                let status = OrderPaymentStatus::new(order.order_id.clone(), order.status, payment.status);
                if !changed {
                    info!("🔄️🪝️ Order [{order_id}] was already {}. Event {event_id} recorded without change.", order.status);
                    return Ok(EventOutcome::NoTransition(status));
                }
                info!("🔄️🪝️ Order [{order_id}] is now {} (payment {})", order.status, payment.status);
                self.feed.publish(status.clone());
                self.call_transition_hooks(order, payment).await;
                Ok(EventOutcome::Applied(status))
            },
        }
    }

    /// Marks an order as paid without a payment processor, through the same path as a real callback.
    /// Only signature verification is skipped. Callers must restrict this to development deployments.
    pub async fn simulate_payment(&self, order_id: &OrderId) -> Result<EventOutcome, OrderFlowError> {
        let order =
            self.db.fetch_order(order_id).await?.ok_or_else(|| OrderFlowError::OrderNotFound(order_id.clone()))?;
        warn!("🔄️🧪️ Simulating a successful payment for order [{order_id}]");
        let event = GatewayEvent {
            id: format!("sim-{order_id}"),
            kind: GatewayEventKind::PaymentSucceeded,
            intent: Some(IntentDetails {
                intent_id: order.intent_id.clone().unwrap_or_else(|| format!("sim_pi_{order_id}")),
                amount: order.total,
                currency: order.currency.clone(),
                order_id: Some(order_id.clone()),
            }),
        };
        self.apply_event(event).await
    }

    /// The current order and payment status. This never calls the gateway.
    pub async fn get_status(&self, order_id: &OrderId) -> Result<OrderPaymentStatus, OrderFlowError> {
        current_status(&self.db, order_id).await
    }

    async fn owned_order(&self, order_id: &OrderId, requester: &str) -> Result<Order, OrderFlowError> {
        let order =
            self.db.fetch_order(order_id).await?.ok_or_else(|| OrderFlowError::OrderNotFound(order_id.clone()))?;
        if !order.is_owned_by(requester) {
            warn!("🔄️🔐️ {requester} tried to access order [{order_id}], which belongs to someone else");
            return Err(OrderFlowError::Unauthorized(order_id.clone()));
        }
        Ok(order)
    }

    async fn call_transition_hooks(&self, order: Order, payment: Payment) {
        match order.status {
            OrderStatusType::Paid => {
                for emitter in &self.producers.order_paid_producer {
                    debug!("🔄️📦️ Notifying order paid hook subscribers");
                    emitter.publish_event(OrderPaidEvent::new(order.clone(), payment.clone())).await;
                }
            },
            OrderStatusType::Cancelled => {
                for emitter in &self.producers.order_cancelled_producer {
                    debug!("🔄️📦️ Notifying order cancelled hook subscribers");
                    emitter.publish_event(OrderCancelledEvent::new(order.clone(), payment.clone())).await;
                }
            },
            OrderStatusType::Pending => {},
        }
    }
}
