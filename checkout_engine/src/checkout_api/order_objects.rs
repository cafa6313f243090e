use std::fmt::Display;

use serde::Serialize;

use crate::{
    db_types::{Cents, Order, OrderId, OrderItem, Payment},
    events::OrderPaymentStatus,
};

/// An order together with its line items and its payment record, if one exists yet.
#[derive(Debug, Clone, Serialize)]
pub struct FullOrder {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub payment: Option<Payment>,
}

/// What a client needs to complete a payment against the processor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentIntentResponse {
    pub order_id: OrderId,
    pub intent_id: String,
    pub client_secret: String,
    pub amount: Cents,
    pub currency: String,
}

/// How an inbound gateway event was handled. Every variant is acknowledged to the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    /// The event moved the order (and its payment) into a final state.
    Applied(OrderPaymentStatus),
    /// The event id had already been applied.
    Duplicate { event_id: String },
    /// The event was recorded, but the order had already left `Pending`.
    NoTransition(OrderPaymentStatus),
    /// An event kind we don't act on.
    Ignored { event_id: String, kind: String },
    /// The event could not be matched to an order safely. Nothing was written.
    Malformed { event_id: Option<String>, reason: String },
    /// The event refers to an order we don't know about. Nothing was written.
    UnknownOrder { event_id: String, order_id: OrderId },
}

impl EventOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }
}

impl Display for EventOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Applied(s) => write!(f, "applied: order {} is {}", s.order_id, s.order_status),
            Self::Duplicate { event_id } => write!(f, "duplicate event {event_id}"),
            Self::NoTransition(s) => write!(f, "no transition: order {} was already {}", s.order_id, s.order_status),
            Self::Ignored { event_id, kind } => write!(f, "ignored {kind} event {event_id}"),
            Self::Malformed { event_id, reason } => {
                write!(f, "malformed event {}: {reason}", event_id.as_deref().unwrap_or("(unknown id)"))
            },
            Self::UnknownOrder { event_id, order_id } => write!(f, "event {event_id} refers to unknown order {order_id}"),
        }
    }
}
