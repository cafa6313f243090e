use std::{future::Future, pin::Pin, sync::Arc};

use log::*;

use crate::events::{EventHandler, EventProducer, Handler, OrderCancelledEvent, OrderPaidEvent};

type HookFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// The sending halves handed to [`crate::OrderFlowApi`]. Every producer in a list receives each settled order of
/// that kind.
#[derive(Default, Clone)]
pub struct EventProducers {
    pub order_paid_producer: Vec<EventProducer<OrderPaidEvent>>,
    pub order_cancelled_producer: Vec<EventProducer<OrderCancelledEvent>>,
}

/// The receiving halves. Create with [`EventHandlers::new`], take as many sets of [`EventProducers`] as you need, and
/// then hand the handlers to [`EventHandlers::start_handlers`].
pub struct EventHandlers {
    pub on_order_paid: Option<EventHandler<OrderPaidEvent>>,
    pub on_order_cancelled: Option<EventHandler<OrderCancelledEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let EventHooks { on_order_paid, on_order_cancelled } = hooks;
        Self {
            on_order_paid: on_order_paid.map(|f| EventHandler::new(buffer_size, f)),
            on_order_cancelled: on_order_cancelled.map(|f| EventHandler::new(buffer_size, f)),
        }
    }

    pub fn producers(&self) -> EventProducers {
        EventProducers {
            order_paid_producer: self.on_order_paid.iter().map(EventHandler::subscribe).collect(),
            order_cancelled_producer: self.on_order_cancelled.iter().map(EventHandler::subscribe).collect(),
        }
    }

    /// Spawns one task per registered hook. Each task exits once all of its producers have been dropped.
    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_order_paid {
            debug!("📬️ Starting order paid hook");
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_order_cancelled {
            debug!("📬️ Starting order cancelled hook");
            tokio::spawn(handler.start_handler());
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_order_paid: Option<Handler<OrderPaidEvent>>,
    pub on_order_cancelled: Option<Handler<OrderCancelledEvent>>,
}

impl EventHooks {
    pub fn on_order_paid<F>(&mut self, f: F) -> &mut Self
    where F: Fn(OrderPaidEvent) -> HookFuture + Send + Sync + 'static {
        self.on_order_paid = Some(Arc::new(f));
        self
    }

    pub fn on_order_cancelled<F>(&mut self, f: F) -> &mut Self
    where F: Fn(OrderCancelledEvent) -> HookFuture + Send + Sync + 'static {
        self.on_order_cancelled = Some(Arc::new(f));
        self
    }
}
