use checkout_engine::events::{EventHandlers, EventHooks, OrderCancelledEvent, OrderPaidEvent};
use log::*;

pub const ORDER_EVENT_BUFFER_SIZE: usize = 25;

/// Hooks that write an operator log line for every order that settles. They run on their own tasks and never hold up
/// a webhook acknowledgment.
pub fn create_order_log_handlers() -> EventHandlers {
    let mut hooks = EventHooks::default();
    hooks.on_order_paid(|ev: OrderPaidEvent| {
        Box::pin(async move {
            let OrderPaidEvent { order, payment } = ev;
            info!(
                "🧾️ Order [{}] PAID. {} {} from {} (intent {}). Ship to {}, {}",
                order.order_id,
                order.total,
                order.currency.to_uppercase(),
                order.customer_id,
                payment.intent_id.as_deref().unwrap_or("none"),
                order.shipping.full_name,
                order.shipping.country
            );
        })
    });
    hooks.on_order_cancelled(|ev: OrderCancelledEvent| {
        Box::pin(async move {
            let OrderCancelledEvent { order, payment } = ev;
            warn!(
                "🧾️ Order [{}] CANCELLED. The payment of {} {} by {} failed (intent {}).",
                order.order_id,
                order.total,
                order.currency.to_uppercase(),
                order.customer_id,
                payment.intent_id.as_deref().unwrap_or("none")
            );
        })
    });
    EventHandlers::new(ORDER_EVENT_BUFFER_SIZE, hooks)
}
