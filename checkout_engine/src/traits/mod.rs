//! Seams between the checkout core and the outside world.
//!
//! * [`OrderPaymentDatabase`] is implemented by storage backends (currently only SQLite).
//! * [`PaymentGateway`] is implemented by payment processor integrations. The server implements it for Stripe, and
//!   the test utilities provide a deterministic fake.
mod order_payment_database;
mod payment_gateway;

pub use order_payment_database::{OrderPaymentDatabase, StoreError, TransitionResult};
pub use payment_gateway::{
    GatewayError,
    GatewayEvent,
    GatewayEventKind,
    IntentDetails,
    IntentRequest,
    PaymentGateway,
    PaymentIntent,
};
