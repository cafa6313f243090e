//! Checkout Engine
//!
//! The checkout engine keeps a storefront's orders in step with the payments made against them at an external
//! payment processor. It is provider-agnostic: the processor is reached through the [`PaymentGateway`] trait, and
//! storage through the [`OrderPaymentDatabase`] trait.
//!
//! The library is divided into these sections:
//! 1. Storage ([`SqliteDatabase`]). You should never need to access the database directly. Instead, use the public
//!    API. The exception is the data types used in the database. These are defined in the `db_types` module and are
//!    public.
//! 2. The public API. [`OrderFlowApi`] is the sole authority over order and payment state: it creates orders, hands
//!    out payment intents and applies gateway callbacks. [`StatusNotifier`] lets clients wait for the outcome.
//!
//! The engine also emits events when an order is paid or cancelled. A simple hook framework ([`events`]) lets you
//! react to these events with custom actions.
mod checkout_api;
#[cfg(feature = "sqlite")]
mod sqlite;

pub mod db_types;
pub mod events;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use checkout_api::{
    errors::OrderFlowError,
    order_flow_api::OrderFlowApi,
    order_objects,
    status_notifier::{current_status, StatusNotifier, DEFAULT_POLL_INTERVAL},
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use traits::{OrderPaymentDatabase, PaymentGateway, StoreError};
