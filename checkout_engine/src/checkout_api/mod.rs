//! # Checkout engine public API
//!
//! * [`order_flow_api`] owns every order and payment state change: order creation, payment intents, and gateway
//!   callbacks.
//! * [`status_notifier`] lets clients wait for an order's payment to settle.
//!
//! An API instance is created by supplying a database backend, and for the order flow, a payment gateway:
//!
//! ```rust,ignore
//! use checkout_engine::{events::{EventProducers, StatusFeed}, OrderFlowApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! let feed = StatusFeed::default();
//! let api = OrderFlowApi::new(db.clone(), my_gateway, EventProducers::default(), feed.clone());
//! let intent = api.request_payment_intent(&order_id, "alice@example.com").await?;
//! ```
pub mod errors;
pub mod order_flow_api;
pub mod order_objects;
pub mod status_notifier;
