//! # Checkout server
//! The HTTP front end for the checkout engine. It is responsible for:
//! * Accepting finalized carts from authenticated customers and turning them into pending orders.
//! * Handing out Stripe payment intents for those orders.
//! * Receiving Stripe webhooks and applying them to orders, exactly once each.
//! * Streaming order status to clients that are waiting for a payment to settle.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `GET /health`: A health check route that returns a 200 OK response.
//! * `POST /api/orders`: Create an order from a cart.
//! * `GET /api/orders/{order_id}`: Fetch one of your orders.
//! * `POST /api/orders/{order_id}/payment_intent`: Get the payment intent for one of your pending orders.
//! * `GET /api/orders/{order_id}/status`: A Server-Sent Events stream of the order's payment status.
//! * `POST /webhook/stripe`: Stripe event callbacks.
//! * `POST /dev/simulate_payment`: Development mode only. Marks an order as paid.

pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod integrations;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
