mod api;
mod config;
mod error;

mod data_objects;
mod webhook;

pub use api::StripeApi;
pub use config::{StripeConfig, DEFAULT_STRIPE_API_URL, DEFAULT_WEBHOOK_TOLERANCE};
pub use data_objects::{NewPaymentIntent, StripeEvent, StripeEventData, StripePaymentIntent};
pub use error::StripeApiError;
pub use webhook::{compute_signature, signature_header, WebhookVerifier};
