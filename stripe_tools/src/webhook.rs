use checkout_common::Secret;
use hmac::{Hmac, Mac};
use log::*;
use sha2::Sha256;

use crate::{StripeApiError, StripeEvent};

type HmacSha256 = Hmac<Sha256>;

/// Signed timestamps this far in the future are still accepted, to absorb clock skew.
const FUTURE_SKEW: i64 = 60;

/// Checks the `Stripe-Signature` header against the raw request body.
///
/// The header has the form `t=<unix time>,v1=<hex hmac>[,v1=...]`. The signed message is `"<t>.<body>"`, keyed with
/// the endpoint's webhook secret. Any one matching `v1` entry is accepted.
#[derive(Debug, Clone)]
pub struct WebhookVerifier {
    secret: Secret<String>,
    tolerance: i64,
}

impl WebhookVerifier {
    pub fn new(secret: Secret<String>, tolerance: i64) -> Self {
        Self { secret, tolerance }
    }

    pub fn verify(&self, payload: &[u8], header: &str) -> Result<(), StripeApiError> {
        self.verify_at(payload, header, chrono::Utc::now().timestamp())
    }

    pub fn verify_at(&self, payload: &[u8], header: &str, now: i64) -> Result<(), StripeApiError> {
        let mut timestamp = None;
        let mut signatures = Vec::new();
        for part in header.split(',') {
            match part.trim().split_once('=') {
                Some(("t", t)) => timestamp = Some(t),
                Some(("v1", s)) => signatures.push(s),
                _ => {},
            }
        }
        let timestamp = timestamp.ok_or_else(|| StripeApiError::MalformedSignatureHeader("missing t=".into()))?;
        if signatures.is_empty() {
            return Err(StripeApiError::MalformedSignatureHeader("missing v1=".into()));
        }
        let ts = timestamp
            .parse::<i64>()
            .map_err(|e| StripeApiError::MalformedSignatureHeader(format!("bad timestamp: {e}")))?;
        let age = now - ts;
        if age > self.tolerance || age < -FUTURE_SKEW {
            warn!("💳️ Rejecting webhook with timestamp {ts}. Age {age}s, tolerance {}s", self.tolerance);
            return Err(StripeApiError::StaleTimestamp { age });
        }
        let matched = signatures.iter().any(|sig| {
            let Ok(sig) = hex::decode(sig) else { return false };
            let Ok(mut mac) = HmacSha256::new_from_slice(self.secret.reveal().as_bytes()) else { return false };
            mac.update(timestamp.as_bytes());
            mac.update(b".");
            mac.update(payload);
            mac.verify_slice(&sig).is_ok()
        });
        if matched {
            Ok(())
        } else {
            Err(StripeApiError::SignatureMismatch)
        }
    }

    /// Verifies the signature and then deserializes the event envelope.
    pub fn construct_event(&self, payload: &[u8], header: &str) -> Result<StripeEvent, StripeApiError> {
        self.verify(payload, header)?;
        serde_json::from_slice(payload).map_err(|e| StripeApiError::InvalidPayload(e.to_string()))
    }
}

/// Hex-encoded HMAC-SHA256 of `"<timestamp>.<payload>"`.
pub fn compute_signature(secret: &str, payload: &[u8], timestamp: i64) -> String {
    // HMAC accepts keys of any length
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap_or_else(|_| unreachable!());
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

/// Builds a `Stripe-Signature` header value the way Stripe does. Used for tests and local tooling.
pub fn signature_header(secret: &str, payload: &[u8], timestamp: i64) -> String {
    format!("t={timestamp},v1={}", compute_signature(secret, payload, timestamp))
}
