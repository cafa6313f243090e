use thiserror::Error;

#[derive(Debug, Error)]
pub enum StripeApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Could not reach Stripe: {0}")]
    RequestFailed(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("Stripe-Signature header is malformed: {0}")]
    MalformedSignatureHeader(String),
    #[error("Webhook timestamp is outside the tolerance window ({age}s)")]
    StaleTimestamp { age: i64 },
    #[error("Webhook signature does not match the payload")]
    SignatureMismatch,
    #[error("Invalid webhook payload: {0}")]
    InvalidPayload(String),
}

impl StripeApiError {
    /// Errors worth retrying later: Stripe could not be reached, or answered with a 5xx or rate-limit status.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RequestFailed(_) => true,
            Self::QueryError { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}
