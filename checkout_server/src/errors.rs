use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use checkout_engine::OrderFlowError;
use log::error;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Invalid order. {0}")]
    InvalidOrder(String),
    #[error("Webhook rejected. {0}")]
    InvalidSignature(String),
    #[error("The payment processor is temporarily unavailable. Please try again shortly.")]
    PaymentProcessorUnavailable,
    #[error("Your request could not be completed right now. Please try again shortly.")]
    StorageUnavailable,
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidOrder(_) => StatusCode::BAD_REQUEST,
            Self::InvalidSignature(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(e) => match e {
                AuthError::MissingToken => StatusCode::UNAUTHORIZED,
                AuthError::PoorlyFormattedToken(_) => StatusCode::UNAUTHORIZED,
                AuthError::ValidationError(_) => StatusCode::UNAUTHORIZED,
                AuthError::TokenExpired => StatusCode::UNAUTHORIZED,
                AuthError::MisconfiguredAuthority => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::PaymentProcessorUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::StorageUnavailable => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

impl From<OrderFlowError> for ServerError {
    fn from(e: OrderFlowError) -> Self {
        match e {
            OrderFlowError::Unauthorized(_) => Self::Unauthorized(e.to_string()),
            OrderFlowError::OrderNotFound(_) => Self::NoRecordFound(e.to_string()),
            OrderFlowError::OrderAlreadyProcessed(_, _) => Self::Conflict(e.to_string()),
            OrderFlowError::InvalidOrder(s) => Self::InvalidOrder(s),
            OrderFlowError::InvalidSignature(s) => Self::InvalidSignature(s),
            OrderFlowError::MalformedEvent(s) => Self::InvalidRequestBody(s),
            OrderFlowError::GatewayUnavailable(s) => {
                // The details stay in the log. Clients only learn that they can retry.
                error!("💻️ Payment processor call failed. {s}");
                Self::PaymentProcessorUnavailable
            },
            OrderFlowError::DatabaseError(s) => {
                error!("💻️ Database error while handling a request. {s}");
                Self::StorageUnavailable
            },
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("No bearer token was provided.")]
    MissingToken,
    #[error("Access token is not in the correct format. {0}")]
    PoorlyFormattedToken(String),
    #[error("Access token signature is invalid. {0}")]
    ValidationError(String),
    #[error("Access token has expired.")]
    TokenExpired,
    #[error("The server has no token authority configured.")]
    MisconfiguredAuthority,
}
