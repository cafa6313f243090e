use thiserror::Error;

use crate::{
    db_types::{OrderId, OrderStatusType},
    traits::{GatewayError, StoreError},
};

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("You are not allowed to access order {0}")]
    Unauthorized(OrderId),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Order {0} has already been processed. Its status is {1}")]
    OrderAlreadyProcessed(OrderId, OrderStatusType),
    #[error("The webhook signature is invalid. {0}")]
    InvalidSignature(String),
    #[error("The gateway event could not be interpreted. {0}")]
    MalformedEvent(String),
    #[error("The payment processor is unavailable. {0}")]
    GatewayUnavailable(String),
    #[error("Invalid order. {0}")]
    InvalidOrder(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<StoreError> for OrderFlowError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::OrderNotFound(id) => Self::OrderNotFound(id),
            StoreError::InvalidOrder(s) => Self::InvalidOrder(s),
            e => Self::DatabaseError(e.to_string()),
        }
    }
}

impl From<GatewayError> for OrderFlowError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::InvalidSignature(s) => Self::InvalidSignature(s),
            GatewayError::MalformedEvent(s) => Self::MalformedEvent(s),
            GatewayError::Unavailable(s) => Self::GatewayUnavailable(s),
            GatewayError::Rejected(s) => Self::GatewayUnavailable(format!("Request rejected: {s}")),
        }
    }
}
