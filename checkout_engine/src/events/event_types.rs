use serde::{Deserialize, Serialize};

use crate::db_types::{Order, OrderId, OrderStatusType, Payment, PaymentStatus};

/// Emitted once, after the transaction that moved an order to `Paid` has committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderPaidEvent {
    pub order: Order,
    pub payment: Payment,
}

impl OrderPaidEvent {
    pub fn new(order: Order, payment: Payment) -> Self {
        Self { order, payment }
    }
}

/// Emitted once, after the transaction that moved an order to `Cancelled` has committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderCancelledEvent {
    pub order: Order,
    pub payment: Payment,
}

impl OrderCancelledEvent {
    pub fn new(order: Order, payment: Payment) -> Self {
        Self { order, payment }
    }
}

/// A point-in-time view of an order's status together with its payment's status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPaymentStatus {
    pub order_id: OrderId,
    pub order_status: OrderStatusType,
    pub payment_status: PaymentStatus,
}

impl OrderPaymentStatus {
    pub fn new(order_id: OrderId, order_status: OrderStatusType, payment_status: PaymentStatus) -> Self {
        Self { order_id, order_status, payment_status }
    }

    /// The status shown to a waiting client. A final order status wins over whatever the payment record says.
    pub fn derived_status(&self) -> PaymentStatus {
        match self.order_status {
            OrderStatusType::Paid => PaymentStatus::Success,
            OrderStatusType::Cancelled => PaymentStatus::Failed,
            OrderStatusType::Pending => self.payment_status,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.derived_status().is_terminal()
    }
}
