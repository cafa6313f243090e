use std::{fmt::Display, str::FromStr};

use checkout_common::{Cents, CentsConversionError};
use checkout_engine::{
    db_types::{NewOrder, NewOrderItem, OrderId, OrderStatusType, PaymentStatus, ShippingDetails},
    events::OrderPaymentStatus,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

/// Settings that apply to every order the server creates.
#[derive(Debug, Clone)]
pub struct CheckoutSettings {
    pub currency: String,
}

/// A price in major units, as sent by the storefront. Either a JSON string (`"19.99"`) or a JSON number (`19.99`).
///
/// Numbers are converted through their shortest decimal representation, so `19.99` becomes exactly 1999 cents.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PriceInput {
    Text(String),
    Number(serde_json::Number),
}

impl PriceInput {
    pub fn to_cents(&self) -> Result<Cents, CentsConversionError> {
        match self {
            Self::Text(s) => Cents::from_str(s),
            Self::Number(n) => Cents::from_str(&n.to_string()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CartItem {
    #[serde(alias = "productId")]
    pub product_id: String,
    pub quantity: i64,
    #[serde(alias = "unitPrice", alias = "price")]
    pub unit_price: PriceInput,
}

/// The body of `POST /api/orders`: a finalized cart and where to ship it.
#[derive(Debug, Clone, Deserialize)]
pub struct NewOrderRequest {
    pub items: Vec<CartItem>,
    pub shipping: ShippingDetails,
}

impl NewOrderRequest {
    /// Converts the cart into a new order for `customer_id`. Prices that can't be represented exactly in cents are
    /// rejected here. Everything else is validated by the order flow.
    pub fn into_new_order(self, customer_id: &str, currency: &str) -> Result<NewOrder, String> {
        let items = self
            .items
            .into_iter()
            .map(|item| {
                let price = item.unit_price.to_cents().map_err(|e| format!("Product {}: {e}", item.product_id))?;
                Ok(NewOrderItem::new(item.product_id, item.quantity, price))
            })
            .collect::<Result<Vec<_>, String>>()?;
        Ok(NewOrder::new(customer_id.to_string(), items, self.shipping).with_currency(currency))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimulatePaymentRequest {
    #[serde(alias = "orderId")]
    pub order_id: OrderId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookAck {
    pub received: bool,
}

impl WebhookAck {
    pub fn received() -> Self {
        Self { received: true }
    }
}

/// One message on the status stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMessage {
    pub status: PaymentStatus,
    pub order_status: OrderStatusType,
}

impl From<&OrderPaymentStatus> for StatusMessage {
    fn from(s: &OrderPaymentStatus) -> Self {
        Self { status: s.derived_status(), order_status: s.order_status }
    }
}
