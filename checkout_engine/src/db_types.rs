use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
pub use checkout_common::Cents;
use log::error;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Invalid conversion: {0}")]
pub struct ConversionError(String);

//--------------------------------------        OrderId        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl OrderId {
    /// A fresh random (v4 UUID) order id.
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The key sent with every intent creation request for this order. The gateway returns the original intent for a
    /// repeated key, so an order can never end up with two chargeable intents.
    pub fn idempotency_key(&self) -> String {
        format!("order-{}", self.0)
    }
}

impl FromStr for OrderId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum OrderStatusType {
    /// The order has been created and is waiting for the payment processor to settle the payment.
    Pending,
    /// The payment processor reported a successful payment.
    Paid,
    /// The payment processor reported a failed payment.
    Cancelled,
}

impl OrderStatusType {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Pending => write!(f, "Pending"),
            OrderStatusType::Paid => write!(f, "Paid"),
            OrderStatusType::Cancelled => write!(f, "Cancelled"),
        }
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Paid" => Ok(Self::Paid),
            "Cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

impl From<String> for OrderStatusType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to Pending");
            OrderStatusType::Pending
        })
    }
}

//--------------------------------------    PaymentStatus      ---------------------------------------------------------
/// The status of a payment attempt as reported by the payment processor.
///
/// Stored as `Pending`/`Success`/`Failed`, serialized in upper case (`PENDING`, ...) for clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Type, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Success,
    Failed,
}

impl PaymentStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "PENDING"),
            PaymentStatus::Success => write!(f, "SUCCESS"),
            PaymentStatus::Failed => write!(f, "FAILED"),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "SUCCESS" => Ok(Self::Success),
            "FAILED" => Ok(Self::Failed),
            _ => Err(ConversionError(format!("Invalid payment status: {s}"))),
        }
    }
}

//--------------------------------------   ShippingDetails     ---------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(default)]
pub struct ShippingDetails {
    #[serde(alias = "fullName")]
    pub full_name: String,
    pub email: String,
    pub address: String,
    pub city: String,
    pub zip: String,
    pub country: String,
}

impl ShippingDetails {
    /// Returns the names of any fields that are blank.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("full_name", &self.full_name),
            ("email", &self.email),
            ("address", &self.address),
            ("city", &self.city),
            ("zip", &self.zip),
            ("country", &self.country),
        ]
        .into_iter()
        .filter(|(_, v)| v.trim().is_empty())
        .map(|(k, _)| k)
        .collect()
    }
}

//--------------------------------------        Order       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Order {
    pub order_id: OrderId,
    /// The identity of the customer that placed the order (their email address).
    pub customer_id: String,
    pub total: Cents,
    pub currency: String,
    pub status: OrderStatusType,
    pub intent_id: Option<String>,
    #[sqlx(flatten)]
    pub shipping: ShippingDetails,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn is_owned_by(&self, requester: &str) -> bool {
        self.customer_id == requester
    }
}

//--------------------------------------      OrderItem        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: OrderId,
    pub product_id: String,
    pub quantity: i64,
    pub unit_price: Cents,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrderItem {
    pub product_id: String,
    pub quantity: i64,
    pub unit_price: Cents,
}

impl NewOrderItem {
    pub fn new<S: Into<String>>(product_id: S, quantity: i64, unit_price: Cents) -> Self {
        Self { product_id: product_id.into(), quantity, unit_price }
    }

    /// `None` if the line total overflows.
    pub fn line_total(&self) -> Option<Cents> {
        self.unit_price.checked_mul(self.quantity)
    }
}

//--------------------------------------        NewOrder       ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_id: OrderId,
    pub customer_id: String,
    pub items: Vec<NewOrderItem>,
    pub currency: String,
    pub shipping: ShippingDetails,
    pub created_at: DateTime<Utc>,
}

impl NewOrder {
    pub fn new(customer_id: String, items: Vec<NewOrderItem>, shipping: ShippingDetails) -> Self {
        Self {
            order_id: OrderId::random(),
            customer_id,
            items,
            currency: checkout_common::DEFAULT_CURRENCY_CODE.to_string(),
            shipping,
            created_at: Utc::now(),
        }
    }

    pub fn with_currency<S: Into<String>>(mut self, currency: S) -> Self {
        self.currency = currency.into().to_lowercase();
        self
    }

    /// The order total, summed in minor units. `None` if any step of the sum overflows.
    pub fn total(&self) -> Option<Cents> {
        self.items.iter().try_fold(Cents::default(), |acc, item| acc.checked_add(item.line_total()?))
    }

    /// Checks the order is one we're willing to store: a non-empty cart of positive quantities at non-negative
    /// prices, shipped to a complete address.
    pub fn validate(&self) -> Result<(), String> {
        if self.customer_id.trim().is_empty() {
            return Err("The order has no customer".into());
        }
        if self.items.is_empty() {
            return Err("The cart is empty".into());
        }
        if let Some(item) = self.items.iter().find(|i| i.quantity < 1) {
            return Err(format!("Item {} has an invalid quantity ({})", item.product_id, item.quantity));
        }
        if let Some(item) = self.items.iter().find(|i| i.unit_price.is_negative()) {
            return Err(format!("Item {} has a negative price", item.product_id));
        }
        if let Some(item) = self.items.iter().find(|i| i.product_id.trim().is_empty()) {
            return Err(format!("An item with price {} has no product id", item.unit_price));
        }
        if self.total().is_none() {
            return Err("The order total is too large".into());
        }
        let missing = self.shipping.missing_fields();
        if !missing.is_empty() {
            return Err(format!("Missing shipping fields: {}", missing.join(", ")));
        }
        if self.currency.len() != 3 {
            return Err(format!("Invalid currency code: {}", self.currency));
        }
        Ok(())
    }
}

//--------------------------------------        Payment       ---------------------------------------------------------
/// The local record of the (single) payment attempt for an order.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Payment {
    pub id: i64,
    pub order_id: OrderId,
    pub intent_id: Option<String>,
    pub status: PaymentStatus,
    pub amount: Cents,
    pub currency: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------   PaymentOutcome      ---------------------------------------------------------
/// A settled payment result reported by the payment processor, ready to be applied to an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentOutcome {
    pub order_id: OrderId,
    pub intent_id: String,
    pub amount: Cents,
    pub currency: String,
    pub succeeded: bool,
}

impl PaymentOutcome {
    pub fn payment_status(&self) -> PaymentStatus {
        if self.succeeded {
            PaymentStatus::Success
        } else {
            PaymentStatus::Failed
        }
    }

    pub fn order_status(&self) -> OrderStatusType {
        if self.succeeded {
            OrderStatusType::Paid
        } else {
            OrderStatusType::Cancelled
        }
    }
}
