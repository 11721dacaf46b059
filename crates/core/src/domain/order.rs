use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::customer::CustomerId;
use crate::domain::product::ProductId;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(pub String);

impl OrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Order lifecycle status. Strings outside the known set are kept verbatim
/// so they round-trip and show up as-is in rejection reasons.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OrderStatus {
    Placed,
    Shipped,
    Delivered,
    Cancelled,
    Returned,
    Other(String),
}

impl OrderStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Placed => "Placed",
            Self::Shipped => "Shipped",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
            Self::Returned => "Returned",
            Self::Other(raw) => raw,
        }
    }

    pub fn is_cancellable(&self) -> bool {
        matches!(self, Self::Placed | Self::Shipped)
    }

    pub fn is_returnable(&self) -> bool {
        matches!(self, Self::Delivered)
    }

    /// Cancelled and returned orders are closed; everything else can still be acted on.
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Cancelled | Self::Returned)
    }
}

impl From<String> for OrderStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "Placed" => Self::Placed,
            "Shipped" => Self::Shipped,
            "Delivered" => Self::Delivered,
            "Cancelled" => Self::Cancelled,
            "Returned" => Self::Returned,
            _ => Self::Other(raw),
        }
    }
}

impl From<OrderStatus> for String {
    fn from(status: OrderStatus) -> Self {
        match status {
            OrderStatus::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    #[serde(default)]
    pub product_name: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// An order record. Cancellations and returns never write back to it; they
/// only leave a trace in the action log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    pub customer_id: CustomerId,
    #[serde(default)]
    pub order_date: String,
    pub order_status: OrderStatus,
    #[serde(default)]
    pub products: Vec<OrderLine>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Order {
    pub fn belongs_to(&self, customer_id: &CustomerId) -> bool {
        &self.customer_id == customer_id
    }

    pub fn contains_product(&self, product_id: &ProductId) -> bool {
        self.products.iter().any(|line| &line.product_id == product_id)
    }

    /// "O0002 (Shipped, 2024-05-01)" style label for clarification prompts.
    pub fn summary_label(&self) -> String {
        let details = [self.order_status.as_str(), self.order_date.as_str()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ");
        if details.is_empty() {
            self.order_id.to_string()
        } else {
            format!("{} ({details})", self.order_id)
        }
    }
}
