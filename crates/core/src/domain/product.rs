use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductId(pub String);

impl ProductId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A sellable item from `product_catalog.json`.
///
/// Attributes the ranking layer does not understand are kept in `extra` so
/// that tool output still shows the model the full record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub product_id: ProductId,
    pub product_name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_time_days: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_eligible: Option<bool>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl CatalogItem {
    pub fn is_non_returnable(&self) -> bool {
        self.return_eligible == Some(false)
    }

    /// Short "Name ($price, rating★)" label used in clarification prompts.
    pub fn summary_label(&self) -> String {
        let mut bits = Vec::new();
        if let Some(price) = self.price {
            bits.push(format!("${price}"));
        }
        if let Some(rating) = self.rating {
            bits.push(format!("{rating}★"));
        }

        if bits.is_empty() {
            self.product_name.clone()
        } else {
            format!("{} ({})", self.product_name, bits.join(", "))
        }
    }
}
