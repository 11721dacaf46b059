//! Extraction of order, product and customer identifiers from free text.
//!
//! Identifiers are a one-letter prefix followed by exactly four digits
//! (`O0005`, `P1004`, `C0029`). Matching is case-insensitive, respects word
//! boundaries, and always returns the identifier upper-cased.

use std::sync::OnceLock;

use regex::Regex;

use crate::domain::customer::CustomerId;
use crate::domain::order::OrderId;
use crate::domain::product::ProductId;

fn id_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)\b([ocp])([0-9]{4})\b").ok()).as_ref()
}

pub fn extract_order_id(text: &str) -> Option<OrderId> {
    find_prefixed_id(text, "O").map(OrderId)
}

pub fn extract_product_id(text: &str) -> Option<ProductId> {
    find_prefixed_id(text, "P").map(ProductId)
}

pub fn extract_customer_id(text: &str) -> Option<CustomerId> {
    find_prefixed_id(text, "C").map(CustomerId)
}

/// True when the whole (trimmed) text is a single customer id.
pub fn is_customer_id(text: &str) -> bool {
    let trimmed = text.trim();
    find_prefixed_id(trimmed, "C").is_some_and(|id| id.len() == trimmed.len())
}

/// First id with `prefix`, rebuilt upper-cased from the prefix and digits.
fn find_prefixed_id(text: &str, prefix: &str) -> Option<String> {
    id_pattern()?
        .captures_iter(text)
        .find(|captures| captures[1].eq_ignore_ascii_case(prefix))
        .map(|captures| format!("{prefix}{}", &captures[2]))
}
