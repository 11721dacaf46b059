//! Keyword cues read from the raw utterance.
//!
//! These are substring checks on the lower-cased text, deliberately loose:
//! they only ever add lookups or ask a clarifying question, never act.

use shopdesk_core::identifiers::{extract_customer_id, extract_order_id};

const ORDER_KEYWORDS: [&str; 6] =
    ["order", "bought", "purchased", "shipment", "delivery", "where is my"];
const POLICY_KEYWORDS: [&str; 6] =
    ["return", "refund", "exchange", "cancel", "cancellation", "return policy"];
const RETURN_WARNING_KEYWORDS: [&str; 3] = ["return", "refund", "exchange"];
const PURCHASE_PHRASES: [&str; 6] =
    ["buy it", "buy this", "purchase it", "purchase this", "order it", "order this"];
const GENERIC_ORDER_PHRASES: [&str; 5] =
    ["orders", "order", "my orders", "order history", "previous orders"];

fn lowered(text: &str) -> String {
    text.to_lowercase()
}

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    let text = lowered(text);
    keywords.iter().any(|keyword| text.contains(keyword))
}

pub fn needs_order_lookup(text: &str) -> bool {
    extract_order_id(text).is_some()
        || extract_customer_id(text).is_some()
        || contains_any(text, &ORDER_KEYWORDS)
}

pub fn needs_policy_check(text: &str) -> bool {
    contains_any(text, &POLICY_KEYWORDS)
}

pub fn needs_return_warning(text: &str) -> bool {
    contains_any(text, &RETURN_WARNING_KEYWORDS)
}

pub fn is_customer_id_question(text: &str) -> bool {
    contains_any(text, &["customer id", "customerid"])
}

pub fn is_purchase_intent(text: &str) -> bool {
    contains_any(text, &PURCHASE_PHRASES)
}

pub fn is_cancel_request(text: &str) -> bool {
    let text = lowered(text);
    text.contains("cancel") && text.contains("order")
}

/// An orders query that names no order or customer and is either a generic
/// phrase or just mentions orders.
pub fn is_generic_order_query(query: &str) -> bool {
    let normalized = query.trim().to_lowercase();
    if GENERIC_ORDER_PHRASES.contains(&normalized.as_str()) {
        return true;
    }
    extract_order_id(query).is_none()
        && extract_customer_id(query).is_none()
        && normalized.contains("order")
}

pub fn is_session_end(text: &str) -> bool {
    matches!(text.trim().to_lowercase().as_str(), "quit" | "exit")
}
