//! Clarifying replies that short-circuit generation when tool results are
//! ambiguous or empty.

use shopdesk_core::identifiers::extract_order_id;
use shopdesk_core::{CatalogItem, Order};

use crate::cues::is_cancel_request;

const MAX_ORDER_CHOICES: usize = 5;
const MAX_PRODUCT_CHOICES: usize = 3;
pub const MAX_CATEGORY_SUGGESTIONS: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gate {
    CancelChoice,
    ProductChoice,
    ProductMiss,
    OrderMiss,
}

impl Gate {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CancelChoice => "cancel_choice",
            Self::ProductChoice => "product_choice",
            Self::ProductMiss => "product_miss",
            Self::OrderMiss => "order_miss",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GateReply {
    pub gate: Gate,
    pub reply: String,
}

/// Several orders match a cancel request that names none of them.
pub fn cancel_choice(utterance: &str, order_matches: &[Order]) -> Option<GateReply> {
    if !is_cancel_request(utterance)
        || extract_order_id(utterance).is_some()
        || order_matches.len() <= 1
    {
        return None;
    }

    let active = order_matches.iter().filter(|order| order.order_status.is_active()).collect::<Vec<_>>();
    let choices = if active.is_empty() { order_matches.iter().collect() } else { active };
    let labels = choices
        .iter()
        .take(MAX_ORDER_CHOICES)
        .map(|order| order.summary_label())
        .collect::<Vec<_>>();

    Some(GateReply {
        gate: Gate::CancelChoice,
        reply: format!(
            "I found {} orders. Which one would you like to cancel? {}.",
            choices.len(),
            labels.join("; ")
        ),
    })
}

/// Several distinct products match and the utterance names none of them.
pub fn product_choice(utterance: &str, catalog_matches: &[CatalogItem]) -> Option<GateReply> {
    let mut names: Vec<&str> = Vec::new();
    for item in catalog_matches {
        if !names.contains(&item.product_name.as_str()) {
            names.push(&item.product_name);
        }
    }
    if names.len() <= 1 {
        return None;
    }

    let lowered = utterance.to_lowercase();
    if names.iter().any(|name| lowered.contains(&name.to_lowercase())) {
        return None;
    }

    let details = catalog_matches
        .iter()
        .take(MAX_PRODUCT_CHOICES)
        .map(CatalogItem::summary_label)
        .collect::<Vec<_>>();
    Some(GateReply {
        gate: Gate::ProductChoice,
        reply: format!(
            "I found a few options. Here are some top matches: {}. Which one should I compare or describe?",
            details.join("; ")
        ),
    })
}

pub fn product_miss(categories: &[String]) -> GateReply {
    let reply = if categories.is_empty() {
        "I couldn't find a matching product. Could you clarify the product name or category?"
            .to_string()
    } else {
        format!("I couldn't find a matching product. Are you looking for {}?", categories.join(", "))
    };
    GateReply { gate: Gate::ProductMiss, reply }
}

pub fn order_miss(utterance: &str) -> GateReply {
    let reply = if extract_order_id(utterance).is_some() {
        "I couldn't find that order ID. Please double-check the digits or share your customer ID."
    } else {
        "I couldn't find an order. Could you share the order ID or customer ID?"
    };
    GateReply { gate: Gate::OrderMiss, reply: reply.to_string() }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use shopdesk_core::{CatalogItem, Order};

    use super::{cancel_choice, order_miss, product_choice, product_miss, Gate};

    fn order(id: &str, status: &str, date: &str) -> Order {
        serde_json::from_value(json!({
            "order_id": id, "customer_id": "C0029", "order_date": date,
            "order_status": status, "products": []
        }))
        .expect("order")
    }

    fn product(id: &str, name: &str, price: u32, rating: f64) -> CatalogItem {
        serde_json::from_value(json!({
            "product_id": id, "product_name": name, "price": price, "rating": rating
        }))
        .expect("catalog item")
    }

    #[test]
    fn cancel_choice_lists_only_active_orders() {
        let orders = [
            order("O0002", "Delivered", "2024-05-01"),
            order("O0003", "Cancelled", "2024-05-02"),
            order("O0005", "Placed", "2024-06-10"),
        ];
        let gate = cancel_choice("please cancel my order", &orders).expect("gate fires");
        assert_eq!(gate.gate, Gate::CancelChoice);
        assert_eq!(
            gate.reply,
            "I found 2 orders. Which one would you like to cancel? \
             O0002 (Delivered, 2024-05-01); O0005 (Placed, 2024-06-10)."
        );
    }

    #[test]
    fn cancel_choice_falls_back_to_all_matches_when_none_active() {
        let orders = [order("O0003", "Cancelled", "2024-05-02"), order("O0004", "Returned", "")];
        let gate = cancel_choice("cancel my order", &orders).expect("gate fires");
        assert!(gate.reply.starts_with("I found 2 orders."));
        assert!(gate.reply.ends_with("O0003 (Cancelled, 2024-05-02); O0004 (Returned)."));
    }

    #[test]
    fn cancel_choice_is_skipped_with_explicit_id_or_single_match() {
        let orders = [order("O0002", "Placed", "d"), order("O0005", "Placed", "d")];
        assert!(cancel_choice("cancel order O0005", &orders).is_none());
        assert!(cancel_choice("cancel my order", &orders[..1]).is_none());
        assert!(cancel_choice("show my orders", &orders).is_none());
    }

    #[test]
    fn product_choice_presents_top_three_with_price_and_rating() {
        let matches = [
            product("P1001", "Luma Monitor Pro", 329, 4.6),
            product("P1004", "Zeta Monitor", 189, 4.1),
        ];
        let gate = product_choice("show me a monitor", &matches).expect("gate fires");
        assert_eq!(
            gate.reply,
            "I found a few options. Here are some top matches: Luma Monitor Pro ($329, 4.6★); \
             Zeta Monitor ($189, 4.1★). Which one should I compare or describe?"
        );
        assert!(product_choice("tell me about the zeta monitor", &matches).is_none());
    }

    #[test]
    fn product_choice_needs_more_than_one_distinct_name() {
        let matches = [
            product("P1001", "Luma Monitor Pro", 329, 4.6),
            product("P1009", "Luma Monitor Pro", 299, 4.4),
        ];
        assert!(product_choice("monitor", &matches).is_none());
    }

    #[test]
    fn misses_explain_what_to_share() {
        assert_eq!(
            product_miss(&["Monitors".to_string(), "Laptops".to_string()]).reply,
            "I couldn't find a matching product. Are you looking for Monitors, Laptops?"
        );
        assert!(product_miss(&[]).reply.contains("clarify the product name or category"));
        assert!(order_miss("where is order O9999").reply.starts_with("I couldn't find that order ID."));
        assert!(order_miss("where is my stuff").reply.contains("share the order ID or customer ID"));
    }
}
