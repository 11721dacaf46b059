//! Field weights for each record collection.

use crate::domain::faq::FaqEntry;
use crate::domain::order::Order;
use crate::domain::policy::PolicyEntry;
use crate::domain::product::CatalogItem;
use crate::search::fuzzy::WeightedField;

pub fn catalog_fields() -> Vec<WeightedField<CatalogItem>> {
    vec![
        WeightedField { name: "product_name", weight: 3, values: catalog_name },
        WeightedField { name: "product_id", weight: 2, values: catalog_id },
        WeightedField { name: "category", weight: 2, values: catalog_category },
        WeightedField { name: "description", weight: 1, values: catalog_description },
    ]
}

pub fn faq_fields() -> Vec<WeightedField<FaqEntry>> {
    vec![
        WeightedField { name: "question", weight: 3, values: faq_question },
        WeightedField { name: "product_name", weight: 2, values: faq_product_name },
        WeightedField { name: "product_id", weight: 2, values: faq_product_id },
        WeightedField { name: "answer", weight: 1, values: faq_answer },
    ]
}

pub fn policy_fields() -> Vec<WeightedField<PolicyEntry>> {
    vec![
        WeightedField { name: "text", weight: 3, values: policy_text },
        WeightedField { name: "section", weight: 2, values: policy_section },
    ]
}

pub fn order_fields() -> Vec<WeightedField<Order>> {
    vec![
        WeightedField { name: "order_id", weight: 3, values: order_id },
        WeightedField { name: "customer_id", weight: 2, values: order_customer },
        WeightedField { name: "order_status", weight: 2, values: order_status },
        WeightedField { name: "order_date", weight: 1, values: order_date },
        WeightedField { name: "products.product_name", weight: 2, values: order_line_names },
        WeightedField { name: "products.product_id", weight: 2, values: order_line_ids },
    ]
}

fn catalog_name(item: &CatalogItem) -> Vec<&str> {
    vec![item.product_name.as_str()]
}

fn catalog_id(item: &CatalogItem) -> Vec<&str> {
    vec![item.product_id.as_str()]
}

fn catalog_category(item: &CatalogItem) -> Vec<&str> {
    vec![item.category.as_str()]
}

fn catalog_description(item: &CatalogItem) -> Vec<&str> {
    vec![item.description.as_str()]
}

fn faq_question(entry: &FaqEntry) -> Vec<&str> {
    vec![entry.question.as_str()]
}

fn faq_product_name(entry: &FaqEntry) -> Vec<&str> {
    vec![entry.product_name.as_str()]
}

fn faq_product_id(entry: &FaqEntry) -> Vec<&str> {
    vec![entry.product_id.as_str()]
}

fn faq_answer(entry: &FaqEntry) -> Vec<&str> {
    vec![entry.answer.as_str()]
}

fn policy_text(entry: &PolicyEntry) -> Vec<&str> {
    vec![entry.text.as_str()]
}

fn policy_section(entry: &PolicyEntry) -> Vec<&str> {
    vec![entry.section.as_str()]
}

fn order_id(order: &Order) -> Vec<&str> {
    vec![order.order_id.as_str()]
}

fn order_customer(order: &Order) -> Vec<&str> {
    vec![order.customer_id.as_str()]
}

fn order_status(order: &Order) -> Vec<&str> {
    vec![order.order_status.as_str()]
}

fn order_date(order: &Order) -> Vec<&str> {
    vec![order.order_date.as_str()]
}

fn order_line_names(order: &Order) -> Vec<&str> {
    order.products.iter().map(|line| line.product_name.as_str()).collect()
}

fn order_line_ids(order: &Order) -> Vec<&str> {
    order.products.iter().map(|line| line.product_id.as_str()).collect()
}

#[cfg(test)]
mod tests {
    use super::{catalog_fields, order_fields};
    use crate::domain::order::Order;
    use crate::domain::product::CatalogItem;
    use crate::search::{FuzzyIndex, SearchBackend};

    fn order(value: serde_json::Value) -> Order {
        serde_json::from_value(value).expect("order fixture")
    }

    #[test]
    fn order_line_items_each_contribute_to_the_score() {
        let orders = vec![
            order(serde_json::json!({
                "order_id": "O0001",
                "customer_id": "C0001",
                "order_status": "Delivered",
                "products": [{"product_id": "P1001", "product_name": "Desk Lamp"}]
            })),
            order(serde_json::json!({
                "order_id": "O0002",
                "customer_id": "C0002",
                "order_status": "Placed",
                "products": [
                    {"product_id": "P1001", "product_name": "Desk Lamp"},
                    {"product_id": "P1002", "product_name": "Desk Lamp Shade"}
                ]
            })),
        ];

        let index = FuzzyIndex::new(orders, order_fields());
        let results = index.search("desk lamp", 5).expect("fuzzy search");

        assert_eq!(results[0].item.order_id.as_str(), "O0002");
        assert_eq!(results[0].score, 4.0);
        assert_eq!(results[1].score, 2.0);
    }

    #[test]
    fn catalog_items_without_a_near_match_are_excluded() {
        let items: Vec<CatalogItem> = serde_json::from_value(serde_json::json!([
            {"product_id": "P1", "product_name": "Steel Flask", "category": "sports", "description": "Keeps tea hot"},
            {"product_id": "P2", "product_name": "Tea Kettle", "category": "kitchen", "description": "Stovetop"}
        ]))
        .expect("catalog fixture");

        let index = FuzzyIndex::new(items, catalog_fields());
        let results = index.search("kettle", 5).expect("fuzzy search");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].item.product_name, "Tea Kettle");
    }
}
