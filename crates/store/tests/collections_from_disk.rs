use std::fs;

use serde_json::json;
use tempfile::TempDir;

use shopdesk_core::domain::order::OrderStatus;
use shopdesk_store::{Collection, Collections, JsonFileStore};

fn write(dir: &TempDir, collection: Collection, document: serde_json::Value) {
    fs::write(dir.path().join(collection.file_name()), document.to_string())
        .expect("fixture should be written");
}

#[test]
fn loads_and_flattens_every_collection_from_a_data_dir() {
    let dir = TempDir::new().expect("tempdir");
    write(
        &dir,
        Collection::Catalog,
        json!([
            {"product_id": "P1001", "product_name": "Luma Monitor Pro", "category": "electronics",
             "price": 329.99, "rating": 4.6, "return_eligible": true, "color": "black"}
        ]),
    );
    write(
        &dir,
        Collection::Faqs,
        json!([
            {"product_id": "P1001", "product_name": "Luma Monitor Pro", "faqs": [
                {"question": "Is there a warranty?", "answer": "Two years."},
                {"question": "Does it ship with a cable?", "answer": "DisplayPort included."}
            ]}
        ]),
    );
    write(
        &dir,
        Collection::Policy,
        json!({"policy_document": {
            "returns": {"topic": "Returns", "clean_text": "Returns accepted within 30 days.",
                        "segments": [{"topic": "Refunds", "clean_text": "Refunds take 5 days."}]}
        }}),
    );
    write(
        &dir,
        Collection::Orders,
        json!([
            {"order_id": "O0002", "customer_id": "C0001", "order_date": "2024-05-01",
             "order_status": "Delivered", "products": [{"product_id": "P1001", "product_name": "Luma Monitor Pro"}]}
        ]),
    );

    let collections = Collections::load(&JsonFileStore::new(dir.path())).expect("collections load");

    assert_eq!(collections.catalog.len(), 1);
    assert_eq!(collections.catalog[0].extra.get("color"), Some(&json!("black")));
    assert_eq!(collections.faqs.len(), 2);
    assert_eq!(collections.policy.len(), 2);
    assert_eq!(collections.policy[1].section, "returns > Returns > Refunds");
    assert_eq!(collections.orders[0].order_status, OrderStatus::Delivered);
}

#[test]
fn empty_data_dir_yields_empty_collections() {
    let dir = TempDir::new().expect("tempdir");
    let collections = Collections::load(&JsonFileStore::new(dir.path())).expect("collections load");
    assert_eq!(collections, Collections::default());
}
