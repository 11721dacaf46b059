//! Read-only record collections and the append-only action log.
//!
//! Collections are loaded once per process. A missing collection is not an
//! error for the agent: it is logged and treated as empty so the remaining
//! tools keep working.

pub mod action_log;
pub mod json;
pub mod memory;

use std::fmt;

use serde::de::DeserializeOwned;
use serde_json::Value;

use shopdesk_core::domain::faq::{flatten_faqs, FaqEntry, ProductFaqs};
use shopdesk_core::domain::order::Order;
use shopdesk_core::domain::policy::{flatten_policy, PolicyEntry};
use shopdesk_core::domain::product::CatalogItem;
use shopdesk_core::errors::StoreError;

pub use action_log::JsonlActionLog;
pub use json::JsonFileStore;
pub use memory::InMemoryRecordStore;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Catalog,
    Faqs,
    Policy,
    Orders,
}

impl Collection {
    pub const ALL: [Collection; 4] = [Self::Catalog, Self::Faqs, Self::Policy, Self::Orders];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Catalog => "product_catalog",
            Self::Faqs => "product_faqs",
            Self::Policy => "company_policy",
            Self::Orders => "order_database",
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.json", self.name())
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub trait RecordStore: Send + Sync {
    /// Raw JSON document for a collection.
    fn load(&self, collection: Collection) -> Result<Value, StoreError>;
}

/// Every collection the agent searches, already flattened into records.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Collections {
    pub catalog: Vec<CatalogItem>,
    pub faqs: Vec<FaqEntry>,
    pub policy: Vec<PolicyEntry>,
    pub orders: Vec<Order>,
}

impl Collections {
    pub fn load(store: &dyn RecordStore) -> Result<Self, StoreError> {
        let catalog = load_or_empty(store, Collection::Catalog)?
            .map(|document| decode::<Vec<CatalogItem>>(Collection::Catalog, document))
            .transpose()?
            .unwrap_or_default();

        let faqs = load_or_empty(store, Collection::Faqs)?
            .map(|document| decode::<Vec<ProductFaqs>>(Collection::Faqs, document))
            .transpose()?
            .map(flatten_faqs)
            .unwrap_or_default();

        let policy = load_or_empty(store, Collection::Policy)?
            .map(|document| policy_entries(&document))
            .transpose()?
            .unwrap_or_default();

        let orders = load_or_empty(store, Collection::Orders)?
            .map(|document| decode::<Vec<Order>>(Collection::Orders, document))
            .transpose()?
            .unwrap_or_default();

        tracing::info!(
            event_name = "store.collections.loaded",
            catalog = catalog.len(),
            faqs = faqs.len(),
            policy = policy.len(),
            orders = orders.len(),
            "record collections loaded"
        );

        Ok(Self { catalog, faqs, policy, orders })
    }
}

fn load_or_empty(
    store: &dyn RecordStore,
    collection: Collection,
) -> Result<Option<Value>, StoreError> {
    match store.load(collection) {
        Ok(document) => Ok(Some(document)),
        Err(error) if error.is_not_found() => {
            tracing::warn!(
                event_name = "store.collection.missing",
                collection = collection.name(),
                error = %error,
                "collection missing; treating as empty"
            );
            Ok(None)
        }
        Err(error) => Err(error),
    }
}

fn decode<T: DeserializeOwned>(collection: Collection, document: Value) -> Result<T, StoreError> {
    serde_json::from_value(document).map_err(|error| StoreError::Shape {
        collection: collection.name().to_string(),
        message: error.to_string(),
    })
}

/// The policy file wraps its tree in `policy_document`; a bare tree is
/// accepted too.
fn policy_entries(document: &Value) -> Result<Vec<PolicyEntry>, StoreError> {
    match document {
        Value::Object(map) => Ok(flatten_policy(map.get("policy_document").unwrap_or(document))),
        Value::Array(_) => Ok(flatten_policy(document)),
        other => Err(StoreError::Shape {
            collection: Collection::Policy.name().to_string(),
            message: format!("expected an object, found {}", json_kind(other)),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
