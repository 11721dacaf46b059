use std::collections::HashMap;

use serde_json::Value;

use shopdesk_core::errors::StoreError;

use crate::{Collection, RecordStore};

/// Fixture-friendly store; collections that were never added are `NotFound`.
#[derive(Clone, Debug, Default)]
pub struct InMemoryRecordStore {
    documents: HashMap<Collection, Value>,
}

impl InMemoryRecordStore {
    pub fn with(mut self, collection: Collection, document: Value) -> Self {
        self.documents.insert(collection, document);
        self
    }

    pub fn insert(&mut self, collection: Collection, document: Value) {
        self.documents.insert(collection, document);
    }
}

impl RecordStore for InMemoryRecordStore {
    fn load(&self, collection: Collection) -> Result<Value, StoreError> {
        self.documents.get(&collection).cloned().ok_or_else(|| StoreError::NotFound {
            collection: collection.name().to_string(),
            path: "<memory>".to_string(),
        })
    }
}
