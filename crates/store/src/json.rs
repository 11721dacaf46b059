use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_json::Value;

use shopdesk_core::errors::StoreError;

use crate::{Collection, RecordStore};

/// Reads `<data_dir>/<collection>.json` on every `load`.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    data_dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self { data_dir: data_dir.into() }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn path_for(&self, collection: Collection) -> PathBuf {
        self.data_dir.join(collection.file_name())
    }
}

impl RecordStore for JsonFileStore {
    fn load(&self, collection: Collection) -> Result<Value, StoreError> {
        let path = self.path_for(collection);
        let raw = fs::read_to_string(&path).map_err(|error| match error.kind() {
            ErrorKind::NotFound => StoreError::NotFound {
                collection: collection.name().to_string(),
                path: path.display().to_string(),
            },
            _ => StoreError::Read {
                collection: collection.name().to_string(),
                message: error.to_string(),
            },
        })?;

        serde_json::from_str(&raw).map_err(|error| StoreError::Parse {
            collection: collection.name().to_string(),
            message: error.to_string(),
        })
    }
}
