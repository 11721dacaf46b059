use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use shopdesk_core::audit::{ActionLog, ActionLogEntry};
use shopdesk_core::errors::ActionLogError;

/// Line-delimited JSON action log opened in append mode.
///
/// Each entry is serialised up front and written with a single `write_all`
/// while the file lock is held, so concurrent writers never interleave lines.
pub struct JsonlActionLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonlActionLog {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ActionLogError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|error| ActionLogError::Write(error.to_string()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|error| ActionLogError::Write(error.to_string()))?;
        Ok(Self { path, file: Mutex::new(file) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ActionLog for JsonlActionLog {
    fn append(&self, entry: &ActionLogEntry) -> Result<(), ActionLogError> {
        let mut line = serde_json::to_string(entry)
            .map_err(|error| ActionLogError::Serialize(error.to_string()))?;
        line.push('\n');

        let mut file = match self.file.lock() {
            Ok(file) => file,
            Err(poisoned) => poisoned.into_inner(),
        };
        file.write_all(line.as_bytes())
            .and_then(|()| file.flush())
            .map_err(|error| ActionLogError::Write(error.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use shopdesk_core::audit::{ActionKind, ActionLog, ActionLogEntry};
    use shopdesk_core::domain::order::OrderId;

    use super::JsonlActionLog;

    #[test]
    fn appends_one_json_line_per_entry_and_never_truncates() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("logs/action_log.jsonl");
        fs::create_dir_all(dir.path().join("logs")).expect("mkdir");
        fs::write(&path, "{\"existing\":true}\n").expect("seed existing line");

        let log = JsonlActionLog::open(&path).expect("open log");
        for order in ["O0001", "O0002"] {
            log.append(&ActionLogEntry::rejected(
                ActionKind::CancelOrder,
                None,
                Some(OrderId(order.to_string())),
                None,
                "Order not found.",
            ))
            .expect("append");
        }

        let contents = fs::read_to_string(&path).expect("read log");
        let lines = contents.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "{\"existing\":true}");

        let last: serde_json::Value = serde_json::from_str(lines[2]).expect("json line");
        assert_eq!(last["order_id"], "O0002");
        assert_eq!(last["result"], "rejected");
    }

    #[test]
    fn creates_missing_parent_directories() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("nested/deeper/action_log.jsonl");
        let log = JsonlActionLog::open(&path).expect("open log");
        assert_eq!(log.path(), path.as_path());
        assert!(path.exists());
    }
}
