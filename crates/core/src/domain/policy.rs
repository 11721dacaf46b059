use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const DEFAULT_SECTION: &str = "policy";
const SKIPPED_KEYS: [&str; 4] = ["topic", "clean_text", "segments", "citation_ids"];

/// A searchable paragraph of the company policy with its breadcrumb path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyEntry {
    pub section: String,
    pub text: String,
}

/// Flattens the nested `policy_document` tree into `(section, text)` entries.
///
/// `topic` extends the breadcrumb, `clean_text` emits an entry, `segments`
/// recurse under the current breadcrumb, and every other key recurses with
/// its name (underscores as spaces) appended to the parent breadcrumb.
pub fn flatten_policy(document: &Value) -> Vec<PolicyEntry> {
    let mut entries = Vec::new();
    flatten_node(document, &[], &mut entries);
    entries
}

fn flatten_node(node: &Value, path: &[String], entries: &mut Vec<PolicyEntry>) {
    match node {
        Value::Object(map) => flatten_object(map, path, entries),
        Value::Array(items) => {
            for item in items {
                flatten_node(item, path, entries);
            }
        }
        _ => {}
    }
}

fn flatten_object(map: &Map<String, Value>, path: &[String], entries: &mut Vec<PolicyEntry>) {
    let mut topic_path = path.to_vec();
    if let Some(topic) = map.get("topic").and_then(Value::as_str).filter(|topic| !topic.is_empty())
    {
        topic_path.push(topic.to_string());
    }

    if let Some(text) = map.get("clean_text") {
        let section = if topic_path.is_empty() {
            DEFAULT_SECTION.to_string()
        } else {
            topic_path.join(" > ")
        };
        entries.push(PolicyEntry {
            section,
            text: text.as_str().unwrap_or_default().to_string(),
        });
    }

    if let Some(Value::Array(segments)) = map.get("segments") {
        for segment in segments {
            flatten_node(segment, &topic_path, entries);
        }
    }

    for (key, value) in map {
        if SKIPPED_KEYS.contains(&key.as_str()) {
            continue;
        }
        let mut child_path = path.to_vec();
        child_path.push(key.replace('_', " "));
        flatten_node(value, &child_path, entries);
    }
}
