use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("collection `{collection}` not found at {path}")]
    NotFound { collection: String, path: String },
    #[error("failed to read collection `{collection}`: {message}")]
    Read { collection: String, message: String },
    #[error("failed to parse collection `{collection}`: {message}")]
    Parse { collection: String, message: String },
    #[error("collection `{collection}` has an unexpected shape: {message}")]
    Shape { collection: String, message: String },
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SearchError {
    #[error("embedding failed: {0}")]
    Embedding(String),
    #[error("embedding dimension mismatch: index has {expected}, query has {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ActionLogError {
    #[error("failed to serialise action log entry: {0}")]
    Serialize(String),
    #[error("failed to append to action log: {0}")]
    Write(String),
}

/// Failures inside tool execution. None of these escape the executor; they
/// are rendered with [`ToolError::user_message`] into the tool output.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ToolError {
    #[error("unknown tool `{0}`")]
    UnknownTool(String),
    #[error("unknown retrieve mode `{0}`")]
    UnknownMode(String),
    #[error("{tool} is missing {field}")]
    MissingIdentifier { tool: &'static str, field: &'static str },
    #[error("customer {requested} is outside the session scope")]
    AccessDenied { requested: String },
    #[error(transparent)]
    Search(#[from] SearchError),
}

impl ToolError {
    pub fn user_message(&self) -> String {
        match self {
            Self::UnknownTool(name) => format!("Unknown tool '{name}'."),
            Self::UnknownMode(mode) => format!("Unknown mode '{mode}'."),
            Self::MissingIdentifier { tool, field } => {
                format!("Cannot run {tool}: missing {field}. Please include it in your request.")
            }
            Self::AccessDenied { .. } => {
                "Access denied: you can only view orders that belong to your own customer ID."
                    .to_owned()
            }
            Self::Search(_) => "Search is temporarily unavailable. Please try again.".to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::{SearchError, StoreError, ToolError};

    #[test]
    fn tool_errors_render_descriptive_user_messages() {
        assert_eq!(ToolError::UnknownMode("books".to_owned()).user_message(), "Unknown mode 'books'.");
        assert!(ToolError::MissingIdentifier { tool: "cancel_order", field: "order_id" }
            .user_message()
            .contains("missing order_id"));
        assert!(ToolError::AccessDenied { requested: "C0002".to_owned() }
            .user_message()
            .starts_with("Access denied"));
    }

    #[test]
    fn access_denied_message_does_not_echo_the_requested_customer() {
        let message = ToolError::AccessDenied { requested: "C0002".to_owned() }.user_message();
        assert!(!message.contains("C0002"));
    }

    #[test]
    fn search_failures_hide_backend_details_from_users() {
        let error = ToolError::from(SearchError::Embedding("connection reset".to_owned()));
        assert!(!error.user_message().contains("connection reset"));
        assert!(error.to_string().contains("connection reset"));
    }

    #[test]
    fn not_found_is_distinguished_from_other_store_failures() {
        let missing = StoreError::NotFound {
            collection: "order_database".to_owned(),
            path: "data/order_database.json".to_owned(),
        };
        let broken = StoreError::Parse {
            collection: "order_database".to_owned(),
            message: "expected value".to_owned(),
        };
        assert!(missing.is_not_found());
        assert!(!broken.is_not_found());
    }
}
