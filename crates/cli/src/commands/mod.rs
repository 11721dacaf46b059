pub mod chat;
pub mod config;
pub mod search;
pub mod tool;

use std::sync::Arc;

use anyhow::Context;
use serde::Serialize;
use serde_json::Value;
use shopdesk_agent::{GuardrailPolicy, KnowledgeBase, ToolExecutor};
use shopdesk_core::config::AppConfig;
use shopdesk_core::CustomerId;
use shopdesk_store::{Collections, JsonFileStore, JsonlActionLog};

pub const EXIT_CONFIG: u8 = 2;
pub const EXIT_DATA: u8 = 3;
pub const EXIT_INVALID_REQUEST: u8 = 4;
pub const EXIT_SESSION: u8 = 5;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        Self::success_with_data(command, message, None)
    }

    /// Tool text that is itself JSON is also attached as structured `data`.
    pub fn success_with_data(command: &str, message: impl Into<String>, data: Option<Value>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            data,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            data: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

/// Loads every collection from the configured data directory.
pub fn load_knowledge(config: &AppConfig) -> anyhow::Result<Arc<KnowledgeBase>> {
    let store = JsonFileStore::new(&config.data.dir);
    let collections = Collections::load(&store)
        .with_context(|| format!("loading collections from `{}`", config.data.dir.display()))?;

    tracing::info!(
        event_name = "cli.collections.loaded",
        data_dir = %config.data.dir.display(),
        catalog = collections.catalog.len(),
        faqs = collections.faqs.len(),
        policy = collections.policy.len(),
        orders = collections.orders.len(),
        "collections loaded"
    );
    Ok(Arc::new(KnowledgeBase::fuzzy(collections)))
}

/// Executor bound to the configured customer, writing to the JSONL action log.
pub fn build_executor(config: &AppConfig, correlation_id: &str) -> anyhow::Result<ToolExecutor> {
    let knowledge = load_knowledge(config)?;
    let action_log = JsonlActionLog::open(&config.data.action_log_path).with_context(|| {
        format!("opening action log `{}`", config.data.action_log_path.display())
    })?;
    let guardrails = GuardrailPolicy::for_customer(
        config.customer_id().map(|id| CustomerId(id.to_string())),
        config.session.require_confirmation,
    );
    Ok(ToolExecutor::new(knowledge, Arc::new(action_log), guardrails, correlation_id))
}

/// Wraps executed tool text, attaching it as `data` when it parses as JSON.
pub fn tool_output(command: &str, text: String) -> CommandResult {
    let data = serde_json::from_str::<Value>(&text).ok();
    CommandResult::success_with_data(command, text, data)
}
