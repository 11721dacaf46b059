use serde_json::Value;
use shopdesk_agent::ToolRegistry;
use shopdesk_core::config::AppConfig;

use super::{build_executor, tool_output, CommandResult, EXIT_DATA, EXIT_INVALID_REQUEST};

/// Normalizes a loose JSON tool call the same way routed calls are, then
/// executes it. Actions are guarded and logged like any other.
pub fn run(config: &AppConfig, request: &str, utterance: &str) -> CommandResult {
    let raw = match serde_json::from_str::<Value>(request) {
        Ok(raw) => raw,
        Err(error) => {
            return CommandResult::failure(
                "tool",
                "invalid_request",
                format!("tool request is not valid JSON: {error}"),
                EXIT_INVALID_REQUEST,
            )
        }
    };

    let call = match ToolRegistry::normalize(&raw) {
        Ok(call) => call,
        Err(error) => {
            return CommandResult::failure(
                "tool",
                "invalid_request",
                error.user_message(),
                EXIT_INVALID_REQUEST,
            )
        }
    };

    let executor = match build_executor(config, "cli-tool") {
        Ok(executor) => executor,
        Err(error) => {
            return CommandResult::failure("tool", "data_load", format!("{error:#}"), EXIT_DATA)
        }
    };

    let outcome = executor.execute(&call, utterance);
    tool_output("tool", outcome.text)
}
