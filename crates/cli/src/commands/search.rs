use shopdesk_agent::tools::RetrieveArgs;
use shopdesk_agent::{RetrieveMode, ToolCall};
use shopdesk_core::config::AppConfig;

use super::{build_executor, tool_output, CommandResult, EXIT_DATA, EXIT_INVALID_REQUEST};

/// Runs one retrieval through the executor, so customer scoping applies
/// exactly as it does in a conversation.
pub fn run(config: &AppConfig, mode: &str, query: &str, k: Option<i64>) -> CommandResult {
    let mode = match RetrieveMode::parse(mode) {
        Ok(mode) => mode,
        Err(error) => {
            return CommandResult::failure(
                "search",
                "invalid_request",
                error.user_message(),
                EXIT_INVALID_REQUEST,
            )
        }
    };

    let executor = match build_executor(config, "cli-search") {
        Ok(executor) => executor,
        Err(error) => {
            return CommandResult::failure("search", "data_load", format!("{error:#}"), EXIT_DATA)
        }
    };

    let call = ToolCall::Retrieve(RetrieveArgs { query: Some(query.to_string()), mode, k });
    let outcome = executor.execute(&call, query);
    tool_output("search", outcome.text)
}
