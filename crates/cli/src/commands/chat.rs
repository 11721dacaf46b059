use std::io::{self, BufRead, StdinLock, Stdout, Write};
use std::sync::Arc;

use anyhow::Context;
use shopdesk_agent::runtime::{new_session_id, SessionSettings, CHAT_SYSTEM_PROMPT};
use shopdesk_agent::{
    run_session, ConversationChannel, CredentialPool, DialogueOrchestrator, LlmClient,
    OpenAiCompatibleClient, OpenAiSettings,
};
use shopdesk_core::config::AppConfig;

use super::{build_executor, CommandResult, EXIT_CONFIG, EXIT_DATA, EXIT_SESSION};

const GREETING: &str = "Shopdesk is ready. Ask about products, policies or your orders. Type quit to exit.";

/// Line-oriented terminal channel: a `You:` prompt on stdout, one utterance
/// per stdin line.
pub struct StdioChannel {
    input: StdinLock<'static>,
    output: Stdout,
}

impl StdioChannel {
    pub fn new() -> Self {
        Self { input: io::stdin().lock(), output: io::stdout() }
    }
}

impl Default for StdioChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationChannel for StdioChannel {
    fn read_user_text(&mut self) -> io::Result<Option<String>> {
        write!(self.output, "You: ")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    fn emit(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.output, "Assistant: {text}")?;
        self.output.flush()
    }
}

pub async fn run(config: &AppConfig) -> CommandResult {
    if let Err(error) = config.require_llm_credentials() {
        return CommandResult::failure("chat", "config_validation", error.to_string(), EXIT_CONFIG);
    }

    let session_id = new_session_id();
    let mut orchestrator = match build_orchestrator(config, &session_id) {
        Ok(orchestrator) => orchestrator,
        Err(error) => {
            return CommandResult::failure("chat", "data_load", format!("{error:#}"), EXIT_DATA)
        }
    };

    tracing::info!(
        event_name = "cli.chat.session_started",
        correlation_id = %session_id,
        customer_bound = config.customer_id().is_some(),
        require_confirmation = config.session.require_confirmation,
        "chat session started"
    );

    let mut channel = StdioChannel::new();
    let session = match channel.emit(GREETING) {
        Ok(()) => run_session(&mut orchestrator, &mut channel).await,
        Err(error) => Err(error),
    };

    match session {
        Ok(turns) => {
            CommandResult::success("chat", format!("session {session_id} ended after {turns} turns"))
        }
        Err(error) => CommandResult::failure(
            "chat",
            "session_io",
            format!("conversation channel failed: {error}"),
            EXIT_SESSION,
        ),
    }
}

fn build_orchestrator(config: &AppConfig, session_id: &str) -> anyhow::Result<DialogueOrchestrator> {
    let executor = build_executor(config, session_id)?;
    let pool = CredentialPool::new(config.llm.api_keys.clone()).context("building credential pool")?;
    let client = OpenAiCompatibleClient::new(
        Arc::new(pool),
        OpenAiSettings::from(&config.llm),
        session_id,
    )
    .context("building model client")?;
    let llm: Arc<dyn LlmClient> = Arc::new(client);

    let settings = SessionSettings {
        system_prompt: CHAT_SYSTEM_PROMPT.to_string(),
        max_history_tokens: config.session.max_history_tokens,
    };
    Ok(DialogueOrchestrator::new(llm, executor, settings, session_id))
}
