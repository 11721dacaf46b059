use std::io;
use std::sync::Arc;

use shopdesk_core::CatalogItem;
use uuid::Uuid;

use crate::conversation::{ConversationState, FocusEntity, Message};
use crate::cues::{
    is_customer_id_question, is_purchase_intent, is_session_end, needs_return_warning,
};
use crate::disambiguation::{self, Gate, GateReply, MAX_CATEGORY_SUGGESTIONS};
use crate::llm::LlmClient;
use crate::router::{apply_repairs, IntentRouter, Route, RoutingPlan};
use crate::tools::{ToolBatch, ToolExecutor};

pub const CHAT_SYSTEM_PROMPT: &str = "You are Shopdesk, a professional and concise sales assistant.
You can see the product catalog, the product FAQs, the company policy and the order database through TOOL RESULTS supplied by the system. Do not call tools yourself.
For order questions rely on the order data first.
Before confirming a return or cancellation, check the company policy for eligibility.
Answer product questions only from the TOOL RESULTS. If the data is missing or does not match, say you don't know and never invent products.
Keep answers short, formal and helpful.";

pub const CHAT_UNAVAILABLE_REPLY: &str =
    "I'm having trouble connecting to my brain right now. Please try again.";

pub const DEFAULT_MAX_HISTORY_TOKENS: usize = 1500;

pub fn new_session_id() -> String {
    Uuid::new_v4().to_string()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionSettings {
    pub system_prompt: String,
    pub max_history_tokens: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            system_prompt: CHAT_SYSTEM_PROMPT.to_string(),
            max_history_tokens: DEFAULT_MAX_HISTORY_TOKENS,
        }
    }
}

/// How a turn's reply was produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnPath {
    CustomerIdAnswer,
    PurchasePrompt,
    Clarification(Gate),
    Generated,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TurnOutcome {
    pub reply: String,
    pub path: TurnPath,
    pub plan: Option<RoutingPlan>,
    pub tools_executed: usize,
}

/// Drives one conversation: short-circuits, routing, tool execution,
/// clarification gates and the final generation call.
///
/// Turns are processed strictly one at a time through `&mut self`.
pub struct DialogueOrchestrator {
    router: IntentRouter,
    executor: ToolExecutor,
    llm: Arc<dyn LlmClient>,
    state: ConversationState,
    max_history_tokens: usize,
    correlation_id: String,
}

impl DialogueOrchestrator {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        executor: ToolExecutor,
        settings: SessionSettings,
        correlation_id: impl Into<String>,
    ) -> Self {
        let correlation_id = correlation_id.into();
        Self {
            router: IntentRouter::new(Arc::clone(&llm), correlation_id.clone()),
            executor,
            llm,
            state: ConversationState::new(settings.system_prompt),
            max_history_tokens: settings.max_history_tokens,
            correlation_id,
        }
    }

    pub fn history(&self) -> &[Message] {
        self.state.history()
    }

    pub fn focus(&self) -> Option<&FocusEntity> {
        self.state.focus()
    }

    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    pub async fn handle_turn(&mut self, text: &str) -> TurnOutcome {
        let utterance = text.trim();

        if let Some((path, reply)) = self.short_circuit(utterance) {
            tracing::info!(
                event_name = "agent.turn.short_circuit",
                correlation_id = %self.correlation_id,
                path = ?path,
                "answered without classification"
            );
            self.state.push(Message::user(utterance));
            self.state.push(Message::assistant(reply.clone()));
            return TurnOutcome { reply, path, plan: None, tools_executed: 0 };
        }

        let plan = apply_repairs(self.router.classify(utterance).await, utterance);

        let mut batch = ToolBatch::default();
        if plan.route == Route::Tools && !plan.tool_calls.is_empty() {
            batch = self.executor.execute_all(&plan.tool_calls, utterance);
            self.follow_up(utterance, &mut batch).await;
        }
        let tool_message =
            (!batch.output.is_empty()).then(|| format!("TOOL RESULTS:\n{}", batch.output));

        if let Some(gate) = self.clarify(utterance, &batch) {
            tracing::info!(
                event_name = "agent.turn.disambiguation",
                correlation_id = %self.correlation_id,
                gate = gate.gate.as_str(),
                "asking a clarifying question"
            );
            self.record_direct_reply(utterance, tool_message, &gate.reply);
            return TurnOutcome {
                reply: gate.reply,
                path: TurnPath::Clarification(gate.gate),
                plan: Some(plan),
                tools_executed: batch.executed,
            };
        }

        self.state.push(Message::user(utterance));
        if let Some(message) = &tool_message {
            self.state.push(Message::assistant(message.clone()));
        }

        let mut window = self.state.window(plan.use_memory, self.max_history_tokens);
        if let Some(message) = tool_message.filter(|_| !plan.use_memory) {
            window.push(Message::assistant(message));
        }

        let reply = match self.llm.chat(&window).await {
            Ok(reply) => reply,
            Err(error) => {
                tracing::warn!(
                    event_name = "agent.chat.unavailable",
                    correlation_id = %self.correlation_id,
                    error = %error,
                    "chat generation failed; sending apology"
                );
                CHAT_UNAVAILABLE_REPLY.to_string()
            }
        };

        let catalog_matches = batch.catalog_matches.as_deref().unwrap_or_default();
        let reply = match return_warning(utterance, catalog_matches, &reply) {
            Some(note) => format!("{reply}\n{note}"),
            None => reply,
        };

        tracing::info!(
            event_name = "agent.turn.completed",
            correlation_id = %self.correlation_id,
            route = ?plan.route,
            use_memory = plan.use_memory,
            window_size = window.len(),
            tools_executed = batch.executed,
            "turn completed"
        );
        self.state.push(Message::assistant(reply.clone()));
        TurnOutcome {
            reply,
            path: TurnPath::Generated,
            plan: Some(plan),
            tools_executed: batch.executed,
        }
    }

    fn short_circuit(&self, utterance: &str) -> Option<(TurnPath, String)> {
        if is_customer_id_question(utterance) {
            if let Some(customer_id) = self.executor.customer_id() {
                return Some((TurnPath::CustomerIdAnswer, format!("Your customer ID is {customer_id}.")));
            }
        }

        if is_purchase_intent(utterance) {
            let reply = match self.state.focus() {
                Some(focus) => format!(
                    "I can help with that. You're referring to {} ({}). How many would you like?",
                    focus.product_name, focus.product_id
                ),
                None => "Which product would you like to buy?".to_string(),
            };
            return Some((TurnPath::PurchasePrompt, reply));
        }
        None
    }

    /// One extra classification seeded with the tool output; any calls it
    /// proposes are executed and appended. Never recurses.
    async fn follow_up(&self, utterance: &str, batch: &mut ToolBatch) {
        let prompt = format!(
            "User:\n{utterance}\n\nTool results:\n{}\n\nDecide if more tool calls are needed.",
            batch.output
        );
        let follow_up = self.router.classify(&prompt).await;
        if follow_up.tool_calls.is_empty() {
            return;
        }

        tracing::info!(
            event_name = "agent.turn.follow_up",
            correlation_id = %self.correlation_id,
            tool_calls = follow_up.tool_calls.len(),
            "running follow-up tool calls"
        );
        let extra = self.executor.execute_all(&follow_up.tool_calls, utterance);
        if !extra.output.is_empty() {
            batch.output = if batch.output.is_empty() {
                extra.output
            } else {
                format!("{}\n{}", batch.output, extra.output)
            };
        }
        batch.executed += extra.executed;
    }

    /// Runs the gates in order. Focus is updated between the catalog gates
    /// and the orders gate.
    fn clarify(&mut self, utterance: &str, batch: &ToolBatch) -> Option<GateReply> {
        if let Some(gate) = batch
            .order_matches
            .as_deref()
            .and_then(|orders| disambiguation::cancel_choice(utterance, orders))
        {
            return Some(gate);
        }

        if let Some(catalog) = batch.catalog_matches.as_deref() {
            if catalog.is_empty() {
                let categories = self.executor.knowledge().categories(MAX_CATEGORY_SUGGESTIONS);
                return Some(disambiguation::product_miss(&categories));
            }
            if let Some(gate) = disambiguation::product_choice(utterance, catalog) {
                return Some(gate);
            }
            self.state.update_focus(catalog, utterance);
        }

        match batch.order_matches.as_deref() {
            Some([]) => Some(disambiguation::order_miss(utterance)),
            _ => None,
        }
    }

    fn record_direct_reply(&mut self, utterance: &str, tool_message: Option<String>, reply: &str) {
        self.state.push(Message::user(utterance));
        if let Some(message) = tool_message {
            self.state.push(Message::assistant(message));
        }
        self.state.push(Message::assistant(reply));
    }
}

/// Notice appended when a return question touches a non-returnable product
/// the reply did not already flag.
pub fn return_warning(utterance: &str, catalog_matches: &[CatalogItem], reply: &str) -> Option<String> {
    if !needs_return_warning(utterance) || reply.to_lowercase().contains("non-returnable") {
        return None;
    }
    catalog_matches
        .iter()
        .find(|item| item.is_non_returnable())
        .map(|item| format!("Note: {} is marked non-returnable.", item.product_name))
}

/// Line-oriented text boundary of a session. Voice front ends implement the
/// same pair.
pub trait ConversationChannel {
    /// Next user utterance, or `None` when the input is closed.
    fn read_user_text(&mut self) -> io::Result<Option<String>>;

    fn emit(&mut self, text: &str) -> io::Result<()>;
}

/// Reads and answers turns until `quit`/`exit` or end of input. Returns the
/// number of turns handled.
pub async fn run_session<C>(orchestrator: &mut DialogueOrchestrator, channel: &mut C) -> io::Result<usize>
where
    C: ConversationChannel + ?Sized,
{
    let mut turns = 0;
    while let Some(text) = channel.read_user_text()? {
        if is_session_end(&text) {
            break;
        }
        if text.trim().is_empty() {
            continue;
        }

        let outcome = orchestrator.handle_turn(&text).await;
        channel.emit(&outcome.reply)?;
        turns += 1;
    }

    tracing::info!(
        event_name = "agent.session.ended",
        correlation_id = %orchestrator.correlation_id(),
        turns,
        "session ended"
    );
    Ok(turns)
}
