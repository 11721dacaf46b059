use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};
use shopdesk_agent::disambiguation::Gate;
use shopdesk_agent::runtime::{SessionSettings, CHAT_UNAVAILABLE_REPLY};
use shopdesk_agent::{
    run_session, ConversationChannel, DialogueOrchestrator, GuardrailPolicy, KnowledgeBase,
    LlmClient, LlmError, Message, Role, Route, ToolExecutor, TurnPath,
};
use shopdesk_core::{ActionResult, CustomerId, InMemoryActionLog};
use shopdesk_store::{Collection, Collections, InMemoryRecordStore};

#[derive(Default)]
struct ScriptedLlm {
    plans: Mutex<VecDeque<Result<Value, LlmError>>>,
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    structured_calls: AtomicUsize,
    chat_calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
    windows: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedLlm {
    fn with_plans(plans: Vec<Result<Value, LlmError>>) -> Self {
        Self { plans: Mutex::new(plans.into()), ..Self::default() }
    }

    fn reply_with(self, replies: Vec<Result<String, LlmError>>) -> Self {
        *self.replies.lock().expect("replies lock") = replies.into();
        self
    }

    fn structured_calls(&self) -> usize {
        self.structured_calls.load(Ordering::SeqCst)
    }

    fn chat_calls(&self) -> usize {
        self.chat_calls.load(Ordering::SeqCst)
    }

    fn last_window(&self) -> Vec<Message> {
        self.windows.lock().expect("windows lock").last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn generate_structured(
        &self,
        prompt: &str,
        _system_prompt: &str,
        _schema: &Value,
    ) -> Result<Value, LlmError> {
        self.structured_calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().expect("prompts lock").push(prompt.to_string());
        self.plans.lock().expect("plans lock").pop_front().unwrap_or(Err(LlmError::EmptyResponse))
    }

    async fn chat(&self, messages: &[Message]) -> Result<String, LlmError> {
        self.chat_calls.fetch_add(1, Ordering::SeqCst);
        self.windows.lock().expect("windows lock").push(messages.to_vec());
        self.replies
            .lock()
            .expect("replies lock")
            .pop_front()
            .unwrap_or_else(|| Ok("Happy to help.".to_string()))
    }
}

fn plan(route: &str, tool_calls: Value, use_memory: bool) -> Result<Value, LlmError> {
    Ok(json!({
        "route": route,
        "intent": "retrieve",
        "tool_calls": tool_calls,
        "use_memory": use_memory,
        "confidence": 0.9
    }))
}

fn retrieve(query: &str, mode: &str) -> Value {
    json!({"tool": "retrieve", "args": {"query": query, "mode": mode, "k": 5}})
}

fn knowledge() -> Arc<KnowledgeBase> {
    let store = InMemoryRecordStore::default()
        .with(
            Collection::Catalog,
            json!([
                {"product_id": "P1001", "product_name": "Luma Monitor Pro", "category": "Monitors",
                 "price": 329, "rating": 4.6, "delivery_time_days": 4, "return_eligible": true},
                {"product_id": "P1004", "product_name": "Zeta Monitor", "category": "Monitors",
                 "price": 189, "rating": 4.1, "delivery_time_days": 2, "return_eligible": false},
                {"product_id": "P2001", "product_name": "Aero Laptop", "category": "Laptops",
                 "price": 999, "rating": 4.7, "delivery_time_days": 6, "return_eligible": true}
            ]),
        )
        .with(
            Collection::Faqs,
            json!([
                {"product_id": "P1001", "product_name": "Luma Monitor Pro", "faqs": [
                    {"question": "What is the warranty?", "answer": "Two years."}
                ]}
            ]),
        )
        .with(
            Collection::Policy,
            json!({"policy_document": {"sections": [
                {"topic": "Returns", "clean_text": "Items can be returned within 30 days of delivery."},
                {"topic": "Cancellation", "clean_text": "Orders can be cancelled until they ship."}
            ]}}),
        )
        .with(
            Collection::Orders,
            json!([
                {"order_id": "O0002", "customer_id": "C0029", "order_date": "2024-05-01",
                 "order_status": "Delivered",
                 "products": [{"product_id": "P1004", "product_name": "Zeta Monitor"}]},
                {"order_id": "O0003", "customer_id": "C0029", "order_date": "2024-05-20",
                 "order_status": "Cancelled",
                 "products": [{"product_id": "P1001", "product_name": "Luma Monitor Pro"}]},
                {"order_id": "O0005", "customer_id": "C0029", "order_date": "2024-06-10",
                 "order_status": "Placed",
                 "products": [{"product_id": "P2001", "product_name": "Aero Laptop"}]},
                {"order_id": "O0007", "customer_id": "C0002", "order_date": "2024-06-11",
                 "order_status": "Shipped",
                 "products": [{"product_id": "P1001", "product_name": "Luma Monitor Pro"}]}
            ]),
        );
    let collections = Collections::load(&store).expect("fixture collections load");
    Arc::new(KnowledgeBase::fuzzy(collections))
}

struct Harness {
    orchestrator: DialogueOrchestrator,
    llm: Arc<ScriptedLlm>,
    log: InMemoryActionLog,
}

fn harness(llm: ScriptedLlm) -> Harness {
    let llm = Arc::new(llm);
    let log = InMemoryActionLog::default();
    let guardrails = GuardrailPolicy::for_customer(Some(CustomerId("C0029".to_string())), true);
    let executor = ToolExecutor::new(knowledge(), Arc::new(log.clone()), guardrails, "scenario");
    let client: Arc<dyn LlmClient> = llm.clone();
    let orchestrator =
        DialogueOrchestrator::new(client, executor, SessionSettings::default(), "scenario");
    Harness { orchestrator, llm, log }
}

#[tokio::test]
async fn confirmed_cancel_of_placed_order_is_approved_with_ticket() {
    let mut harness = harness(ScriptedLlm::with_plans(vec![plan(
        "tools",
        json!([{"tool": "cancel_order", "args": {"order_id": "O0005", "confirm": true}}]),
        false,
    )]));

    let outcome = harness.orchestrator.handle_turn("cancel order O0005").await;

    assert_eq!(outcome.path, TurnPath::Generated);
    let entries = harness.log.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].result, ActionResult::Approved);
    let ticket = entries[0].ticket_id.clone().expect("ticket issued");
    assert!(ticket.starts_with("CAN-"));
    assert!(ticket[4..].len() == 6 && ticket[4..].chars().all(|c| c.is_ascii_hexdigit()));

    // cancel_order, plus the orders and policy lookups added by repair.
    assert_eq!(outcome.tools_executed, 3);
    assert_eq!(harness.llm.structured_calls(), 2, "classification plus one follow-up");

    let window = harness.llm.last_window();
    let tool_message = window.last().expect("tool results injected");
    assert_eq!(tool_message.role, Role::Assistant);
    assert!(tool_message.content.starts_with("TOOL RESULTS:\n[cancel_order results]:"));
    assert!(tool_message.content.contains("\"status\": \"approved\""));
    assert!(tool_message.content.contains(&ticket));
}

#[tokio::test]
async fn unknown_order_id_gets_a_clarifying_reply_without_generation() {
    let mut harness = harness(ScriptedLlm::with_plans(vec![plan(
        "tools",
        json!([retrieve("O9999", "orders")]),
        false,
    )]));

    let outcome = harness.orchestrator.handle_turn("where is order O9999").await;

    assert_eq!(outcome.path, TurnPath::Clarification(Gate::OrderMiss));
    assert!(outcome.reply.starts_with("I couldn't find that order ID."));
    assert_eq!(harness.llm.chat_calls(), 0);

    let history = harness.orchestrator.history();
    assert_eq!(history.len(), 4, "system, user, tool results, reply");
    assert_eq!(history[1].content, "where is order O9999");
    assert!(history[2].content.starts_with("TOOL RESULTS:"));
    assert_eq!(history[3].content, outcome.reply);
}

#[tokio::test]
async fn classification_failure_falls_back_to_plain_chat() {
    let mut harness = harness(
        ScriptedLlm::with_plans(vec![Err(LlmError::Exhausted {
            attempts: 2,
            last_error: "model output is not valid json: expected value".to_string(),
        })])
        .reply_with(vec![Ok("Hello! How can I help you today?".to_string())]),
    );

    let outcome = harness.orchestrator.handle_turn("hello there").await;

    let plan = outcome.plan.expect("plan recorded");
    assert_eq!(plan.route, Route::Chat);
    assert!(plan.tool_calls.is_empty());
    assert_eq!(outcome.reply, "Hello! How can I help you today?");
    assert_eq!(outcome.tools_executed, 0);
    assert_eq!(harness.llm.structured_calls(), 1, "no follow-up without tool calls");
    assert_eq!(harness.llm.last_window().len(), 2, "system plus latest user message");
}

#[tokio::test]
async fn schema_violating_plan_is_treated_like_a_failure() {
    let mut harness = harness(ScriptedLlm::with_plans(vec![Ok(json!({
        "route": "tools", "intent": "retrieve", "tool_calls": [], "use_memory": false,
        "confidence": 0.7, "policy_check": "required"
    }))]));

    let outcome = harness.orchestrator.handle_turn("good morning").await;

    assert_eq!(outcome.plan.map(|plan| plan.route), Some(Route::Chat));
    assert!(!outcome.reply.is_empty());
}

#[tokio::test]
async fn ambiguous_monitor_search_lists_candidates_without_generation() {
    let mut harness = harness(ScriptedLlm::with_plans(vec![plan(
        "tools",
        json!([retrieve("monitor", "catalog")]),
        false,
    )]));

    let outcome = harness.orchestrator.handle_turn("show me a monitor").await;

    assert_eq!(outcome.path, TurnPath::Clarification(Gate::ProductChoice));
    assert!(outcome.reply.contains("Luma Monitor Pro ($329, 4.6★)"));
    assert!(outcome.reply.contains("Zeta Monitor ($189, 4.1★)"));
    assert!(outcome.reply.ends_with("Which one should I compare or describe?"));
    assert_eq!(harness.llm.chat_calls(), 0);
    assert!(harness.orchestrator.focus().is_none());
}

#[tokio::test]
async fn catalog_miss_suggests_known_categories() {
    let mut harness = harness(ScriptedLlm::with_plans(vec![plan(
        "tools",
        json!([retrieve("espresso machine", "catalog")]),
        false,
    )]));

    let outcome = harness.orchestrator.handle_turn("do you sell espresso machines").await;

    assert_eq!(
        outcome.reply,
        "I couldn't find a matching product. Are you looking for Monitors, Laptops?"
    );
    assert_eq!(harness.llm.chat_calls(), 0);
}

#[tokio::test]
async fn cancel_without_order_id_asks_which_active_order() {
    let mut harness = harness(ScriptedLlm::default());

    let outcome = harness.orchestrator.handle_turn("please cancel my order").await;

    assert_eq!(outcome.path, TurnPath::Clarification(Gate::CancelChoice));
    assert_eq!(
        outcome.reply,
        "I found 2 orders. Which one would you like to cancel? \
         O0002 (Delivered, 2024-05-01); O0005 (Placed, 2024-06-10)."
    );
    assert!(harness.log.entries().is_empty());
}

#[tokio::test]
async fn focus_from_a_single_match_answers_purchase_intent() {
    let mut harness = harness(ScriptedLlm::with_plans(vec![plan(
        "tools",
        json!([retrieve("zeta monitor", "catalog")]),
        false,
    )]));

    harness.orchestrator.handle_turn("tell me about the zeta monitor").await;
    let calls_before = harness.llm.structured_calls();

    let outcome = harness.orchestrator.handle_turn("great, I'll buy it").await;

    assert_eq!(outcome.path, TurnPath::PurchasePrompt);
    assert_eq!(
        outcome.reply,
        "I can help with that. You're referring to Zeta Monitor (P1004). How many would you like?"
    );
    assert_eq!(harness.llm.structured_calls(), calls_before, "short-circuit skips routing");
}

#[tokio::test]
async fn purchase_intent_without_focus_asks_for_the_product() {
    let mut harness = harness(ScriptedLlm::default());
    let outcome = harness.orchestrator.handle_turn("order this").await;
    assert_eq!(outcome.reply, "Which product would you like to buy?");
    assert_eq!(harness.llm.structured_calls(), 0);
}

#[tokio::test]
async fn customer_id_question_is_answered_from_the_session() {
    let mut harness = harness(ScriptedLlm::default());
    let outcome = harness.orchestrator.handle_turn("What is my customer ID?").await;
    assert_eq!(outcome.path, TurnPath::CustomerIdAnswer);
    assert_eq!(outcome.reply, "Your customer ID is C0029.");
}

#[tokio::test]
async fn return_question_about_non_returnable_item_gets_a_notice() {
    let mut harness = harness(
        ScriptedLlm::with_plans(vec![plan(
            "tools",
            json!([retrieve("zeta monitor", "catalog")]),
            false,
        )])
        .reply_with(vec![Ok("Returns are accepted within 30 days of delivery.".to_string())]),
    );

    let outcome = harness.orchestrator.handle_turn("can I return the zeta monitor?").await;

    assert_eq!(
        outcome.reply,
        "Returns are accepted within 30 days of delivery.\nNote: Zeta Monitor is marked non-returnable."
    );
    assert!(outcome.plan.is_some_and(|plan| plan.has_retrieve(shopdesk_agent::RetrieveMode::Policy)));
}

#[tokio::test]
async fn follow_up_classification_runs_extra_tool_calls_once() {
    let mut harness = harness(ScriptedLlm::with_plans(vec![
        plan("tools", json!([retrieve("luma monitor pro warranty", "faq")]), false),
        plan("tools", json!([retrieve("Luma Monitor Pro", "faq")]), false),
    ]));

    let outcome =
        harness.orchestrator.handle_turn("what's the warranty for the Luma Monitor Pro?").await;

    assert_eq!(outcome.tools_executed, 2);
    assert_eq!(harness.llm.structured_calls(), 2);
    let prompts = harness.llm.prompts.lock().expect("prompts lock").clone();
    assert!(prompts[1].starts_with("User:\nwhat's the warranty for the Luma Monitor Pro?\n\nTool results:\n"));
    assert!(prompts[1].ends_with("Decide if more tool calls are needed."));

    let window = harness.llm.last_window();
    let tool_message = &window.last().expect("tool message").content;
    assert_eq!(tool_message.matches("[retrieve results]:").count(), 2);
}

#[tokio::test]
async fn other_customers_orders_are_denied() {
    let mut harness = harness(ScriptedLlm::default());

    let outcome = harness.orchestrator.handle_turn("show the orders of C0002").await;

    assert_eq!(outcome.path, TurnPath::Generated);
    let window = harness.llm.last_window();
    let tool_message = &window.last().expect("tool message").content;
    assert!(tool_message.contains("Access denied"));
    assert!(!tool_message.contains("O0007"));
}

#[tokio::test]
async fn context_answers_see_prior_turns_and_chat_outage_apologises() {
    let mut harness = harness(
        ScriptedLlm::with_plans(vec![
            plan("tools", json!([retrieve("laptop", "catalog")]), false),
            Err(LlmError::EmptyResponse),
            plan("context_answer", json!([]), true),
        ])
        .reply_with(vec![
            Ok("The Aero Laptop costs $999.".to_string()),
            Err(LlmError::Exhausted { attempts: 4, last_error: "timeout".to_string() }),
        ]),
    );

    harness.orchestrator.handle_turn("do you have laptops?").await;
    let outcome = harness.orchestrator.handle_turn("is that the cheapest one?").await;

    assert_eq!(outcome.reply, CHAT_UNAVAILABLE_REPLY);
    let window = harness.llm.last_window();
    let roles = window.iter().map(|message| message.role).collect::<Vec<_>>();
    assert_eq!(
        roles,
        vec![Role::System, Role::User, Role::Assistant, Role::Assistant, Role::User],
        "system, first question, tool results, first reply, follow-up question"
    );
    assert_eq!(harness.orchestrator.history().last().map(|m| m.content.as_str()), Some(CHAT_UNAVAILABLE_REPLY));
}

struct ScriptedChannel {
    inputs: VecDeque<String>,
    emitted: Vec<String>,
}

impl ConversationChannel for ScriptedChannel {
    fn read_user_text(&mut self) -> io::Result<Option<String>> {
        Ok(self.inputs.pop_front())
    }

    fn emit(&mut self, text: &str) -> io::Result<()> {
        self.emitted.push(text.to_string());
        Ok(())
    }
}

#[tokio::test]
async fn session_stops_at_quit() {
    let mut harness = harness(ScriptedLlm::default());
    let mut channel = ScriptedChannel {
        inputs: ["hello", "  ", "EXIT", "never read"].into_iter().map(String::from).collect(),
        emitted: Vec::new(),
    };

    let turns = run_session(&mut harness.orchestrator, &mut channel).await.expect("session runs");

    assert_eq!(turns, 1);
    assert_eq!(channel.emitted, vec!["Happy to help.".to_string()]);
    assert_eq!(channel.inputs.len(), 1);
}
