//! Turn routing: one structured model call per utterance, validated strictly,
//! followed by deterministic repair rules.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use shopdesk_core::identifiers::extract_customer_id;
use shopdesk_core::search::{DEFAULT_K, MAX_K, MIN_K};

use crate::cues::{needs_order_lookup, needs_policy_check};
use crate::llm::{LlmClient, LlmError};
use crate::tools::{RetrieveMode, ToolCall};

pub const SYSTEM_PROMPT: &str = r#"You route messages for an ecommerce support assistant backed by retrieval over a product catalog, product FAQs, the company policy and the order database.

Routes:
- tools: fetch NEW data with retrieve, or act with cancel_order / initiate_return.
- context_answer: the user refers to results already shown in this conversation. Use tool_calls=[] and use_memory=true.
- chat: greetings, thanks and small talk.

Intent:
- retrieve: any shopping, order, return, refund, cancellation, shipping or policy question.
- fallback: anything unrelated to shopping.

Tools:
- retrieve(query, mode, k): query is the shortest useful search string, mode is one of catalog, faq, policy, orders, catalog+faq, k defaults to 5.
- cancel_order(order_id, confirm)
- initiate_return(order_id, product_id, confirm)
Set confirm=true only when the user has explicitly confirmed the action in this message.

Safety:
- Before a return or cancellation is confirmed, check the policy with retrieve(mode=policy).
- For questions about an order the user placed, check orders first, then policy.
- If an order id is missing for a cancellation, retrieve orders and ask which one.
- If an order or product id is missing for a return, retrieve orders and ask which product.

Context detection:
- "these", "those", "that one", "the first/second/third", "which of them" mean context_answer.
- Comparing or choosing among items just shown means context_answer.
- "best", "cheapest" or "recommend" used with a pronoun means context_answer.
- Use tools only for NEW or DIFFERENT products.

Examples:
- "show me monitors": tools (catalog)
- "which one is cheapest?": context_answer
- "tell me about the second one": context_answer
- "do you have laptops?": tools (catalog)
- "can I return the monitor I bought last week?": tools (orders and policy)
- "what is your return policy?": tools (policy)
- "where is order O0002?": tools (orders)
- "what's the warranty for Luma Monitor Pro?": tools (faq)
- "cancel order O0005": tools (cancel_order)
- "return P1004 from order O0002": tools (initiate_return)
- "hello": chat

Return ONLY valid JSON."#;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    Tools,
    ContextAnswer,
    Chat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Retrieve,
    Fallback,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoutingPlan {
    pub route: Route,
    pub intent: Intent,
    pub tool_calls: Vec<ToolCall>,
    pub use_memory: bool,
    pub confidence: f64,
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum PlanError {
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error("routing plan does not match the schema: {0}")]
    Schema(String),
    #[error("routing plan field `{field}` is out of range: {value}")]
    OutOfRange { field: &'static str, value: f64 },
}

impl RoutingPlan {
    pub fn fallback() -> Self {
        Self {
            route: Route::Chat,
            intent: Intent::Fallback,
            tool_calls: Vec::new(),
            use_memory: false,
            confidence: 0.0,
        }
    }

    /// Validates model output: all five fields required, enums enforced,
    /// unknown fields rejected, numeric ranges checked.
    pub fn from_value(value: Value) -> Result<Self, PlanError> {
        let plan: Self =
            serde_json::from_value(value).map_err(|error| PlanError::Schema(error.to_string()))?;

        if !(0.0..=1.0).contains(&plan.confidence) {
            return Err(PlanError::OutOfRange { field: "confidence", value: plan.confidence });
        }
        for call in &plan.tool_calls {
            if let ToolCall::Retrieve(args) = call {
                if let Some(k) = args.k.filter(|k| !(MIN_K as i64..=MAX_K as i64).contains(k)) {
                    return Err(PlanError::OutOfRange { field: "k", value: k as f64 });
                }
            }
        }
        Ok(plan)
    }

    pub fn has_retrieve(&self, mode: RetrieveMode) -> bool {
        self.tool_calls.iter().any(|call| call.retrieve_mode() == Some(mode))
    }

    /// The query of the first retrieval in one of `modes`.
    pub fn retrieve_query(&self, modes: &[RetrieveMode]) -> Option<&str> {
        self.tool_calls.iter().find_map(|call| match call {
            ToolCall::Retrieve(args) if modes.contains(&args.mode) => args.query.as_deref(),
            _ => None,
        })
    }
}

/// JSON schema the structured generation call is constrained to.
pub fn routing_schema() -> Value {
    let modes = RetrieveMode::ALL.iter().map(RetrieveMode::as_str).collect::<Vec<_>>();
    let call = |tool: &str, properties: Value, required: &[&str]| {
        json!({
            "type": "object",
            "properties": {
                "tool": {"type": "string", "enum": [tool]},
                "args": {
                    "type": "object",
                    "properties": properties,
                    "required": required,
                    "additionalProperties": false
                }
            },
            "required": ["tool", "args"],
            "additionalProperties": false
        })
    };

    json!({
        "type": "object",
        "properties": {
            "route": {"type": "string", "enum": ["tools", "context_answer", "chat"]},
            "intent": {"type": "string", "enum": ["retrieve", "fallback"]},
            "tool_calls": {
                "type": "array",
                "items": {
                    "anyOf": [
                        call(
                            "retrieve",
                            json!({
                                "query": {"type": "string"},
                                "mode": {"type": "string", "enum": modes},
                                "k": {"type": "integer", "minimum": MIN_K, "maximum": MAX_K}
                            }),
                            &["query", "mode", "k"],
                        ),
                        call(
                            "cancel_order",
                            json!({
                                "order_id": {"type": "string"},
                                "confirm": {"type": "boolean"}
                            }),
                            &["order_id", "confirm"],
                        ),
                        call(
                            "initiate_return",
                            json!({
                                "order_id": {"type": "string"},
                                "product_id": {"type": "string"},
                                "confirm": {"type": "boolean"}
                            }),
                            &["order_id", "product_id", "confirm"],
                        ),
                    ]
                }
            },
            "use_memory": {"type": "boolean"},
            "confidence": {"type": "number", "minimum": 0.0, "maximum": 1.0}
        },
        "required": ["route", "intent", "tool_calls", "use_memory", "confidence"],
        "additionalProperties": false
    })
}

/// Adds the lookups the classifier may have skipped.
///
/// Idempotent and order-independent: each rule only appends a call when no
/// call of its mode exists yet.
pub fn apply_repairs(mut plan: RoutingPlan, utterance: &str) -> RoutingPlan {
    if needs_order_lookup(utterance) && !plan.has_retrieve(RetrieveMode::Orders) {
        let query = extract_customer_id(utterance)
            .map(|customer_id| customer_id.0)
            .unwrap_or_else(|| utterance.to_owned());
        plan.tool_calls.push(ToolCall::retrieve(query, RetrieveMode::Orders, DEFAULT_K as i64));
        plan.route = Route::Tools;
    }

    if needs_policy_check(utterance) && !plan.has_retrieve(RetrieveMode::Policy) {
        plan.tool_calls.push(ToolCall::retrieve(utterance, RetrieveMode::Policy, DEFAULT_K as i64));
        plan.route = Route::Tools;
    }

    if matches!(plan.route, Route::Tools | Route::ContextAnswer) {
        plan.intent = Intent::Retrieve;
    }
    plan
}

pub struct IntentRouter {
    llm: Arc<dyn LlmClient>,
    schema: Value,
    correlation_id: String,
}

impl IntentRouter {
    pub fn new(llm: Arc<dyn LlmClient>, correlation_id: impl Into<String>) -> Self {
        Self { llm, schema: routing_schema(), correlation_id: correlation_id.into() }
    }

    pub async fn try_classify(&self, text: &str) -> Result<RoutingPlan, PlanError> {
        let value = self.llm.generate_structured(text, SYSTEM_PROMPT, &self.schema).await?;
        RoutingPlan::from_value(value)
    }

    /// Never fails: any model or validation error yields [`RoutingPlan::fallback`].
    pub async fn classify(&self, text: &str) -> RoutingPlan {
        match self.try_classify(text).await {
            Ok(plan) => {
                tracing::debug!(
                    event_name = "agent.router.classified",
                    correlation_id = %self.correlation_id,
                    route = ?plan.route,
                    tool_calls = plan.tool_calls.len(),
                    confidence = plan.confidence,
                    "utterance classified"
                );
                plan
            }
            Err(error) => {
                tracing::warn!(
                    event_name = "agent.router.fallback",
                    correlation_id = %self.correlation_id,
                    error = %error,
                    "classification failed; using fallback plan"
                );
                RoutingPlan::fallback()
            }
        }
    }
}
