//! The closed set of tools the router may call, and their executor.
//!
//! Tool calls arrive either strictly typed from a validated routing plan or
//! as loose JSON through [`ToolRegistry::normalize`]. Execution never fails:
//! every error is rendered into the tool's text output.

use std::fmt;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use shopdesk_core::audit::issue_ticket_id;
use shopdesk_core::identifiers::{
    extract_customer_id, extract_order_id, extract_product_id, is_customer_id,
};
use shopdesk_core::search::{clamp_k, normalize_query, weights, FuzzyIndex, MAX_K};
use shopdesk_core::{
    ActionKind, ActionLog, ActionLogEntry, CatalogItem, CustomerId, FaqEntry, Order, OrderId,
    ParsedQuery, PolicyEntry, ProductId, QueryParser, Scored, SearchBackend, SearchError,
    SortHint, ToolError,
};
use shopdesk_store::Collections;

use crate::cues::is_generic_order_query;
use crate::guardrails::{GuardrailDecision, GuardrailIntent, GuardrailPolicy};

const EXACT_MATCH_SCORE: f64 = 1.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RetrieveMode {
    #[serde(rename = "catalog")]
    Catalog,
    #[serde(rename = "faq")]
    Faq,
    #[serde(rename = "policy")]
    Policy,
    #[serde(rename = "orders")]
    Orders,
    #[serde(rename = "catalog+faq")]
    CatalogFaq,
}

impl RetrieveMode {
    pub const ALL: [RetrieveMode; 5] =
        [Self::Catalog, Self::Faq, Self::Policy, Self::Orders, Self::CatalogFaq];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Catalog => "catalog",
            Self::Faq => "faq",
            Self::Policy => "policy",
            Self::Orders => "orders",
            Self::CatalogFaq => "catalog+faq",
        }
    }

    /// Accepts the canonical names plus the loose aliases callers tend to use.
    pub fn parse(raw: &str) -> Result<Self, ToolError> {
        match raw.trim().to_lowercase().as_str() {
            "" | "catalog" | "products" => Ok(Self::Catalog),
            "faq" | "faqs" => Ok(Self::Faq),
            "policy" | "company_policy" => Ok(Self::Policy),
            "orders" | "order" => Ok(Self::Orders),
            "catalog+faq" => Ok(Self::CatalogFaq),
            _ => Err(ToolError::UnknownMode(raw.trim().to_owned())),
        }
    }
}

impl fmt::Display for RetrieveMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetrieveArgs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    pub mode: RetrieveMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub k: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CancelOrderArgs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InitiateReturnArgs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tool", content = "args", rename_all = "snake_case", deny_unknown_fields)]
pub enum ToolCall {
    Retrieve(RetrieveArgs),
    CancelOrder(CancelOrderArgs),
    InitiateReturn(InitiateReturnArgs),
}

impl ToolCall {
    pub fn retrieve(query: impl Into<String>, mode: RetrieveMode, k: i64) -> Self {
        Self::Retrieve(RetrieveArgs { query: Some(query.into()), mode, k: Some(k) })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Retrieve(_) => "retrieve",
            Self::CancelOrder(_) => "cancel_order",
            Self::InitiateReturn(_) => "initiate_return",
        }
    }

    pub fn retrieve_mode(&self) -> Option<RetrieveMode> {
        match self {
            Self::Retrieve(args) => Some(args.mode),
            _ => None,
        }
    }
}

/// Static dispatch table from loose `{tool, args}` JSON to a [`ToolCall`].
pub struct ToolRegistry;

impl ToolRegistry {
    /// Lenient normalization: mode aliases, numeric-string `k`, blank
    /// identifiers treated as absent. Unknown tools and modes are errors.
    pub fn normalize(raw: &Value) -> Result<ToolCall, ToolError> {
        let name = raw.get("tool").and_then(Value::as_str).unwrap_or_default().trim();
        let empty = Map::new();
        let args = raw.get("args").and_then(Value::as_object).unwrap_or(&empty);

        match name.to_lowercase().as_str() {
            "retrieve" => {
                let mode = match text_arg(args, "mode") {
                    Some(mode) => RetrieveMode::parse(&mode)?,
                    None => RetrieveMode::Catalog,
                };
                Ok(ToolCall::Retrieve(RetrieveArgs {
                    query: text_arg(args, "query"),
                    mode,
                    k: args.get("k").and_then(lenient_integer),
                }))
            }
            "cancel_order" => Ok(ToolCall::CancelOrder(CancelOrderArgs {
                order_id: text_arg(args, "order_id"),
                confirm: bool_arg(args, "confirm"),
            })),
            "initiate_return" => Ok(ToolCall::InitiateReturn(InitiateReturnArgs {
                order_id: text_arg(args, "order_id"),
                product_id: text_arg(args, "product_id"),
                confirm: bool_arg(args, "confirm"),
            })),
            _ => Err(ToolError::UnknownTool(name.to_owned())),
        }
    }
}

fn text_arg(args: &Map<String, Value>, key: &str) -> Option<String> {
    match args.get(key)? {
        Value::String(text) => Some(text.trim().to_owned()).filter(|text| !text.is_empty()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn bool_arg(args: &Map<String, Value>, key: &str) -> bool {
    match args.get(key) {
        Some(Value::Bool(flag)) => *flag,
        Some(Value::String(text)) => matches!(text.trim().to_lowercase().as_str(), "true" | "yes"),
        _ => false,
    }
}

fn lenient_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64().or_else(|| number.as_f64().map(|f| f.trunc() as i64)),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

/// Searchable collections plus the catalog query parser.
pub struct KnowledgeBase {
    catalog: Box<dyn SearchBackend<CatalogItem>>,
    faqs: Box<dyn SearchBackend<FaqEntry>>,
    policy: Box<dyn SearchBackend<PolicyEntry>>,
    orders: Box<dyn SearchBackend<Order>>,
    parser: QueryParser,
}

impl KnowledgeBase {
    pub fn new(
        catalog: Box<dyn SearchBackend<CatalogItem>>,
        faqs: Box<dyn SearchBackend<FaqEntry>>,
        policy: Box<dyn SearchBackend<PolicyEntry>>,
        orders: Box<dyn SearchBackend<Order>>,
    ) -> Self {
        Self { catalog, faqs, policy, orders, parser: QueryParser::new() }
    }

    /// Lexical indexes over every collection with the default field weights.
    pub fn fuzzy(collections: Collections) -> Self {
        Self::new(
            Box::new(FuzzyIndex::new(collections.catalog, weights::catalog_fields())),
            Box::new(FuzzyIndex::new(collections.faqs, weights::faq_fields())),
            Box::new(FuzzyIndex::new(collections.policy, weights::policy_fields())),
            Box::new(FuzzyIndex::new(collections.orders, weights::order_fields())),
        )
    }

    /// Ranks on the cleaned query, then applies the parsed filters and sort.
    pub fn search_catalog(&self, query: &str, k: usize) -> Result<Vec<Scored<CatalogItem>>, SearchError> {
        let parsed = self.parser.parse(query);
        let cleaned = normalize_query(&parsed.cleaned_query);
        if cleaned.is_empty() {
            return Ok(Vec::new());
        }

        let mut results = self.catalog.search(&cleaned, k)?;
        results.retain(|scored| passes_filters(&scored.item, &parsed));
        match parsed.sort {
            Some(SortHint::PriceAsc) => {
                results.sort_by_key(|scored| scored.item.price.unwrap_or(Decimal::ZERO));
            }
            Some(SortHint::DeliveryTimeDaysAsc) => {
                results.sort_by_key(|scored| scored.item.delivery_time_days.unwrap_or(0));
            }
            None => {}
        }
        Ok(results)
    }

    pub fn search_faqs(&self, query: &str, k: usize) -> Result<Vec<Scored<FaqEntry>>, SearchError> {
        self.faqs.search(query, k)
    }

    pub fn search_policy(&self, query: &str, k: usize) -> Result<Vec<Scored<PolicyEntry>>, SearchError> {
        self.policy.search(query, k)
    }

    /// A query naming an order id resolves to that order alone. A query that
    /// is exactly a customer id lists that customer's orders in stored order.
    /// Anything else goes through ranked search.
    pub fn search_orders(&self, query: &str, k: usize) -> Result<Vec<Scored<Order>>, SearchError> {
        let normalized = normalize_query(query);
        if let Some(order_id) = extract_order_id(&normalized) {
            return Ok(self
                .find_order(&order_id)
                .map(|order| Scored { item: order.clone(), score: EXACT_MATCH_SCORE })
                .into_iter()
                .collect());
        }
        if is_customer_id(&normalized) {
            let customer_id = CustomerId(normalized.to_uppercase());
            return Ok(self
                .orders
                .records()
                .iter()
                .filter(|order| order.belongs_to(&customer_id))
                .take(k.max(1))
                .map(|order| Scored { item: order.clone(), score: EXACT_MATCH_SCORE })
                .collect());
        }
        self.orders.search(query, k)
    }

    pub fn find_order(&self, order_id: &OrderId) -> Option<&Order> {
        self.orders.records().iter().find(|order| &order.order_id == order_id)
    }

    /// Distinct catalog categories in first-seen order.
    pub fn categories(&self, limit: usize) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        for item in self.catalog.records() {
            if seen.len() >= limit {
                break;
            }
            if !item.category.is_empty() && !seen.contains(&item.category) {
                seen.push(item.category.clone());
            }
        }
        seen
    }
}

fn passes_filters(item: &CatalogItem, parsed: &ParsedQuery) -> bool {
    if let Some(max_price) = parsed.max_price {
        if !item.price.is_some_and(|price| price <= Decimal::from(max_price)) {
            return false;
        }
    }
    if let Some(min_price) = parsed.min_price {
        if !item.price.is_some_and(|price| price >= Decimal::from(min_price)) {
            return false;
        }
    }
    if let Some(min_rating) = parsed.min_rating {
        if !item.rating.is_some_and(|rating| rating >= min_rating) {
            return false;
        }
    }
    if let Some(category) = &parsed.category {
        if item.category.to_lowercase() != *category {
            return false;
        }
    }
    true
}

/// Result of one tool call: the rendered text plus, for retrievals, the
/// matches the dialogue gates inspect. `None` means the lookup never ran.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ToolOutcome {
    pub text: String,
    pub catalog_matches: Option<Vec<CatalogItem>>,
    pub order_matches: Option<Vec<Order>>,
}

impl ToolOutcome {
    fn text(text: impl Into<String>) -> Self {
        Self { text: text.into(), ..Self::default() }
    }
}

/// Combined output of a batch of tool calls.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ToolBatch {
    pub output: String,
    pub executed: usize,
    pub catalog_matches: Option<Vec<CatalogItem>>,
    pub order_matches: Option<Vec<Order>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    Approved,
    Rejected,
    ConfirmationRequired,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ActionResponse {
    pub status: ActionStatus,
    pub message: String,
    pub ticket_id: Option<String>,
}

impl ActionResponse {
    fn render(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| self.message.clone())
    }
}

pub struct ToolExecutor {
    knowledge: Arc<KnowledgeBase>,
    action_log: Arc<dyn ActionLog>,
    guardrails: GuardrailPolicy,
    correlation_id: String,
}

impl ToolExecutor {
    pub fn new(
        knowledge: Arc<KnowledgeBase>,
        action_log: Arc<dyn ActionLog>,
        guardrails: GuardrailPolicy,
        correlation_id: impl Into<String>,
    ) -> Self {
        Self { knowledge, action_log, guardrails, correlation_id: correlation_id.into() }
    }

    pub fn customer_id(&self) -> Option<&CustomerId> {
        self.guardrails.customer_id.as_ref()
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    /// Runs every call in order and frames each output as
    /// `[<tool> results]:\n<text>`. Matches come from the first catalog and
    /// first orders retrieval.
    pub fn execute_all(&self, calls: &[ToolCall], default_query: &str) -> ToolBatch {
        let mut batch = ToolBatch::default();
        let mut sections = Vec::with_capacity(calls.len());

        for call in calls {
            let outcome = self.execute(call, default_query);
            sections.push(format!("[{} results]:\n{}", call.name(), outcome.text));
            if batch.catalog_matches.is_none() {
                batch.catalog_matches = outcome.catalog_matches;
            }
            if batch.order_matches.is_none() {
                batch.order_matches = outcome.order_matches;
            }
            batch.executed += 1;
        }

        batch.output = sections.join("\n").trim().to_owned();
        batch
    }

    pub fn execute(&self, call: &ToolCall, default_query: &str) -> ToolOutcome {
        tracing::info!(
            event_name = "agent.tool.executed",
            correlation_id = %self.correlation_id,
            tool = call.name(),
            mode = call.retrieve_mode().map(|mode| mode.as_str()),
            "executing tool call"
        );

        let result = match call {
            ToolCall::Retrieve(args) => self.retrieve(args, default_query),
            ToolCall::CancelOrder(args) => Ok(ToolOutcome::text(self.cancel_order(args, default_query))),
            ToolCall::InitiateReturn(args) => {
                Ok(ToolOutcome::text(self.initiate_return(args, default_query)))
            }
        };

        result.unwrap_or_else(|error| {
            tracing::warn!(
                event_name = "agent.tool.failed",
                correlation_id = %self.correlation_id,
                tool = call.name(),
                error = %error,
                "tool call failed"
            );
            ToolOutcome::text(error.user_message())
        })
    }

    fn retrieve(&self, args: &RetrieveArgs, default_query: &str) -> Result<ToolOutcome, ToolError> {
        let query = args
            .query
            .as_deref()
            .map(str::trim)
            .filter(|query| !query.is_empty())
            .unwrap_or(default_query);
        let k = clamp_k(args.k);

        match args.mode {
            RetrieveMode::Catalog => {
                let results = self.knowledge.search_catalog(query, k)?;
                Ok(ToolOutcome {
                    text: render_results(&results, "No matching products found."),
                    catalog_matches: Some(items(&results)),
                    order_matches: None,
                })
            }
            RetrieveMode::Faq => {
                let results = self.knowledge.search_faqs(query, k)?;
                Ok(ToolOutcome::text(render_results(&results, "No matching FAQs found.")))
            }
            RetrieveMode::Policy => {
                let results = self.knowledge.search_policy(query, k)?;
                Ok(ToolOutcome::text(render_results(&results, "No matching policy entries found.")))
            }
            RetrieveMode::Orders => self.retrieve_orders(query, k),
            RetrieveMode::CatalogFaq => {
                let catalog = self.knowledge.search_catalog(query, k)?;
                let faq = self.knowledge.search_faqs(query, k)?;
                let catalog_matches = items(&catalog);
                let combined = serde_json::json!({ "catalog": catalog, "faq": faq });
                Ok(ToolOutcome {
                    text: serde_json::to_string_pretty(&combined).unwrap_or_default(),
                    catalog_matches: Some(catalog_matches),
                    order_matches: None,
                })
            }
        }
    }

    fn retrieve_orders(&self, query: &str, k: usize) -> Result<ToolOutcome, ToolError> {
        let requested_customer = extract_customer_id(query);
        let decision = self.guard(&GuardrailIntent::OrderLookup {
            requested_customer: requested_customer.clone(),
        });
        if matches!(decision, GuardrailDecision::Deny { .. }) {
            return Err(ToolError::AccessDenied {
                requested: requested_customer.map(|customer| customer.0).unwrap_or_default(),
            });
        }

        let scoped_query = match self.customer_id() {
            Some(customer_id) if is_generic_order_query(query) => customer_id.as_str(),
            _ => query,
        };

        let mut results = self.knowledge.search_orders(scoped_query, MAX_K)?;
        results.retain(|scored| self.guardrails.can_view(&scored.item));
        results.truncate(k);

        Ok(ToolOutcome {
            text: render_results(&results, "No matching orders found."),
            catalog_matches: None,
            order_matches: Some(items(&results)),
        })
    }

    fn cancel_order(&self, args: &CancelOrderArgs, default_query: &str) -> String {
        let action = ActionKind::CancelOrder;
        let Some(order_id) = resolve_order_id(args.order_id.as_deref(), default_query) else {
            return self.missing_identifier(action, None, None, "order_id");
        };

        let order = match self.eligible_order(action, &order_id, None) {
            Ok(order) => order,
            Err(response) => return response.render(),
        };
        if !order.order_status.is_cancellable() {
            let reason = format!(
                "Order is not eligible for cancellation (status: {}).",
                order.order_status
            );
            return self.reject(action, Some(order_id), None, reason).render();
        }

        self.submit(action, order_id, None, args.confirm, "Cancellation request submitted.")
            .render()
    }

    fn initiate_return(&self, args: &InitiateReturnArgs, default_query: &str) -> String {
        let action = ActionKind::InitiateReturn;
        let order_id = resolve_order_id(args.order_id.as_deref(), default_query);
        let product_id = resolve_product_id(args.product_id.as_deref(), default_query);
        let (order_id, product_id) = match (order_id, product_id) {
            (Some(order_id), Some(product_id)) => (order_id, product_id),
            (None, product_id) => {
                return self.missing_identifier(action, None, product_id, "order_id");
            }
            (order_id, None) => {
                return self.missing_identifier(action, order_id, None, "product_id");
            }
        };

        let order = match self.eligible_order(action, &order_id, Some(&product_id)) {
            Ok(order) => order,
            Err(response) => return response.render(),
        };
        if !order.order_status.is_returnable() {
            let reason =
                format!("Order is not eligible for return (status: {}).", order.order_status);
            return self.reject(action, Some(order_id), Some(product_id), reason).render();
        }
        if !order.contains_product(&product_id) {
            return self
                .reject(action, Some(order_id), Some(product_id), "Product not found in order.")
                .render();
        }

        self.submit(action, order_id, Some(product_id), args.confirm, "Return request submitted.")
            .render()
    }

    /// Looks the order up and checks it belongs to the session customer.
    fn eligible_order(
        &self,
        action: ActionKind,
        order_id: &OrderId,
        product_id: Option<&ProductId>,
    ) -> Result<&Order, ActionResponse> {
        let Some(order) = self.knowledge.find_order(order_id) else {
            return Err(self.reject(
                action,
                Some(order_id.clone()),
                product_id.cloned(),
                "Order not found.",
            ));
        };

        let decision = self.guard(&GuardrailIntent::OrderOwnership {
            action,
            order_id: order_id.clone(),
            owner: order.customer_id.clone(),
        });
        if let GuardrailDecision::Deny { user_message, .. } = decision {
            return Err(self.reject(action, Some(order_id.clone()), product_id.cloned(), user_message));
        }
        Ok(order)
    }

    fn submit(
        &self,
        action: ActionKind,
        order_id: OrderId,
        product_id: Option<ProductId>,
        confirmed: bool,
        message: &str,
    ) -> ActionResponse {
        let decision = self.guard(&GuardrailIntent::ActionSubmission {
            action,
            order_id: order_id.clone(),
            product_id: product_id.clone(),
            confirmed,
        });
        if let GuardrailDecision::Degrade { user_message, .. } = decision {
            return ActionResponse {
                status: ActionStatus::ConfirmationRequired,
                message: user_message,
                ticket_id: None,
            };
        }

        let ticket_id = issue_ticket_id(action);
        self.record(ActionLogEntry::approved(
            action,
            self.customer_id().cloned(),
            order_id,
            product_id,
            ticket_id.clone(),
            message,
        ));
        ActionResponse {
            status: ActionStatus::Approved,
            message: message.to_owned(),
            ticket_id: Some(ticket_id),
        }
    }

    /// Evaluates the session guardrails and logs anything short of `Allow`.
    fn guard(&self, intent: &GuardrailIntent) -> GuardrailDecision {
        let decision = self.guardrails.evaluate(intent);
        match &decision {
            GuardrailDecision::Allow => {}
            GuardrailDecision::Deny { reason_code, fallback_path, .. } => tracing::warn!(
                event_name = "agent.guardrail.denied",
                correlation_id = %self.correlation_id,
                action_key = intent.action_key(),
                reason_code = *reason_code,
                fallback_path = *fallback_path,
                "guardrail denied tool call"
            ),
            GuardrailDecision::Degrade { reason_code, fallback_path, .. } => tracing::info!(
                event_name = "agent.guardrail.degraded",
                correlation_id = %self.correlation_id,
                action_key = intent.action_key(),
                reason_code = *reason_code,
                fallback_path = *fallback_path,
                "guardrail held tool call"
            ),
        }
        decision
    }

    fn reject(
        &self,
        action: ActionKind,
        order_id: Option<OrderId>,
        product_id: Option<ProductId>,
        reason: impl Into<String>,
    ) -> ActionResponse {
        let reason = reason.into();
        self.record(ActionLogEntry::rejected(
            action,
            self.customer_id().cloned(),
            order_id,
            product_id,
            reason.clone(),
        ));
        ActionResponse { status: ActionStatus::Rejected, message: reason, ticket_id: None }
    }

    fn missing_identifier(
        &self,
        action: ActionKind,
        order_id: Option<OrderId>,
        product_id: Option<ProductId>,
        field: &'static str,
    ) -> String {
        let message = ToolError::MissingIdentifier { tool: action.as_str(), field }.user_message();
        self.record(ActionLogEntry::rejected(
            action,
            self.customer_id().cloned(),
            order_id,
            product_id,
            message.clone(),
        ));
        message
    }

    fn record(&self, entry: ActionLogEntry) {
        tracing::info!(
            event_name = "agent.action.recorded",
            correlation_id = %self.correlation_id,
            action = entry.action.as_str(),
            result = ?entry.result,
            ticket_id = entry.ticket_id.as_deref(),
            "action outcome recorded"
        );
        if let Err(error) = self.action_log.append(&entry) {
            tracing::error!(
                event_name = "agent.action_log.write_failed",
                correlation_id = %self.correlation_id,
                error = %error,
                "failed to append action log entry"
            );
        }
    }
}

/// Explicit argument first, then an id found in the utterance.
fn resolve_order_id(explicit: Option<&str>, utterance: &str) -> Option<OrderId> {
    explicit
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| extract_order_id(value).unwrap_or_else(|| OrderId(value.to_uppercase())))
        .or_else(|| extract_order_id(utterance))
}

fn resolve_product_id(explicit: Option<&str>, utterance: &str) -> Option<ProductId> {
    explicit
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| extract_product_id(value).unwrap_or_else(|| ProductId(value.to_uppercase())))
        .or_else(|| extract_product_id(utterance))
}

fn items<R: Clone>(results: &[Scored<R>]) -> Vec<R> {
    results.iter().map(|scored| scored.item.clone()).collect()
}

fn render_results<R: Serialize>(results: &[Scored<R>], empty: &str) -> String {
    if results.is_empty() {
        return empty.to_owned();
    }
    serde_json::to_string_pretty(results).unwrap_or_else(|_| empty.to_owned())
}
