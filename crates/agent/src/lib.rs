//! Conversational runtime for the shopdesk assistant.
//!
//! Each turn follows a constrained loop:
//! 1. **Short-circuits** (`runtime`) - customer-id and purchase phrases answered directly
//! 2. **Routing** (`router`) - structured model call, strict validation, deterministic repairs
//! 3. **Tool execution** (`tools`) - retrieval, cancellation and returns behind `guardrails`
//! 4. **Clarification** (`disambiguation`) - ambiguous or empty results answered without generation
//! 5. **Generation** - token-bounded window from `conversation` sent to the chat model
//!
//! # Safety Principle
//!
//! The model only routes and phrases. Eligibility, ownership and ticket
//! issuance are decided by the executor, and every outcome is written to the
//! action log.

pub mod conversation;
pub mod cues;
pub mod disambiguation;
pub mod guardrails;
pub mod llm;
pub mod router;
pub mod runtime;
pub mod tools;

pub use conversation::{ConversationState, FocusEntity, Message, Role};
pub use guardrails::{GuardrailDecision, GuardrailIntent, GuardrailPolicy};
pub use llm::{CredentialPool, LlmClient, LlmError, OpenAiCompatibleClient, OpenAiSettings};
pub use router::{apply_repairs, IntentRouter, Route, RoutingPlan};
pub use runtime::{run_session, ConversationChannel, DialogueOrchestrator, TurnOutcome, TurnPath};
pub use tools::{KnowledgeBase, RetrieveMode, ToolCall, ToolExecutor, ToolRegistry};
