//! Language-model collaborator contract.
//!
//! The agent only needs two calls: schema-constrained generation for routing
//! and free-form chat for replies. Both are fallible; callers decide the
//! fallback.

pub mod credentials;
pub mod openai;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::conversation::Message;

pub use credentials::CredentialPool;
pub use openai::{OpenAiCompatibleClient, OpenAiSettings};

const ROTATION_KEYWORDS: [&str; 8] = [
    "rate limit",
    "too many requests",
    "quota",
    "unauthorized",
    "authentication",
    "api key",
    "permission",
    "forbidden",
];

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LlmError {
    #[error("no api keys are configured")]
    NoCredentials,
    #[error("model endpoint returned {status}: {body}")]
    Http { status: u16, body: String },
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("request exceeded the {0}s deadline")]
    Timeout(u64),
    #[error("model returned an empty response")]
    EmptyResponse,
    #[error("model output is not valid json: {0}")]
    InvalidJson(String),
    #[error("gave up after {attempts} attempts; last error: {last_error}")]
    Exhausted { attempts: usize, last_error: String },
}

impl LlmError {
    /// Authentication and rate-limit class failures move the pool to the
    /// next key; everything else retries on the same key.
    pub fn should_rotate_key(&self) -> bool {
        match self {
            Self::Http { status, .. } if matches!(status, 401 | 403 | 429) => true,
            other => {
                let message = other.to_string().to_lowercase();
                ROTATION_KEYWORDS.iter().any(|keyword| message.contains(keyword))
            }
        }
    }
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generates one JSON object constrained to `schema`.
    async fn generate_structured(
        &self,
        prompt: &str,
        system_prompt: &str,
        schema: &Value,
    ) -> Result<Value, LlmError>;

    async fn chat(&self, messages: &[Message]) -> Result<String, LlmError>;
}
