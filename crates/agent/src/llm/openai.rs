use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use shopdesk_core::config::LlmConfig;

use crate::conversation::Message;
use crate::llm::{CredentialPool, LlmClient, LlmError};

const SCHEMA_NAME: &str = "routing_plan";
const RETRY_BACKOFF: Duration = Duration::from_millis(250);

#[derive(Clone, Debug)]
pub struct OpenAiSettings {
    pub base_url: String,
    pub chat_model: String,
    pub router_model: String,
    pub timeout_secs: u64,
    pub retries_per_key: u32,
    pub chat_temperature: f32,
    pub router_temperature: f32,
}

impl From<&LlmConfig> for OpenAiSettings {
    fn from(config: &LlmConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            chat_model: config.chat_model.clone(),
            router_model: config.router_model.clone(),
            timeout_secs: config.timeout_secs,
            retries_per_key: config.retries_per_key,
            chat_temperature: config.chat_temperature,
            router_temperature: config.router_temperature,
        }
    }
}

/// Client for any endpoint speaking the OpenAI chat-completions protocol.
///
/// Every request carries a per-call deadline. Failures are retried up to
/// `pool size * retries_per_key` times, rotating keys on auth or rate-limit
/// errors, and end in [`LlmError::Exhausted`].
#[derive(Clone)]
pub struct OpenAiCompatibleClient {
    http: reqwest::Client,
    pool: Arc<CredentialPool>,
    settings: OpenAiSettings,
    correlation_id: String,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<Value>,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiCompatibleClient {
    pub fn new(
        pool: Arc<CredentialPool>,
        settings: OpenAiSettings,
        correlation_id: impl Into<String>,
    ) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|error| LlmError::Transport(error.to_string()))?;
        Ok(Self { http, pool, settings, correlation_id: correlation_id.into() })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.settings.base_url.trim_end_matches('/'))
    }

    async fn complete_once(&self, request: &CompletionRequest<'_>) -> Result<String, LlmError> {
        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(self.pool.current().expose_secret())
            .json(request)
            .send()
            .await
            .map_err(|error| self.transport_error(error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Http { status: status.as_u16(), body });
        }

        let parsed: CompletionResponse =
            response.json().await.map_err(|error| self.transport_error(error))?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(LlmError::EmptyResponse)
    }

    fn transport_error(&self, error: reqwest::Error) -> LlmError {
        if error.is_timeout() {
            LlmError::Timeout(self.settings.timeout_secs)
        } else {
            LlmError::Transport(error.to_string())
        }
    }

    async fn complete_with_retries<T, F>(
        &self,
        request: &CompletionRequest<'_>,
        operation: &'static str,
        accept: F,
    ) -> Result<T, LlmError>
    where
        F: Fn(String) -> Result<T, LlmError>,
    {
        let attempts = self.pool.attempt_budget(self.settings.retries_per_key);
        let mut last_error = LlmError::EmptyResponse;

        for attempt in 1..=attempts {
            match self.complete_once(request).await.and_then(&accept) {
                Ok(value) => return Ok(value),
                Err(error) => {
                    tracing::warn!(
                        event_name = "agent.llm.attempt_failed",
                        correlation_id = %self.correlation_id,
                        operation,
                        attempt,
                        attempts,
                        error = %error,
                        "model call failed"
                    );
                    if error.should_rotate_key() {
                        let key_index = self.pool.rotate();
                        tracing::info!(
                            event_name = "agent.llm.key_rotated",
                            correlation_id = %self.correlation_id,
                            key_index,
                            "rotated to next api key"
                        );
                    }
                    last_error = error;
                    if attempt < attempts {
                        tokio::time::sleep(RETRY_BACKOFF).await;
                    }
                }
            }
        }

        Err(LlmError::Exhausted { attempts, last_error: last_error.to_string() })
    }
}

/// Closes the schema for strict mode: every object rejects unknown keys.
pub fn strict_schema(schema: &Value) -> Value {
    let mut schema = schema.clone();
    if let Some(object) = schema.as_object_mut() {
        object.entry("type").or_insert_with(|| json!("object"));
        object.entry("additionalProperties").or_insert(Value::Bool(false));
    }
    schema
}

#[async_trait]
impl LlmClient for OpenAiCompatibleClient {
    async fn generate_structured(
        &self,
        prompt: &str,
        system_prompt: &str,
        schema: &Value,
    ) -> Result<Value, LlmError> {
        let messages = [Message::system(system_prompt), Message::user(prompt)];
        let request = CompletionRequest {
            model: &self.settings.router_model,
            messages: &messages,
            temperature: self.settings.router_temperature,
            response_format: Some(json!({
                "type": "json_schema",
                "json_schema": {
                    "name": SCHEMA_NAME,
                    "strict": true,
                    "schema": strict_schema(schema),
                }
            })),
        };

        self.complete_with_retries(&request, "generate_structured", |content| {
            serde_json::from_str::<Value>(&content)
                .map_err(|error| LlmError::InvalidJson(error.to_string()))
        })
        .await
    }

    async fn chat(&self, messages: &[Message]) -> Result<String, LlmError> {
        let request = CompletionRequest {
            model: &self.settings.chat_model,
            messages,
            temperature: self.settings.chat_temperature,
            response_format: None,
        };

        self.complete_with_retries(&request, "chat", Ok).await
    }
}
