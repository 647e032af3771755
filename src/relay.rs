//! Validation relay: summary statistics in, LLM commentary out.
//!
//! The remote text-completion service sits behind the one-method
//! [`CompletionClient`] trait so tests can swap in a mock. Concrete clients:
//!
//! - **[`ChatCompletionClient`]** posts an OpenAI-style chat-completions
//!   request (Groq by default) with a bearer token.
//! - **[`DisabledClient`]** fails every call; used when `llm.provider = "disabled"`.
//!
//! [`ValidationRelay::validate`] never returns an error. Transport failures,
//! including the bounded timeout around each call, come back as
//! [`ValidationOutcome::Failed`] with a readable message.
//!
//! No call is retried.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::LlmConfig;
use crate::error::TransportError;
use crate::models::Dataset;
use crate::summary::describe;

/// Prefix of every failure message produced by the relay.
pub const VALIDATION_ERROR_PREFIX: &str = "Error during dataset validation";

/// A text-in, text-out completion capability.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Model identifier, for logs.
    fn model_name(&self) -> &str;

    async fn complete(&self, prompt: &str) -> Result<String, TransportError>;
}

// ============ Disabled Client ============

pub struct DisabledClient;

#[async_trait]
impl CompletionClient for DisabledClient {
    fn model_name(&self) -> &str {
        "disabled"
    }

    async fn complete(&self, _prompt: &str) -> Result<String, TransportError> {
        Err(TransportError::Disabled)
    }
}

// ============ Chat Completions Client ============

/// Client for OpenAI-compatible `POST /chat/completions` endpoints.
pub struct ChatCompletionClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    max_tokens: u32,
    api_key: String,
}

impl ChatCompletionClient {
    pub fn new(config: &LlmConfig, api_key: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            endpoint: config.endpoint_url().to_string(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait]
impl CompletionClient for ChatCompletionClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String, TransportError> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "max_tokens": self.max_tokens,
        });

        let response = self
            .http
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| TransportError::MalformedResponse(e.to_string()))?;
        parse_chat_response(&json)
    }
}

/// Extract `choices[0].message.content`.
fn parse_chat_response(json: &serde_json::Value) -> Result<String, TransportError> {
    json.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .map(str::to_string)
        .ok_or_else(|| {
            TransportError::MalformedResponse("missing choices[0].message.content".to_string())
        })
}

/// Build the configured client.
///
/// | Config value | Client |
/// |-------------|----------|
/// | `"disabled"` | [`DisabledClient`] |
/// | `"groq"`, `"openai"` | [`ChatCompletionClient`] |
pub fn create_client(config: &LlmConfig) -> Result<Arc<dyn CompletionClient>> {
    match config.provider.as_str() {
        "disabled" => Ok(Arc::new(DisabledClient)),
        "groq" | "openai" => {
            let key = config.api_key.as_deref().ok_or_else(|| {
                anyhow::anyhow!("{} environment variable not set", config.api_key_env)
            })?;
            Ok(Arc::new(ChatCompletionClient::new(config, key)?))
        }
        other => bail!("Unknown llm provider: {}", other),
    }
}

// ============ Relay ============

/// Result of a validation call.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    /// Model response text.
    Insights(String),
    /// Human-readable failure, prefixed with [`VALIDATION_ERROR_PREFIX`].
    Failed(String),
}

impl ValidationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ValidationOutcome::Insights(_))
    }

    pub fn message(&self) -> &str {
        match self {
            ValidationOutcome::Insights(text) | ValidationOutcome::Failed(text) => text,
        }
    }
}

/// Render the validation prompt around a dataset's summary.
pub fn build_prompt(dataset: &Dataset) -> String {
    let summary = describe(dataset).to_json_string();
    format!(
        "The dataset has the following statistical summary:\n{}\n\n\
         Please analyze this summary and check for any anomalies, trends, or unusual observations. \
         Provide insights.",
        summary
    )
}

/// Forwards dataset summaries to a [`CompletionClient`] under a timeout.
#[derive(Clone)]
pub struct ValidationRelay {
    client: Arc<dyn CompletionClient>,
    timeout: Duration,
}

impl ValidationRelay {
    pub fn new(client: Arc<dyn CompletionClient>, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    pub async fn validate(&self, dataset: &Dataset) -> ValidationOutcome {
        let prompt = build_prompt(dataset);
        debug!(model = self.client.model_name(), prompt_len = prompt.len(), "sending validation prompt");

        let result = match tokio::time::timeout(self.timeout, self.client.complete(&prompt)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout {
                secs: self.timeout.as_secs(),
            }),
        };

        match result {
            Ok(text) => ValidationOutcome::Insights(text),
            Err(err) => {
                warn!(error = %err, "validation relay failed");
                ValidationOutcome::Failed(format!("{}: {}", VALIDATION_ERROR_PREFIX, err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Value;
    use std::sync::Mutex;

    struct Recording {
        reply: Result<String, String>,
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl CompletionClient for Recording {
        fn model_name(&self) -> &str {
            "recording"
        }

        async fn complete(&self, prompt: &str) -> Result<String, TransportError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.reply.clone().map_err(TransportError::Request)
        }
    }

    struct Stalled;

    #[async_trait]
    impl CompletionClient for Stalled {
        fn model_name(&self) -> &str {
            "stalled"
        }

        async fn complete(&self, _prompt: &str) -> Result<String, TransportError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok("too late".to_string())
        }
    }

    fn sample() -> Dataset {
        Dataset::new(
            vec!["age".into()],
            vec![vec![Value::Number(30.0)], vec![Value::Number(40.0)]],
        )
        .unwrap()
    }

    #[test]
    fn parses_first_choice() {
        let json = serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": "looks fine" } }]
        });
        assert_eq!(parse_chat_response(&json).unwrap(), "looks fine");
    }

    #[test]
    fn rejects_response_without_choices() {
        let err = parse_chat_response(&serde_json::json!({ "choices": [] })).unwrap_err();
        assert!(matches!(err, TransportError::MalformedResponse(_)));
    }

    #[test]
    fn prompt_embeds_summary() {
        let prompt = build_prompt(&sample());
        assert!(prompt.starts_with("The dataset has the following statistical summary:\n"));
        assert!(prompt.contains("\"age\""));
        assert!(prompt.contains("\"mean\": 35.0"));
        assert!(prompt.ends_with("Provide insights."));
    }

    #[tokio::test]
    async fn success_returns_insights() {
        let client = Arc::new(Recording {
            reply: Ok("no anomalies".to_string()),
            prompts: Mutex::new(Vec::new()),
        });
        let relay = ValidationRelay::new(client.clone(), Duration::from_secs(5));
        let outcome = relay.validate(&sample()).await;
        assert_eq!(outcome, ValidationOutcome::Insights("no anomalies".into()));
        assert_eq!(client.prompts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn transport_failure_becomes_message() {
        let client = Arc::new(Recording {
            reply: Err("connection refused".to_string()),
            prompts: Mutex::new(Vec::new()),
        });
        let relay = ValidationRelay::new(client, Duration::from_secs(5));
        let outcome = relay.validate(&sample()).await;
        assert!(!outcome.is_success());
        assert!(outcome.message().starts_with(VALIDATION_ERROR_PREFIX));
        assert!(outcome.message().contains("connection refused"));
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_maps_to_failure() {
        let relay = ValidationRelay::new(Arc::new(Stalled), Duration::from_secs(2));
        let outcome = relay.validate(&sample()).await;
        assert!(outcome.message().starts_with(VALIDATION_ERROR_PREFIX));
        assert!(outcome.message().contains("timed out after 2s"));
    }

    #[tokio::test]
    async fn disabled_client_fails_inline() {
        let relay = ValidationRelay::new(Arc::new(DisabledClient), Duration::from_secs(1));
        let outcome = relay.validate(&sample()).await;
        assert!(outcome.message().contains("disabled"));
    }
}
