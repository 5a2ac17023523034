//! Text Generation Client
//!
//! OpenAI-compatible chat completion client used for plan generation and
//! structured field extraction. Callers only ever see a
//! [`GenerationOutcome`]; transport and API errors never propagate.

use anyhow::{Context, Result};
use async_trait::async_trait;
use careplan_utils::{CarePlanError, CarePlanResult, LlmConfig};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Result of one generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    Success(String),
    Failure(String),
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> GenerationOutcome;

    /// Disabled generators are skipped entirely by the planner.
    fn is_enabled(&self) -> bool {
        true
    }
}

/// Chat completion client
pub struct ChatCompletionClient {
    client: Client,
    api_url: String,
    api_key: Option<String>,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl ChatCompletionClient {
    pub fn new(config: &LlmConfig) -> CarePlanResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| CarePlanError::configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let mut builder = self
            .client
            .post(&self.api_url)
            .header("Content-Type", "application/json")
            .json(&request);
        if let Some(api_key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = builder.send().await.context("Failed to call chat completion API")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Chat completion API error ({}): {}", status, error_text);
        }

        let result: ChatResponse = response
            .json()
            .await
            .context("Failed to parse chat completion response")?;

        let content = result
            .choices
            .first()
            .map(|c| c.message.content.trim().to_string())
            .context("No response content")?;

        if content.is_empty() {
            anyhow::bail!("Chat completion returned empty content");
        }
        Ok(content)
    }
}

#[async_trait]
impl TextGenerator for ChatCompletionClient {
    async fn generate(&self, prompt: &str) -> GenerationOutcome {
        match self.complete(prompt).await {
            Ok(text) => {
                debug!(model = %self.model, chars = text.len(), "Text generation succeeded");
                GenerationOutcome::Success(text)
            }
            Err(e) => {
                warn!(model = %self.model, error = %e, "Text generation failed");
                GenerationOutcome::Failure(e.to_string())
            }
        }
    }
}

/// Generator used when no text-generation service is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledGenerator;

#[async_trait]
impl TextGenerator for DisabledGenerator {
    async fn generate(&self, _prompt: &str) -> GenerationOutcome {
        GenerationOutcome::Failure("text generation disabled".to_string())
    }

    fn is_enabled(&self) -> bool {
        false
    }
}

pub fn generator_from_config(config: &LlmConfig) -> CarePlanResult<Arc<dyn TextGenerator>> {
    if !config.enabled {
        return Ok(Arc::new(DisabledGenerator));
    }
    Ok(Arc::new(ChatCompletionClient::new(config)?))
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

/// Fields returned by a structured extraction prompt. Absent or blank values
/// hold the missing-value sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredFields {
    pub patient_name: String,
    pub age: String,
    pub gender: String,
    pub chief_complaint: String,
    pub key_findings: String,
    pub risk_factors: String,
    pub final_diagnosis: String,
}

/// Parse the JSON object embedded in a generation response.
///
/// Returns `None` when the response holds no parseable object.
pub fn parse_structured_fields(response: &str, missing: &str) -> Option<StructuredFields> {
    let start = response.find('{')?;
    let end = response.rfind('}')?;
    if end < start {
        return None;
    }

    let value: Value = match serde_json::from_str(&response[start..=end]) {
        Ok(value) => value,
        Err(e) => {
            debug!(error = %e, "Structured extraction response is not valid JSON");
            return None;
        }
    };
    let object = value.as_object()?;

    let field = |key: &str| -> String {
        let text = match object.get(key) {
            Some(Value::String(s)) => s.trim().to_string(),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            _ => String::new(),
        };
        if text.is_empty() {
            missing.to_string()
        } else {
            text
        }
    };

    Some(StructuredFields {
        patient_name: field("patient_name"),
        age: field("age"),
        gender: field("gender"),
        chief_complaint: field("chief_complaint"),
        key_findings: field("key_findings"),
        risk_factors: field("risk_factors"),
        final_diagnosis: field("final_diagnosis"),
    })
}
