use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;

use crate::error::{CarePlanError, CarePlanResult};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub extraction: ExtractionConfig,
    pub knowledge: KnowledgeConfig,
    pub llm: LlmConfig,
    pub planner: PlannerConfig,
    pub logging: LoggingConfig,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_request_size: usize,
    pub timeout_seconds: u64,
}

/// Report text extraction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Reports with fewer characters of text are treated as scanned.
    pub min_text_chars: usize,
    pub summary_max_chars: usize,
    /// Value reported for fields the report does not mention.
    pub missing_value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeConfig {
    pub top_k: usize,
    /// Oldest documents are evicted past this bound. Unbounded when unset.
    pub max_documents: Option<usize>,
    /// Characters of each context document echoed back in API responses.
    pub preview_chars: usize,
}

/// Chat-completion service used for plan generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub enabled: bool,
    pub api_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_seconds: u64,
    /// Also ask the service to fill fields pattern extraction missed.
    pub structured_extraction: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub default_city: String,
    pub hospital_suggestions: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub file_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    pub metrics_enabled: bool,
    pub prometheus_namespace: String,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(
                File::with_name(&format!(
                    "config/{}",
                    env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into())
                ))
                .required(false),
            )
            // Add local config (gitignored)
            .add_source(File::with_name("config/local").required(false))
            .add_source(Environment::with_prefix("CAREPLAN").separator("__"));

        config.build()?.try_deserialize()
    }

    /// Reject settings the service cannot run with.
    pub fn validate(&self) -> CarePlanResult<()> {
        if self.knowledge.top_k == 0 {
            return Err(CarePlanError::configuration("knowledge.top_k must be at least 1"));
        }
        if self.knowledge.max_documents == Some(0) {
            return Err(CarePlanError::configuration(
                "knowledge.max_documents must be at least 1 when set",
            ));
        }
        if self.extraction.missing_value.trim().is_empty() {
            return Err(CarePlanError::configuration("extraction.missing_value must not be blank"));
        }
        if self.llm.enabled && self.llm.api_url.trim().is_empty() {
            return Err(CarePlanError::configuration("llm.api_url is required when llm.enabled is set"));
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            max_request_size: 16 * 1024 * 1024, // 16MB
            timeout_seconds: 60,
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_text_chars: 100,
            summary_max_chars: 2000,
            missing_value: "Not mentioned".to_string(),
        }
    }
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            max_documents: None,
            preview_chars: 300,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_url: "https://api.groq.com/openai/v1/chat/completions".to_string(),
            api_key: None,
            model: "llama-3.1-8b-instant".to_string(),
            max_tokens: 800,
            temperature: 0.3,
            timeout_seconds: 30,
            structured_extraction: false,
        }
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            default_city: "bangalore".to_string(),
            hospital_suggestions: 2,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "json".to_string(),
            file_path: None,
        }
    }
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
            prometheus_namespace: "careplan".to_string(),
        }
    }
}
