//! Language-model collaborators.
//!
//! The pipeline only talks to models through [`LanguageModel`]. Concrete
//! clients for Ollama and Gemini live in the submodules.

pub mod gemini;
pub mod ollama;
pub mod tool_schema;

pub use gemini::GeminiClient;
pub use ollama::OllamaClient;

use crate::config::{ModelConfig, Provider};
use crate::error::LlmError;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

/// A request/response language model.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Free-text generation from a system instruction and input text.
    async fn generate_text(&self, system: &str, input: &str) -> Result<String, LlmError>;

    /// Generation constrained to a JSON schema. Returns the parsed JSON value.
    async fn generate_json(
        &self,
        system: &str,
        input: &str,
        schema: &Value,
    ) -> Result<Value, LlmError>;
}

/// Schema-constrained generation deserialized straight into `T`.
pub async fn generate_structured<T: DeserializeOwned>(
    model: &dyn LanguageModel,
    system: &str,
    input: &str,
    schema: &Value,
) -> Result<T, LlmError> {
    let value = model.generate_json(system, input, schema).await?;
    serde_json::from_value(value).map_err(|e| LlmError::InvalidJson(e.to_string()))
}

/// Parse a model's text output as JSON, tolerating a surrounding code fence.
pub(crate) fn parse_json_output(text: &str) -> Result<Value, LlmError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(LlmError::EmptyResponse);
    }

    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed);

    serde_json::from_str(unfenced).map_err(|e| LlmError::InvalidJson(e.to_string()))
}

/// Map a reqwest transport error onto [`LlmError`].
pub(crate) fn transport_error(e: reqwest::Error, endpoint: &str, timeout_seconds: u64) -> LlmError {
    if e.is_timeout() {
        LlmError::Timeout(timeout_seconds)
    } else if e.is_connect() {
        LlmError::Connect(endpoint.to_string())
    } else {
        LlmError::Request(e.to_string())
    }
}

/// Build the configured model client.
pub fn build_model(config: &ModelConfig) -> Result<Arc<dyn LanguageModel>> {
    match config.provider {
        Provider::Ollama => Ok(Arc::new(OllamaClient::new(config)?)),
        Provider::Gemini => {
            let api_key = config
                .resolved_api_key()
                .ok_or_else(|| anyhow!("GEMINI_API_KEY not set and no api_key in config"))?;
            Ok(Arc::new(GeminiClient::new(config, api_key)?))
        }
    }
}
