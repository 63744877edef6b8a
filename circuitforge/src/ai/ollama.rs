//! Ollama Client for Local Inference
//!
//! Generates netlists with a local Ollama model. General-purpose models are
//! not trained on the canonical description format, so the prompt is wrapped
//! in an instruction first.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::ai::prompts::build_instruction_prompt;
use crate::ai::provider::{InferenceProvider, ModelInfo};
use crate::ai::ProviderError;
use crate::config::{ForgeConfig, DEFAULT_API_URL, DEFAULT_MODEL};

const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
const DEFAULT_OLLAMA_MODEL: &str = "llama3.1:8b";
const REQUEST_TIMEOUT_SECS: u64 = 120;
const MAX_OUTPUT_TOKENS: i32 = 512;

/// Client for interacting with Ollama
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: i32, // max tokens
    top_p: f32,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
    #[allow(dead_code)]
    done: bool,
}

#[derive(Debug, Deserialize)]
struct OllamaModelList {
    models: Vec<OllamaModel>,
}

#[derive(Debug, Deserialize)]
struct OllamaModel {
    name: String,
}

impl OllamaClient {
    /// Create a new Ollama client
    pub fn new(base_url: Option<String>, model: Option<String>) -> Self {
        Self::with_timeout(base_url, model, Duration::from_secs(REQUEST_TIMEOUT_SECS))
    }

    pub fn with_timeout(base_url: Option<String>, model: Option<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: base_url.unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string()),
            model: model.unwrap_or_else(|| DEFAULT_OLLAMA_MODEL.to_string()),
        }
    }

    /// Build from config. The hosted defaults make no sense for a local
    /// server and are replaced by the Ollama ones.
    pub fn from_config(config: &ForgeConfig) -> Self {
        let base_url = Some(config.api_url.clone()).filter(|url| url != DEFAULT_API_URL);
        let model = Some(config.model.clone()).filter(|model| model != DEFAULT_MODEL);
        Self::with_timeout(
            base_url,
            model,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    /// List available models
    pub async fn list_models(&self) -> Result<Vec<String>, ProviderError> {
        let url = format!("{}/api/tags", self.base_url.trim_end_matches('/'));

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(ProviderError::ApiError {
                status: response.status().as_u16(),
                message: "Failed to list models".to_string(),
            });
        }

        let models: OllamaModelList = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        Ok(models.models.into_iter().map(|m| m.name).collect())
    }

    /// Get the current model
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn serves_model(&self, names: &[String]) -> bool {
        names
            .iter()
            .any(|name| name.starts_with(&self.model) || self.model.starts_with(name.as_str()))
    }
}

impl Default for OllamaClient {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[async_trait]
impl InferenceProvider for OllamaClient {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn load(&self) -> Result<ModelInfo, ProviderError> {
        let models = self.list_models().await?;
        if !self.serves_model(&models) {
            return Err(ProviderError::ModelNotFound(self.model.clone()));
        }
        Ok(self.model_info())
    }

    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let url = format!("{}/api/generate", self.base_url.trim_end_matches('/'));

        let request = OllamaRequest {
            model: self.model.clone(),
            prompt: build_instruction_prompt(prompt),
            stream: false,
            options: OllamaOptions {
                temperature: 0.1,
                num_predict: MAX_OUTPUT_TOKENS,
                top_p: 0.9,
            },
        };

        tracing::debug!("Sending request to Ollama: {}", self.model);

        let response = self.client.post(&url).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError { status, message });
        }

        let ollama_response: OllamaResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        Ok(ollama_response.response)
    }

    fn model_info(&self) -> ModelInfo {
        ModelInfo {
            provider: "ollama".to_string(),
            model_name: self.model.clone(),
            is_local: true,
            max_output_tokens: MAX_OUTPUT_TOKENS as usize,
        }
    }
}
