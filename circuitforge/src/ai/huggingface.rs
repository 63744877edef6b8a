//! Hugging Face Inference Client
//!
//! Calls the hosted text2text-generation endpoint of a seq2seq model
//! (`POST {base}/models/{model}`) with T5 beam-search parameters.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::ai::provider::{GenerationParams, InferenceProvider, ModelInfo};
use crate::ai::ProviderError;
use crate::config::{ForgeConfig, DEFAULT_API_URL, DEFAULT_MODEL};

const REQUEST_TIMEOUT_SECS: u64 = 120;
const WARMUP_PROMPT: &str = "A series circuit with 12V source, a 1k resistor.";

/// Client for a hosted Hugging Face model
pub struct HuggingFaceClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    params: GenerationParams,
}

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: &'a GenerationParams,
    options: InferenceOptions,
}

#[derive(Debug, Serialize)]
struct InferenceOptions {
    wait_for_model: bool,
    use_cache: bool,
}

#[derive(Debug, Deserialize)]
struct Generated {
    #[serde(alias = "translation_text", alias = "summary_text")]
    generated_text: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InferenceResponse {
    Batch(Vec<Generated>),
    Single(Generated),
    Error {
        error: String,
        #[serde(default)]
        estimated_time: Option<f64>,
    },
}

impl HuggingFaceClient {
    /// Create a new client; `None` falls back to the public endpoint and
    /// the default model.
    pub fn new(base_url: Option<String>, model: Option<String>, api_key: Option<String>) -> Self {
        Self::with_timeout(
            base_url,
            model,
            api_key,
            Duration::from_secs(REQUEST_TIMEOUT_SECS),
        )
    }

    pub fn with_timeout(
        base_url: Option<String>,
        model: Option<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: base_url.unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            api_key,
            params: GenerationParams::default(),
        }
    }

    pub fn from_config(config: &ForgeConfig) -> Self {
        Self::with_timeout(
            Some(config.api_url.clone()),
            Some(config.model.clone()),
            config.api_key.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    /// Override the decoding parameters
    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    pub fn endpoint(&self) -> String {
        format!("{}/models/{}", self.base_url.trim_end_matches('/'), self.model)
    }

    async fn infer(&self, inputs: &str) -> Result<String, ProviderError> {
        let request = InferenceRequest {
            inputs,
            parameters: &self.params,
            options: InferenceOptions {
                wait_for_model: true,
                use_cache: false,
            },
        };

        tracing::debug!("Sending request to Hugging Face: {}", self.model);

        let mut builder = self.client.post(self.endpoint()).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        let response = builder.send().await?;

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok());
        let body = response.text().await?;

        if status == 429 {
            return Err(ProviderError::RateLimited {
                retry_after: retry_after.unwrap_or(1),
            });
        }
        parse_response(&self.model, status, &body)
    }
}

/// Interpret an inference API reply.
fn parse_response(model: &str, status: u16, body: &str) -> Result<String, ProviderError> {
    let parsed = serde_json::from_str::<InferenceResponse>(body);

    if (200..300).contains(&status) {
        return match parsed {
            Ok(InferenceResponse::Batch(items)) => items
                .into_iter()
                .next()
                .map(|g| g.generated_text)
                .ok_or_else(|| ProviderError::InvalidResponse("empty generation list".to_string())),
            Ok(InferenceResponse::Single(item)) => Ok(item.generated_text),
            Ok(InferenceResponse::Error { error, .. }) => Err(ProviderError::ApiError {
                status,
                message: error,
            }),
            Err(e) => Err(ProviderError::ParseError(e.to_string())),
        };
    }

    match (status, parsed) {
        (404, _) => Err(ProviderError::ModelNotFound(model.to_string())),
        (
            503,
            Ok(InferenceResponse::Error {
                estimated_time: Some(estimated_secs),
                ..
            }),
        ) => Err(ProviderError::Loading {
            model: model.to_string(),
            estimated_secs,
        }),
        (_, Ok(InferenceResponse::Error { error, .. })) => Err(ProviderError::ApiError {
            status,
            message: error,
        }),
        _ => Err(ProviderError::ApiError {
            status,
            message: body.trim().to_string(),
        }),
    }
}

#[async_trait]
impl InferenceProvider for HuggingFaceClient {
    fn name(&self) -> &str {
        "huggingface"
    }

    async fn load(&self) -> Result<ModelInfo, ProviderError> {
        // The hosted API loads the model on the first request.
        self.infer(WARMUP_PROMPT).await?;
        Ok(self.model_info())
    }

    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        self.infer(prompt).await
    }

    fn model_info(&self) -> ModelInfo {
        ModelInfo {
            provider: "huggingface".to_string(),
            model_name: self.model.clone(),
            is_local: false,
            max_output_tokens: self.params.max_length,
        }
    }
}
