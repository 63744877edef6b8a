//! Inference Provider Trait
//!
//! Common interface for the backends that turn a circuit description into
//! netlist text (hosted Hugging Face inference, local Ollama).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::ai::ProviderError;

/// Information about the model behind a provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Provider name (e.g., "huggingface", "ollama")
    pub provider: String,

    /// Model name (e.g., "Remiwe/T5_final")
    pub model_name: String,

    /// Whether the model runs on this machine
    pub is_local: bool,

    /// Upper bound on generated length in tokens
    pub max_output_tokens: usize,
}

/// Decoding parameters for the seq2seq model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub max_length: usize,
    pub num_beams: u32,
    pub repetition_penalty: f32,
    pub early_stopping: bool,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_length: 512,
            num_beams: 10,
            repetition_penalty: 2.5,
            early_stopping: true,
        }
    }
}

/// Common trait for all inference providers
#[async_trait]
pub trait InferenceProvider: Send + Sync {
    /// Get the provider name
    fn name(&self) -> &str;

    /// Make sure the model can serve requests. Called once per translator.
    async fn load(&self) -> Result<ModelInfo, ProviderError>;

    /// Generate netlist text for a prompt. No timeout or retry here; the
    /// translator owns both.
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError>;

    /// Get model info
    fn model_info(&self) -> ModelInfo;
}
