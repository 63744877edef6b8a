pub mod huggingface;
pub mod ollama;
pub mod prompts;
pub mod provider;
pub mod translator;

use thiserror::Error;

pub use huggingface::HuggingFaceClient;
pub use ollama::OllamaClient;
pub use prompts::{build_instruction_prompt, normalize_prompt};
pub use provider::{GenerationParams, InferenceProvider, ModelInfo};
pub use translator::Translator;

/// Failure of a single provider call
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("API request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },
    #[error("Failed to parse response: {0}")]
    ParseError(String),
    #[error("Rate limited. Retry after {retry_after} seconds")]
    RateLimited { retry_after: u64 },
    #[error("Model {model} is still loading (about {estimated_secs:.0}s)")]
    Loading { model: String, estimated_secs: f64 },
    #[error("Model {0} is not available")]
    ModelNotFound(String),
    #[error("Request timed out after {0}s")]
    Timeout(u64),
    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    /// Worth one more attempt: transport failures, timeouts, 429 and 5xx.
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::RequestFailed(_)
            | ProviderError::RateLimited { .. }
            | ProviderError::Loading { .. }
            | ProviderError::Timeout(_) => true,
            ProviderError::ApiError { status, .. } => *status == 429 || *status >= 500,
            ProviderError::ParseError(_)
            | ProviderError::ModelNotFound(_)
            | ProviderError::InvalidResponse(_) => false,
        }
    }
}

/// Errors surfaced by [`Translator::translate`]
#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("Prompt is empty")]
    EmptyPrompt,
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(ProviderError::Timeout(120).is_transient());
        assert!(ProviderError::RateLimited { retry_after: 1 }.is_transient());
        assert!(ProviderError::ApiError {
            status: 503,
            message: String::new()
        }
        .is_transient());
        assert!(!ProviderError::ApiError {
            status: 400,
            message: String::new()
        }
        .is_transient());
        assert!(!ProviderError::ModelNotFound("t5".into()).is_transient());
        assert!(!ProviderError::ParseError("eof".into()).is_transient());
    }
}
