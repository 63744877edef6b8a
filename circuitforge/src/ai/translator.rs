//! Description → netlist translation.
//!
//! A [`Translator`] owns one provider and the lazily loaded model handle.
//! The handle lives in a `tokio::sync::OnceCell`: concurrent first callers
//! wait on a single load, later callers read it without locking. A failed
//! load is not cached; the next request tries again.

use std::borrow::Cow;
use std::future::Future;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tokio::sync::OnceCell;
use tokio::time::{sleep, timeout};

use crate::ai::huggingface::HuggingFaceClient;
use crate::ai::ollama::OllamaClient;
use crate::ai::provider::{InferenceProvider, ModelInfo};
use crate::ai::{ProviderError, TranslateError};
use crate::config::{ForgeConfig, ProviderKind};

const MAX_RETRIES: u32 = 1;

static GLOBAL: OnceLock<Translator> = OnceLock::new();

pub struct Translator {
    provider: Arc<dyn InferenceProvider>,
    model: OnceCell<ModelInfo>,
    request_timeout: Duration,
    retry_delay: Duration,
    max_prompt_chars: usize,
}

impl Translator {
    /// Wrap `provider` with the default timeout, retry delay and prompt limit.
    pub fn new(provider: Arc<dyn InferenceProvider>) -> Self {
        let defaults = ForgeConfig::default();
        Self {
            provider,
            model: OnceCell::new(),
            request_timeout: Duration::from_secs(defaults.request_timeout_secs),
            retry_delay: Duration::from_millis(defaults.retry_delay_ms),
            max_prompt_chars: defaults.max_prompt_chars,
        }
    }

    pub fn from_config(config: &ForgeConfig) -> Self {
        let provider: Arc<dyn InferenceProvider> = match config.provider {
            ProviderKind::HuggingFace => Arc::new(HuggingFaceClient::from_config(config)),
            ProviderKind::Ollama => Arc::new(OllamaClient::from_config(config)),
        };
        Self::new(provider)
            .with_timeout(Duration::from_secs(config.request_timeout_secs))
            .with_retry_delay(Duration::from_millis(config.retry_delay_ms))
            .with_max_prompt_chars(config.max_prompt_chars)
    }

    pub fn with_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    pub fn with_max_prompt_chars(mut self, max_prompt_chars: usize) -> Self {
        self.max_prompt_chars = max_prompt_chars;
        self
    }

    /// Process-wide translator, configured from the environment on first use.
    pub fn global() -> &'static Translator {
        GLOBAL.get_or_init(|| {
            let config = ForgeConfig::from_env().unwrap_or_else(|e| {
                tracing::warn!("Ignoring invalid environment configuration: {}", e);
                ForgeConfig::default()
            });
            Translator::from_config(&config)
        })
    }

    /// Initialize the process-wide translator from `config`. Has no effect
    /// if it already exists.
    pub fn init_global(config: &ForgeConfig) -> &'static Translator {
        let mut created = false;
        let translator = GLOBAL.get_or_init(|| {
            created = true;
            Translator::from_config(config)
        });
        if !created {
            tracing::debug!("Global translator already initialized; keeping existing config");
        }
        translator
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn is_loaded(&self) -> bool {
        self.model.initialized()
    }

    /// Model info once loaded
    pub fn model_info(&self) -> Option<&ModelInfo> {
        self.model.get()
    }

    /// Load the model if it is not loaded yet.
    pub async fn load(&self) -> Result<&ModelInfo, TranslateError> {
        self.model
            .get_or_try_init(|| async {
                tracing::info!("Loading model via {}", self.provider.name());
                let info = self
                    .call_with_retry("load", || self.provider.load())
                    .await?;
                tracing::info!("Model {} ready ({})", info.model_name, info.provider);
                Ok::<ModelInfo, ProviderError>(info)
            })
            .await
            .map_err(|e| TranslateError::ModelUnavailable(e.to_string()))
    }

    /// Translate a description into raw model output.
    ///
    /// The output is returned untouched; cleaning is the caller's choice.
    pub async fn translate(&self, prompt: &str) -> Result<String, TranslateError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(TranslateError::EmptyPrompt);
        }
        let prompt = truncate_prompt(prompt, self.max_prompt_chars);

        self.load().await?;

        tracing::debug!(
            "Translating {} chars via {}",
            prompt.chars().count(),
            self.provider.name()
        );
        self.call_with_retry("generate", || self.provider.generate(&prompt))
            .await
            .map_err(|e| TranslateError::ModelUnavailable(e.to_string()))
    }

    async fn call_with_retry<T, F, Fut>(&self, op: &str, mut call: F) -> Result<T, ProviderError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let mut retry_count = 0;
        loop {
            let result = match timeout(self.request_timeout, call()).await {
                Ok(result) => result,
                Err(_) => Err(ProviderError::Timeout(self.request_timeout.as_secs())),
            };
            match result {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && retry_count < MAX_RETRIES => {
                    retry_count += 1;
                    tracing::warn!(
                        "{} via {} failed: {}. Retrying in {}ms (attempt {}/{})",
                        op,
                        self.provider.name(),
                        e,
                        self.retry_delay.as_millis(),
                        retry_count,
                        MAX_RETRIES
                    );
                    sleep(self.retry_delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Cut `prompt` to at most `max_chars` characters.
fn truncate_prompt(prompt: &str, max_chars: usize) -> Cow<'_, str> {
    match prompt.char_indices().nth(max_chars) {
        Some((cut, _)) => {
            tracing::warn!(
                "Prompt has {} chars; truncating to {}",
                prompt.chars().count(),
                max_chars
            );
            Cow::Owned(prompt[..cut].to_string())
        }
        None => Cow::Borrowed(prompt),
    }
}
