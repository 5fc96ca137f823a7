//! LLM interaction: the [`TextGenerator`] seam and its edgequake-llm adapter.
//!
//! The pipeline steps only ever need "prompt in, free text out". Keeping that
//! behind a trait lets tests script responses and record prompts without a
//! live provider. All prompt engineering lives in [`crate::prompts`].
//!
//! There is no retry here: one prompt, one provider call.

use crate::config::PipelineConfig;
use crate::error::ComplianceError;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Model used when a provider is named without a model.
pub const DEFAULT_MODEL: &str = "gpt-4.1-nano";

/// Produces free text for a prompt.
///
/// `Ok(None)` means the model answered with nothing usable (empty content).
/// `Err` is reserved for transport, auth and quota failures.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<Option<String>, ComplianceError>;
}

/// [`TextGenerator`] backed by an `edgequake_llm` provider.
pub struct LlmGenerator {
    provider: Arc<dyn LLMProvider>,
    options: CompletionOptions,
}

impl LlmGenerator {
    pub fn new(provider: Arc<dyn LLMProvider>, config: &PipelineConfig) -> Self {
        Self {
            provider,
            options: build_options(config),
        }
    }

    /// Resolve a provider from `config` and the environment, then wrap it.
    pub fn from_config(config: &PipelineConfig) -> Result<Self, ComplianceError> {
        let provider = resolve_provider(config)?;
        Ok(Self::new(provider, config))
    }
}

#[async_trait]
impl TextGenerator for LlmGenerator {
    async fn generate(&self, prompt: &str) -> Result<Option<String>, ComplianceError> {
        let start = Instant::now();
        let messages = vec![ChatMessage::user(prompt)];

        let response = self
            .provider
            .chat(&messages, Some(&self.options))
            .await
            .map_err(|e| {
                warn!("LLM call failed: {}", e);
                ComplianceError::LlmApiError {
                    message: e.to_string(),
                }
            })?;

        debug!(
            "LLM: {} input tokens, {} output tokens, {} chars, {:?}",
            response.prompt_tokens,
            response.completion_tokens,
            response.content.len(),
            start.elapsed()
        );

        if response.content.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(response.content))
    }
}

/// Build `CompletionOptions` from the pipeline config.
fn build_options(config: &PipelineConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, ComplianceError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        ComplianceError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Where a provider comes from once no pre-built one is supplied.
#[derive(Debug, PartialEq, Eq)]
enum ProviderSource {
    Named { provider: String, model: String },
    AutoDetect,
}

/// Pick a provider source. `env` returns a variable's value, or `None`
/// when it is unset or empty.
///
/// A name in `config` beats the `EDGEQUAKE_LLM_PROVIDER`/`EDGEQUAKE_MODEL`
/// pair, which beats `OPENAI_API_KEY`. Anything else is auto-detected.
fn choose_source(config: &PipelineConfig, env: impl Fn(&str) -> Option<String>) -> ProviderSource {
    let model = || config.model.clone().unwrap_or_else(|| DEFAULT_MODEL.to_string());

    if let Some(name) = &config.provider_name {
        return ProviderSource::Named { provider: name.clone(), model: model() };
    }
    if let (Some(provider), Some(model)) = (env("EDGEQUAKE_LLM_PROVIDER"), env("EDGEQUAKE_MODEL")) {
        return ProviderSource::Named { provider, model };
    }
    if env("OPENAI_API_KEY").is_some() {
        return ProviderSource::Named { provider: "openai".into(), model: model() };
    }
    ProviderSource::AutoDetect
}

fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Resolve the provider: `config.provider` as-is, else whatever
/// `choose_source` settles on from the config and the process environment.
pub fn resolve_provider(config: &PipelineConfig) -> Result<Arc<dyn LLMProvider>, ComplianceError> {
    if let Some(provider) = &config.provider {
        return Ok(Arc::clone(provider));
    }

    match choose_source(config, process_env) {
        ProviderSource::Named { provider, model } => {
            debug!(%provider, %model, "using named LLM provider");
            create_provider(&provider, &model)
        }
        ProviderSource::AutoDetect => {
            let (llm, _embedding) = ProviderFactory::from_env().map_err(|e| {
                ComplianceError::ProviderNotConfigured {
                    provider: "auto".to_string(),
                    hint: format!(
                        "no provider found in the environment ({e}); \
                         set OPENAI_API_KEY or EDGEQUAKE_LLM_PROVIDER and EDGEQUAKE_MODEL"
                    ),
                }
            })?;
            Ok(llm)
        }
    }
}
