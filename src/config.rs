//! Configuration for the compliance pipeline.
//!
//! All library behaviour is controlled through [`PipelineConfig`], built via
//! its [`PipelineConfigBuilder`]. The config is read once at start-up to
//! construct the process-wide LLM handle and archive; nothing in it is
//! mutated afterwards.

use crate::error::ComplianceError;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// ISO standard used when a request does not name one.
pub const DEFAULT_ISO_STANDARD: &str = "ISO 9001:2015";

/// Document type used when a request does not name one.
pub const DEFAULT_DOCUMENT_TYPE: &str = "quality_system_record";

/// Configuration for the compliance pipeline.
///
/// # Example
/// ```rust
/// use compliance_master::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .model("gpt-4.1-mini")
///     .save_local_copies(true)
///     .build()
///     .unwrap();
/// assert_eq!(config.max_tokens, 2000);
/// ```
#[derive(Clone)]
pub struct PipelineConfig {
    /// LLM model identifier, e.g. "gpt-4.1-nano", "claude-sonnet-4-20250514".
    /// If None, uses the provider default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    /// If None along with `provider`, the provider is auto-detected.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature. Default: 0.1.
    ///
    /// Extraction and grading need the model to answer in a fixed JSON shape;
    /// near-greedy decoding keeps it there.
    pub temperature: f32,

    /// Maximum tokens per LLM response. Default: 2000.
    pub max_tokens: usize,

    /// Archive every generate / check / workflow result as a JSON file.
    /// Default: false.
    pub save_local_copies: bool,

    /// Directory for archived template and workflow results. Default: `outputs`.
    pub outputs_dir: PathBuf,

    /// Directory for archived quality checks. Default: `quality_checks`.
    pub quality_checks_dir: PathBuf,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.1,
            max_tokens: 2000,
            save_local_copies: false,
            outputs_dir: PathBuf::from("outputs"),
            quality_checks_dir: PathBuf::from("quality_checks"),
            download_timeout_secs: 120,
        }
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("save_local_copies", &self.save_local_copies)
            .field("outputs_dir", &self.outputs_dir)
            .field("quality_checks_dir", &self.quality_checks_dir)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .finish()
    }
}

impl PipelineConfig {
    /// Create a new builder for `PipelineConfig`.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Debug)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn save_local_copies(mut self, v: bool) -> Self {
        self.config.save_local_copies = v;
        self
    }

    pub fn outputs_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.outputs_dir = dir.into();
        self
    }

    pub fn quality_checks_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.quality_checks_dir = dir.into();
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PipelineConfig, ComplianceError> {
        let c = &self.config;
        if c.max_tokens == 0 {
            return Err(ComplianceError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        if c.download_timeout_secs == 0 {
            return Err(ComplianceError::InvalidConfig(
                "download_timeout_secs must be ≥ 1".into(),
            ));
        }
        if c.save_local_copies && c.outputs_dir.as_os_str().is_empty() {
            return Err(ComplianceError::InvalidConfig(
                "outputs_dir must not be empty when saving local copies".into(),
            ));
        }
        if c.save_local_copies && c.quality_checks_dir.as_os_str().is_empty() {
            return Err(ComplianceError::InvalidConfig(
                "quality_checks_dir must not be empty when saving local copies".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = PipelineConfig::default();
        assert_eq!(c.temperature, 0.1);
        assert_eq!(c.max_tokens, 2000);
        assert!(!c.save_local_copies);
        assert_eq!(c.outputs_dir, PathBuf::from("outputs"));
    }

    #[test]
    fn temperature_is_clamped() {
        let c = PipelineConfig::builder().temperature(7.5).build().unwrap();
        assert_eq!(c.temperature, 2.0);
    }

    #[test]
    fn zero_max_tokens_rejected() {
        let err = PipelineConfig::builder().max_tokens(0).build().unwrap_err();
        assert!(matches!(err, ComplianceError::InvalidConfig(_)));
    }

    #[test]
    fn empty_archive_dir_rejected_only_when_saving() {
        assert!(PipelineConfig::builder().outputs_dir("").build().is_ok());
        assert!(PipelineConfig::builder()
            .save_local_copies(true)
            .outputs_dir("")
            .build()
            .is_err());
    }

    #[test]
    fn debug_hides_provider() {
        let dbg = format!("{:?}", PipelineConfig::default());
        assert!(dbg.contains("provider: None"));
    }
}
