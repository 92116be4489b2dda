//! Configuration types for document extraction and the HTTP service.
//!
//! Inference behaviour is controlled through [`ExtractionConfig`], built via
//! its [`ExtractionConfigBuilder`]. The credential travels inside the config
//! and is handed to the adapter at construction, so nothing in the library
//! reads process-wide state and tests can build adapters freely.
//!
//! [`ServerConfig`] carries the listener address, upload cap and
//! [`RuntimeMode`] for the HTTP surface.

use crate::error::DocScanError;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

/// Default Gemini model used when none is configured.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Default upload cap: 5 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Configuration for the Inference Adapter.
///
/// Built via [`ExtractionConfig::builder()`] or using
/// [`ExtractionConfig::default()`].
///
/// # Example
/// ```rust
/// use docscan::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .api_key("AIza-test")
///     .model("gemini-1.5-flash")
///     .build()
///     .unwrap();
/// assert_eq!(config.model, "gemini-1.5-flash");
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Credential for the Gemini backend.
    pub api_key: Option<String>,

    /// Model identifier. Default: `gemini-1.5-flash`.
    pub model: String,

    /// edgequake-llm provider name (e.g. "openai", "anthropic", "ollama").
    /// When set, the provider's own API key variable is used instead of `api_key`.
    pub provider_name: Option<String>,

    /// Pre-constructed edgequake-llm provider. Takes precedence over everything else.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Instruction override. If None, uses [`crate::prompts::EXTRACTION_PROMPT`].
    pub prompt: Option<String>,

    /// Sampling temperature. None leaves the model's default in place.
    pub temperature: Option<f32>,

    /// Output token cap. None leaves the model's default in place.
    pub max_tokens: Option<usize>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            provider_name: None,
            provider: None,
            prompt: None,
            temperature: None,
            max_tokens: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("prompt", &self.prompt.as_ref().map(|p| p.len()))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
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

    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.prompt = Some(prompt.into());
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = Some(t);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = Some(n);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, DocScanError> {
        let c = &self.config;
        if c.model.trim().is_empty() {
            return Err(DocScanError::InvalidConfig("Model must not be empty".into()));
        }
        if let Some(t) = c.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(DocScanError::InvalidConfig(format!(
                    "Temperature must be 0.0–2.0, got {}",
                    t
                )));
            }
        }
        if c.max_tokens == Some(0) {
            return Err(DocScanError::InvalidConfig("Max tokens must be ≥ 1".into()));
        }
        Ok(self.config)
    }
}

// ── Server ───────────────────────────────────────────────────────────────

/// Runtime mode of the service.
///
/// Only [`RuntimeMode::Development`] includes error `details` in 500
/// responses; production keeps them in the server log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RuntimeMode {
    #[default]
    Production,
    Development,
}

impl RuntimeMode {
    pub fn exposes_details(self) -> bool {
        matches!(self, RuntimeMode::Development)
    }
}

impl fmt::Display for RuntimeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeMode::Production => f.write_str("production"),
            RuntimeMode::Development => f.write_str("development"),
        }
    }
}

/// Listener and request-handling settings for [`crate::server::serve`].
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Interface to bind. Default: all interfaces.
    pub host: IpAddr,
    /// TCP port. Default: 5000.
    pub port: u16,
    pub mode: RuntimeMode,
    /// Largest accepted `document` upload in bytes. Default: 5 MiB.
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 5000,
            mode: RuntimeMode::default(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
