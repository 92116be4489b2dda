//! Inference Adapter: send one document image plus the instruction to a VLM.
//!
//! The adapter owns a [`VisionBackend`] chosen at construction and exposes a
//! single call, [`InferenceAdapter::infer`]. Every backend failure collapses
//! into [`InferenceError`]; the specific cause is logged here and kept as
//! the error's `source`, never surfaced in the caller-facing message.
//!
//! ## Backends
//!
//! Every backend is an [`LlmProviderBackend`] around an edgequake-llm provider:
//!
//! | Provider | Built when | Credential |
//! |----------|-----------|------------|
//! | pre-built | `config.provider` is set | caller's provider |
//! | factory | `config.provider_name` is set | provider's own env var |
//! | [`GeminiProvider`] | `config.api_key` is set | `config.api_key` |
//!
//! No retries: one call per request, and a failure fails the request.

use crate::config::ExtractionConfig;
use crate::error::{BackendError, DocScanError, InferenceError};
use crate::output::RawModelResponse;
use crate::pipeline::encode::encode_document;
use crate::prompts::EXTRACTION_PROMPT;
use async_trait::async_trait;
use edgequake_llm::{
    ChatMessage, CompletionOptions, GeminiProvider, ImageData, LLMProvider, ProviderFactory,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// The two-part payload for one inference call: instruction, then image.
#[derive(Clone)]
pub struct ExtractionPrompt<'a> {
    pub instruction: &'a str,
    pub image: ImageData,
}

/// A model endpoint that can answer a single image-plus-instruction prompt.
#[async_trait]
pub trait VisionBackend: Send + Sync {
    /// Short label used in logs.
    fn name(&self) -> &str;

    /// Issue one call and return the model's reply text.
    async fn generate(&self, prompt: &ExtractionPrompt<'_>) -> Result<String, BackendError>;
}

/// Sends document images to a [`VisionBackend`] and returns the raw reply.
///
/// Holds no mutable state; share it across requests behind an `Arc`.
pub struct InferenceAdapter {
    backend: Arc<dyn VisionBackend>,
    instruction: String,
}

impl std::fmt::Debug for InferenceAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InferenceAdapter")
            .field("backend", &self.backend.name())
            .field("instruction_len", &self.instruction.len())
            .finish()
    }
}

impl InferenceAdapter {
    /// Wrap `backend` with the default instruction.
    pub fn new(backend: Arc<dyn VisionBackend>) -> Self {
        Self {
            backend,
            instruction: EXTRACTION_PROMPT.to_string(),
        }
    }

    /// Replace the instruction sent with every image.
    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = instruction.into();
        self
    }

    /// Build the adapter and its backend from `config`.
    pub fn from_config(config: &ExtractionConfig) -> Result<Self, DocScanError> {
        let backend = resolve_backend(config)?;
        info!("Inference backend: {} (model {})", backend.name(), config.model);
        let adapter = Self::new(backend);
        Ok(match config.prompt {
            Some(ref p) => adapter.with_instruction(p.clone()),
            None => adapter,
        })
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    /// Encode `image` and ask the model to read it.
    ///
    /// # Errors
    /// [`InferenceError`] for any failure: empty input, transport, HTTP
    /// status, blocked or malformed reply.
    pub async fn infer(&self, image: &[u8]) -> Result<RawModelResponse, InferenceError> {
        if image.is_empty() {
            error!("Inference skipped: {}", BackendError::EmptyImage);
            return Err(BackendError::EmptyImage.into());
        }

        let prompt = ExtractionPrompt {
            instruction: &self.instruction,
            image: encode_document(image),
        };

        let start = Instant::now();
        match self.backend.generate(&prompt).await {
            Ok(text) => {
                debug!("{}: reply in {:?}", self.backend.name(), start.elapsed());
                info!("Model response: {}", text);
                Ok(RawModelResponse::from(text))
            }
            Err(e) => {
                error!(
                    "{}: inference failed after {:?}: {}",
                    self.backend.name(),
                    start.elapsed(),
                    e
                );
                Err(e.into())
            }
        }
    }
}

// ── edgequake-llm backend ────────────────────────────────────────────────

/// Adapts any edgequake-llm [`LLMProvider`] to [`VisionBackend`].
///
/// The prompt goes out as a single user message whose text is the
/// instruction and whose attachment is the document image.
pub struct LlmProviderBackend {
    provider: Arc<dyn LLMProvider>,
    label: String,
    temperature: Option<f32>,
    max_tokens: Option<usize>,
}

impl LlmProviderBackend {
    pub fn new(provider: Arc<dyn LLMProvider>, label: impl Into<String>) -> Self {
        Self {
            provider,
            label: label.into(),
            temperature: None,
            max_tokens: None,
        }
    }

    fn with_options(mut self, config: &ExtractionConfig) -> Self {
        self.temperature = config.temperature;
        self.max_tokens = config.max_tokens;
        self
    }

    fn build_options(&self) -> CompletionOptions {
        CompletionOptions {
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            ..Default::default()
        }
    }
}

#[async_trait]
impl VisionBackend for LlmProviderBackend {
    fn name(&self) -> &str {
        &self.label
    }

    async fn generate(&self, prompt: &ExtractionPrompt<'_>) -> Result<String, BackendError> {
        let messages = vec![ChatMessage::user_with_images(
            prompt.instruction,
            vec![prompt.image.clone()],
        )];
        let options = self.build_options();

        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| BackendError::Provider(e.to_string()))?;

        debug!(
            "{}: {} input tokens, {} output tokens",
            self.label, response.prompt_tokens, response.completion_tokens
        );
        Ok(response.content)
    }
}

/// Resolve the backend, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`config.provider`): used as-is.
/// 2. **Named provider** (`config.provider_name`): built by
///    [`ProviderFactory::create_llm_provider`], which reads that provider's
///    API key variable.
/// 3. **Gemini**: [`GeminiProvider`] with `config.api_key`.
fn resolve_backend(config: &ExtractionConfig) -> Result<Arc<dyn VisionBackend>, DocScanError> {
    if let Some(ref provider) = config.provider {
        let backend = LlmProviderBackend::new(Arc::clone(provider), "custom").with_options(config);
        return Ok(Arc::new(backend));
    }

    if let Some(ref name) = config.provider_name {
        let provider = ProviderFactory::create_llm_provider(name, &config.model).map_err(|e| {
            DocScanError::ProviderNotConfigured {
                provider: name.clone(),
                hint: format!("{e}"),
            }
        })?;
        let backend = LlmProviderBackend::new(provider, name.clone()).with_options(config);
        return Ok(Arc::new(backend));
    }

    let key = config
        .api_key
        .as_deref()
        .filter(|k| !k.is_empty())
        .ok_or_else(|| DocScanError::ProviderNotConfigured {
            provider: "gemini".to_string(),
            hint: "Set API_KEY (or pass --api-key) to a Gemini API key.".to_string(),
        })?;
    let provider = GeminiProvider::new(key).with_model(config.model.as_str());
    let backend = LlmProviderBackend::new(Arc::new(provider), "gemini").with_options(config);
    Ok(Arc::new(backend))
}
