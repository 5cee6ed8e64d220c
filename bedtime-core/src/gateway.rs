//! Model gateway: the single choke point for language-model calls.
//!
//! Every call goes through [`ModelGateway::call_model`], which absorbs
//! backend failures into `Ok(None)` after logging them. The only error that
//! escapes is [`GatewayError::MissingCredential`], which ends the session.

use async_trait::async_trait;
use claude::Claude;
use thiserror::Error;

/// Errors that escape the gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("No API key configured - set the {} environment variable", claude::API_KEY_VAR)]
    MissingCredential,
}

/// Token limit and temperature for one model call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CallParams {
    pub max_tokens: usize,
    pub temperature: f32,
}

impl CallParams {
    /// Draft story generation (also the default for unlisted calls).
    pub const DRAFT: CallParams = CallParams::new(3000, 0.1);
    /// Critique of a draft.
    pub const EVALUATION: CallParams = CallParams::new(1000, 0.1);
    /// Rewrite of a draft using the critique.
    pub const REFINEMENT: CallParams = CallParams::DRAFT;
    /// Character summary extraction.
    pub const EXTRACTION: CallParams = CallParams::new(500, 0.1);
    /// Rewrite driven by user feedback.
    pub const REVISION: CallParams = CallParams::DRAFT;
    /// YES/NO episode-potential check.
    pub const ASSESSMENT: CallParams = CallParams::new(100, 0.1);

    pub const fn new(max_tokens: usize, temperature: f32) -> Self {
        Self {
            max_tokens,
            temperature,
        }
    }
}

impl Default for CallParams {
    fn default() -> Self {
        Self::DRAFT
    }
}

/// A language-model backend that turns a prompt into text.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Generate a completion for a single user prompt.
    async fn generate(&self, prompt: &str, params: CallParams) -> Result<String, claude::Error>;
}

#[async_trait]
impl CompletionBackend for Claude {
    async fn generate(&self, prompt: &str, params: CallParams) -> Result<String, claude::Error> {
        self.complete_text(prompt, params.max_tokens, params.temperature)
            .await
    }
}

/// Wrapper around a backend with uniform failure handling.
#[derive(Debug, Clone)]
pub struct ModelGateway<B> {
    backend: B,
}

impl<B: CompletionBackend> ModelGateway<B> {
    /// Wrap a backend.
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Get the underlying backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Make one model call.
    ///
    /// Returns `Ok(None)` when the backend fails or replies with blank text;
    /// the failure is logged and never retried.
    pub async fn call_model(
        &self,
        prompt: &str,
        params: CallParams,
    ) -> Result<Option<String>, GatewayError> {
        tracing::debug!(
            prompt_chars = prompt.len(),
            max_tokens = params.max_tokens,
            temperature = params.temperature,
            "calling model"
        );

        match self.backend.generate(prompt, params).await {
            Ok(text) if text.trim().is_empty() => {
                tracing::warn!("model returned an empty completion");
                Ok(None)
            }
            Ok(text) => Ok(Some(text)),
            Err(claude::Error::NoApiKey) => Err(GatewayError::MissingCredential),
            Err(error) => {
                tracing::error!(
                    %error,
                    "model call failed; check the API key and network connection"
                );
                Ok(None)
            }
        }
    }
}
