//! Ordered model-fallback chain over a text provider.

use crate::error::{MedScanError, Result};
use crate::text::{ModelReply, PromptRequest, TextProvider};

/// Model identifiers attempted in order, highest preference first.
pub const DEFAULT_MODEL_CHAIN: [&str; 3] =
    ["gemini-2.5-flash", "gemini-2.0-flash", "gemini-1.5-flash"];

/// Tries candidate model identifiers in order and returns the first success.
///
/// Each identifier gets exactly one generation call; a failure of any kind
/// advances to the next identifier. There is no backoff and no retry of an
/// identifier that already failed. When the chain is exhausted the returned
/// error embeds the last failure's message.
pub struct Responder<P> {
    provider: P,
    chain: Vec<String>,
}

impl<P: TextProvider> Responder<P> {
    /// Creates a responder over the default model chain.
    pub fn new(provider: P) -> Self {
        Self::with_chain(
            provider,
            DEFAULT_MODEL_CHAIN.iter().map(|m| m.to_string()).collect(),
        )
    }

    /// Creates a responder over a caller-supplied model chain.
    pub fn with_chain(provider: P, chain: Vec<String>) -> Self {
        Self { provider, chain }
    }

    /// Returns the model identifiers in attempt order.
    pub fn chain(&self) -> &[String] {
        &self.chain
    }

    /// Returns the underlying provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Attempts the chain in order, returning the first successful reply.
    pub async fn respond(&self, request: &PromptRequest) -> Result<ModelReply> {
        let mut last_error: Option<MedScanError> = None;

        for model_id in &self.chain {
            match self.provider.generate(model_id, request).await {
                Ok(reply) => return Ok(reply),
                Err(e) => {
                    tracing::warn!(model = %model_id, "model attempt failed: {e}");
                    last_error = Some(e);
                }
            }
        }

        let last = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no models configured".into());
        Err(MedScanError::ModelsExhausted {
            attempts: self.chain.len(),
            last,
        })
    }
}
