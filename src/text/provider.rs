//! Text provider trait.

use crate::error::Result;
use crate::text::types::{ModelReply, PromptRequest};
use async_trait::async_trait;

/// Trait for hosted text-generation providers.
///
/// A provider exposes a family of named model variants behind one endpoint;
/// callers pick the variant per call.
#[async_trait]
pub trait TextProvider: Send + Sync {
    /// Runs one generation call against the named model variant.
    async fn generate(&self, model_id: &str, request: &PromptRequest) -> Result<ModelReply>;

    /// Checks that the named model variant is reachable and the caller
    /// authenticated.
    async fn health_check(&self, model_id: &str) -> Result<()>;
}
