use async_trait::async_trait;

use crate::error::EmbedError;
use crate::types::{EmbedCall, EmbeddingResult};

#[async_trait]
pub trait EmbeddingModel: Send + Sync {
    fn provider(&self) -> &str;

    fn model_id(&self) -> &str;

    fn max_embeddings_per_call(&self) -> usize;

    /// Advisory only: `false` asks orchestrators not to fan out concurrent calls
    /// against one instance. Nothing here enforces it.
    fn supports_parallel_calls(&self) -> bool;

    async fn embed(&self, call: EmbedCall) -> Result<EmbeddingResult, EmbedError>;
}
