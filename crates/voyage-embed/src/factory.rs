use std::sync::Arc;

use crate::config::{ContextualizedEmbeddingConfig, HeaderSource, VoyageConfig};
use crate::error::EmbedError;
use crate::providers::VoyageContextualizedEmbeddingModel;
use crate::traits::EmbeddingModel;
use crate::transport::{HttpTransport, ReqwestTransport};

pub const CONTEXTUALIZED_EMBEDDING_PROVIDER: &str = "voyage.contextualized-embedding";

/// Hands out voyage models sharing one header source and transport.
#[derive(Clone)]
pub struct VoyageProvider {
    base_url: String,
    headers: HeaderSource,
    transport: Arc<dyn HttpTransport>,
}

impl VoyageProvider {
    pub fn new(config: VoyageConfig) -> Result<Self, EmbedError> {
        let transport = Arc::new(ReqwestTransport::new(config.timeout)?);
        Ok(Self::with_transport(config, transport))
    }

    pub fn with_transport(config: VoyageConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            headers: config.header_source(),
            transport,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn contextualized_embedding_model(
        &self,
        model_id: impl Into<String>,
    ) -> VoyageContextualizedEmbeddingModel {
        let config = ContextualizedEmbeddingConfig::new(
            CONTEXTUALIZED_EMBEDDING_PROVIDER,
            self.base_url.clone(),
            Arc::clone(&self.headers),
        )
        .with_transport(Arc::clone(&self.transport));
        VoyageContextualizedEmbeddingModel::new(model_id, config)
    }
}

pub fn build_contextualized_embedding_model(
    cfg: VoyageConfig,
    model_id: impl Into<String>,
) -> Result<Arc<dyn EmbeddingModel>, EmbedError> {
    let provider = VoyageProvider::new(cfg)?;
    Ok(Arc::new(provider.contextualized_embedding_model(model_id)))
}
