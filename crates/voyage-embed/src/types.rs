use reqwest::header::HeaderMap;
use serde::Serialize;
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;

/// Loosely typed per-call options, keyed by provider namespace (e.g. `"voyage"`).
pub type ProviderOptions = Map<String, Value>;

#[derive(Debug, Clone, Default)]
pub struct EmbedCall {
    pub values: Vec<String>,
    pub provider_options: ProviderOptions,
    pub headers: Option<HeaderMap>,
    pub abort_signal: Option<CancellationToken>,
}

impl EmbedCall {
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            values: values.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_provider_options(mut self, provider_options: ProviderOptions) -> Self {
        self.provider_options = provider_options;
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = Some(headers);
        self
    }

    pub fn with_abort_signal(mut self, token: CancellationToken) -> Self {
        self.abort_signal = Some(token);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EmbeddingUsage {
    pub tokens: u64,
}

/// Raw response data kept for caller diagnostics.
#[derive(Debug, Clone, Default)]
pub struct ResponseMetadata {
    pub headers: HeaderMap,
    pub body: Value,
}

/// Non-fatal notes attached to a successful call. Nothing emits these yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum EmbeddingWarning {
    UnsupportedSetting {
        setting: String,
        details: Option<String>,
    },
    Other {
        message: String,
    },
}

#[derive(Debug, Clone)]
pub struct EmbeddingResult {
    pub embeddings: Vec<Vec<f32>>,
    pub usage: Option<EmbeddingUsage>,
    pub response: ResponseMetadata,
    pub warnings: Vec<EmbeddingWarning>,
}
