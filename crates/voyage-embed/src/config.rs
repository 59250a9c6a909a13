use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};

use crate::error::EmbedError;
use crate::transport::HttpTransport;

pub const DEFAULT_BASE_URL: &str = "https://api.voyageai.com/v1";
pub const API_KEY_ENV: &str = "VOYAGE_API_KEY";

/// Produces the headers for one outbound call. Invoked fresh on every call.
pub type HeaderSource = Arc<dyn Fn() -> Result<HeaderMap, EmbedError> + Send + Sync>;

#[derive(Clone)]
pub struct ContextualizedEmbeddingConfig {
    pub provider: String,
    pub base_url: String,
    pub headers: HeaderSource,
    pub transport: Option<Arc<dyn HttpTransport>>,
}

impl ContextualizedEmbeddingConfig {
    pub fn new(
        provider: impl Into<String>,
        base_url: impl Into<String>,
        headers: HeaderSource,
    ) -> Self {
        Self {
            provider: provider.into(),
            base_url: base_url.into(),
            headers,
            transport: None,
        }
    }

    pub fn with_transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }
}

impl fmt::Debug for ContextualizedEmbeddingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextualizedEmbeddingConfig")
            .field("provider", &self.provider)
            .field("base_url", &self.base_url)
            .field("custom_transport", &self.transport.is_some())
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub struct VoyageConfig {
    /// When `None`, `VOYAGE_API_KEY` is read at call time.
    pub api_key: Option<String>,
    pub base_url: String,
    pub headers: HeaderMap,
    pub timeout: Duration,
}

impl VoyageConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            ..Self::default()
        }
    }

    pub fn from_env() -> Self {
        let base_url =
            env_string("VOYAGE_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let timeout = env_string("VOYAGE_TIMEOUT_SECS")
            .and_then(|v| v.parse::<u64>().ok())
            .map_or(Duration::from_secs(30), |secs| {
                Duration::from_secs(secs.clamp(1, 600))
            });
        Self {
            api_key: None,
            base_url,
            headers: HeaderMap::new(),
            timeout,
        }
    }

    /// Header source sending the bearer token, a user agent and any extra headers.
    pub fn header_source(&self) -> HeaderSource {
        let api_key = self.api_key.clone();
        let extra = self.headers.clone();
        Arc::new(move || -> Result<HeaderMap, EmbedError> {
            let key = match &api_key {
                Some(k) => k.clone(),
                None => env_string(API_KEY_ENV).ok_or_else(|| {
                    EmbedError::Config(format!(
                        "voyage API key is missing; pass it in the config or set {API_KEY_ENV}"
                    ))
                })?,
            };

            let mut headers = HeaderMap::new();
            let auth = HeaderValue::from_str(&format!("Bearer {key}")).map_err(|_| {
                EmbedError::Config("voyage API key is not a valid header value".to_string())
            })?;
            headers.insert(AUTHORIZATION, auth);
            headers.insert(
                USER_AGENT,
                HeaderValue::from_static(concat!("voyage-embed/", env!("CARGO_PKG_VERSION"))),
            );
            for (name, value) in &extra {
                headers.insert(name.clone(), value.clone());
            }
            Ok(headers)
        })
    }
}

impl Default for VoyageConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            headers: HeaderMap::new(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl fmt::Debug for VoyageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VoyageConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("headers", &self.headers.keys().collect::<Vec<_>>())
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Reads an env var, trimmed; unset and blank values are both `None`.
pub fn env_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
