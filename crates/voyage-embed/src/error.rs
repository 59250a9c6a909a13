use thiserror::Error;

use crate::options::OptionsValidationError;

#[derive(Debug, Error)]
pub enum EmbedError {
    #[error(
        "too many values for a single embedding call: {provider} model {model_id} accepts at most {max_embeddings_per_call} values, got {}",
        .values.len()
    )]
    TooManyValuesForCall {
        max_embeddings_per_call: usize,
        model_id: String,
        provider: String,
        values: Vec<String>,
    },

    #[error("invalid provider options: {0}")]
    InvalidProviderOptions(#[from] OptionsValidationError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("provider API error: status={status}, message={message}")]
    Api {
        status: u16,
        message: String,
        body: String,
    },

    #[error("provider returned invalid response: {0}")]
    InvalidResponse(String),

    #[error("embedding call was cancelled")]
    Cancelled,
}

impl EmbedError {
    /// Whether a caller-side retry policy may reasonably try the call again.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Api { status, .. } => matches!(status, 408 | 429) || *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for EmbedError {
    fn from(error: reqwest::Error) -> Self {
        Self::Network(error.to_string())
    }
}
