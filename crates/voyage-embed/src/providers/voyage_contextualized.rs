use std::sync::Arc;

use reqwest::Method;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ContextualizedEmbeddingConfig;
use crate::error::EmbedError;
use crate::failure::decode_failed_response;
use crate::options::{InputType, OutputDtype, VOYAGE_OPTIONS_KEY, parse_provider_options};
use crate::traits::EmbeddingModel;
use crate::transport::{HttpRequest, HttpTransport, ReqwestTransport};
use crate::types::{EmbedCall, EmbeddingResult, EmbeddingUsage, ResponseMetadata};

pub const VOYAGE_CONTEXT_3: &str = "voyage-context-3";

const MAX_EMBEDDINGS_PER_CALL: usize = 128;

/// Contextualized embeddings: every value of one call is sent as a single
/// group, so the service embeds each chunk with the others as context.
#[derive(Clone, Debug)]
pub struct VoyageContextualizedEmbeddingModel {
    model_id: String,
    config: ContextualizedEmbeddingConfig,
}

impl VoyageContextualizedEmbeddingModel {
    pub fn new(model_id: impl Into<String>, config: ContextualizedEmbeddingConfig) -> Self {
        Self {
            model_id: model_id.into(),
            config,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/contextualizedembeddings",
            self.config.base_url.trim_end_matches('/')
        )
    }

    fn transport(&self) -> Result<Arc<dyn HttpTransport>, EmbedError> {
        match &self.config.transport {
            Some(t) => Ok(Arc::clone(t)),
            None => Ok(Arc::new(ReqwestTransport::with_client(
                reqwest::Client::builder().build()?,
            ))),
        }
    }

    fn merged_headers(&self, per_call: Option<HeaderMap>) -> Result<HeaderMap, EmbedError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        overlay_headers(&mut headers, &(self.config.headers)()?);
        if let Some(per_call) = per_call {
            overlay_headers(&mut headers, &per_call);
        }
        Ok(headers)
    }
}

/// Replaces every name present in `source`, keeping all of its values.
fn overlay_headers(target: &mut HeaderMap, source: &HeaderMap) {
    for name in source.keys() {
        target.remove(name);
    }
    for (name, value) in source {
        target.append(name.clone(), value.clone());
    }
}

#[async_trait::async_trait]
impl EmbeddingModel for VoyageContextualizedEmbeddingModel {
    fn provider(&self) -> &str {
        &self.config.provider
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn max_embeddings_per_call(&self) -> usize {
        MAX_EMBEDDINGS_PER_CALL
    }

    fn supports_parallel_calls(&self) -> bool {
        false
    }

    async fn embed(&self, call: EmbedCall) -> Result<EmbeddingResult, EmbedError> {
        let EmbedCall {
            values,
            provider_options,
            headers,
            abort_signal,
        } = call;

        if values.len() > self.max_embeddings_per_call() {
            return Err(EmbedError::TooManyValuesForCall {
                max_embeddings_per_call: self.max_embeddings_per_call(),
                model_id: self.model_id.clone(),
                provider: self.config.provider.clone(),
                values,
            });
        }

        let options = parse_provider_options(&provider_options, VOYAGE_OPTIONS_KEY)?;

        let payload = ContextualizedEmbeddingRequest {
            inputs: [values.as_slice()],
            model: &self.model_id,
            input_type: options.input_type,
            truncation: options.truncation,
            output_dimension: options.output_dimension,
            output_dtype: options.output_dtype,
        };
        let body = serde_json::to_vec(&payload)
            .map_err(|e| EmbedError::Config(format!("failed to encode request body: {e}")))?;

        let request = HttpRequest {
            method: Method::POST,
            url: self.endpoint(),
            headers: self.merged_headers(headers)?,
            body,
        };
        debug!(
            model = %self.model_id,
            values = values.len(),
            url = %request.url,
            "sending contextualized embedding request"
        );

        let transport = self.transport()?;
        let response = match abort_signal {
            Some(token) => {
                tokio::select! {
                    biased;
                    () = token.cancelled() => {
                        debug!(
                            model = %self.model_id,
                            "contextualized embedding request cancelled"
                        );
                        return Err(EmbedError::Cancelled);
                    }
                    res = transport.send(request) => res?,
                }
            }
            None => transport.send(request).await?,
        };

        if !response.is_success() {
            warn!(
                model = %self.model_id,
                status = response.status,
                "contextualized embedding request failed"
            );
            return Err(decode_failed_response(&response));
        }

        let raw: Value = serde_json::from_str(&response.body).map_err(|e| {
            warn!(model = %self.model_id, error = %e, "response body is not JSON");
            EmbedError::InvalidResponse(format!("response body is not valid JSON: {e}"))
        })?;
        let parsed = ContextualizedEmbeddingResponse::deserialize(&raw).map_err(|e| {
            warn!(model = %self.model_id, error = %e, "unexpected response shape");
            EmbedError::InvalidResponse(format!("unexpected response shape: {e}"))
        })?;

        // Only the first group is consumed; a call always submits exactly one.
        let embeddings = parsed
            .data
            .into_iter()
            .next()
            .unwrap_or_default()
            .into_iter()
            .map(|item| item.embedding)
            .collect();

        Ok(EmbeddingResult {
            embeddings,
            usage: parsed.usage.map(|u| EmbeddingUsage {
                tokens: u.total_tokens,
            }),
            response: ResponseMetadata {
                headers: response.headers,
                body: raw,
            },
            warnings: Vec::new(),
        })
    }
}

#[derive(Debug, Serialize)]
struct ContextualizedEmbeddingRequest<'a> {
    inputs: [&'a [String]; 1],
    model: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    input_type: Option<InputType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    truncation: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    output_dimension: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    output_dtype: Option<OutputDtype>,
}

// Deliberately minimal: only the fields read above are required.
#[derive(Debug, Deserialize)]
struct ContextualizedEmbeddingResponse {
    data: Vec<Vec<EmbeddingItem>>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingItem {
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    total_tokens: u64,
}
