use reqwest::StatusCode;
use serde::Deserialize;

use crate::error::EmbedError;
use crate::transport::HttpResponse;

/// Error body shared by every voyage endpoint.
#[derive(Debug, Deserialize)]
struct VoyageErrorBody {
    detail: String,
}

/// Turns a non-success response into [`EmbedError::Api`].
pub fn decode_failed_response(response: &HttpResponse) -> EmbedError {
    let message = match serde_json::from_str::<VoyageErrorBody>(&response.body) {
        Ok(parsed) => parsed.detail,
        Err(_) if !response.body.trim().is_empty() => response.body.trim().to_string(),
        Err(_) => StatusCode::from_u16(response.status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("unknown error")
            .to_string(),
    };

    EmbedError::Api {
        status: response.status,
        message,
        body: response.body.clone(),
    }
}
