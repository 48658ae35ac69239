//! Shared HTTP plumbing for provider adapters
//!
//! Maps transport failures and HTTP status codes onto [`ProviderError`] so
//! the retry wrapper can tell transient failures from permanent ones.

use mars_application::ProviderError;
use mars_domain::util::truncate_str;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Error bodies are cut to this many bytes before they end up in messages
const MAX_ERROR_BODY: usize = 500;

/// Build a client with the per-request timeout applied
pub fn build_client(timeout: Duration) -> Result<Client, ProviderError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ProviderError::Other(format!("failed to build HTTP client: {e}")))
}

/// Send a request, turning non-success statuses into errors
pub async fn send(request: RequestBuilder) -> Result<Response, ProviderError> {
    let response = request.send().await.map_err(transport_error)?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(status_error(status.as_u16(), &body))
}

/// Read a complete JSON response body
pub async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ProviderError> {
    let body = response.text().await.map_err(transport_error)?;
    serde_json::from_str(&body)
        .map_err(|e| ProviderError::InvalidResponse(format!("malformed response body: {e}")))
}

/// Classify a reqwest transport failure
pub fn transport_error(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout
    } else if err.is_connect() {
        ProviderError::Connection(err.to_string())
    } else if err.is_decode() || err.is_body() {
        ProviderError::Stream(err.to_string())
    } else {
        ProviderError::Other(err.to_string())
    }
}

/// Classify an unsuccessful HTTP status
pub fn status_error(status: u16, body: &str) -> ProviderError {
    let message = error_message(body);
    match status {
        401 | 403 => ProviderError::Auth(message),
        404 => ProviderError::ModelNotFound(message),
        429 => ProviderError::RateLimited(message),
        500..=599 => ProviderError::Server { status, message },
        _ => ProviderError::Api { status, message },
    }
}

/// Pull the human-readable message out of a vendor error body.
///
/// Vendors use `{"error": {"message": ...}}` (OpenAI, Anthropic, Google)
/// or `{"error": "..."}` (Ollama); anything else is returned truncated.
fn error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        let error = &value["error"];
        if let Some(message) = error["message"].as_str() {
            return message.to_string();
        }
        if let Some(message) = error.as_str() {
            return message.to_string();
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "empty response body".to_string()
    } else {
        truncate_str(trimmed, MAX_ERROR_BODY).to_string()
    }
}
