//! Response handling shared by the HTTP backends.

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

use synapse_core::{ProviderError, ProviderResult};

/// Error envelope used by both the Gemini and OpenAI APIs.
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// Build the HTTP client used by a backend.
pub(crate) fn build_client(provider: &str, timeout_secs: u64) -> ProviderResult<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| {
            ProviderError::malformed(provider, format!("Failed to create HTTP client: {}", e))
        })
}

/// Extract the human-readable message from an API error body, if present.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorResponse>(body)
        .map(|r| r.error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

/// Map a non-success status to a typed error, otherwise decode the JSON body.
pub(crate) async fn read_json<T: DeserializeOwned>(
    provider: &str,
    response: Response,
) -> ProviderResult<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ProviderError::from_status(
            provider,
            status.as_u16(),
            &error_message(&body),
        ));
    }

    response.json::<T>().await.map_err(|e| {
        if e.is_decode() {
            ProviderError::malformed(provider, format!("Failed to parse response: {}", e))
        } else {
            ProviderError::from_transport(provider, &e)
        }
    })
}
