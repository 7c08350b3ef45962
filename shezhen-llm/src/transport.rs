//! Inference transport — the seam between the client and the network.

use std::time::Instant;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, error, warn};

use crate::error::TransportError;
use crate::types::{GenerateContentRequest, GenerateContentResponse};

/// Sends one `generateContent` request and returns the raw envelope.
///
/// Implementations must not retry: one call here is one request on the wire.
#[async_trait]
pub trait InferenceTransport: Send + Sync {
    async fn generate_content(
        &self,
        model: &str,
        api_key: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, TransportError>;
}

/// reqwest-backed transport for the Generative Language REST API.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: Client,
    base_url: String,
}

impl HttpTransport {
    /// Create a transport for `base_url` (e.g. `https://host/v1beta`).
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    /// Create a transport with a preconfigured HTTP client.
    #[must_use]
    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    /// Endpoint URL for `model`.
    #[must_use]
    pub fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }
}

#[async_trait]
impl InferenceTransport for HttpTransport {
    async fn generate_content(
        &self,
        model: &str,
        api_key: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, TransportError> {
        let url = self.endpoint(model);
        let start = Instant::now();

        let resp = self
            .http
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                error!("Inference request to {} failed: {}", url, e);
                TransportError::from(e)
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            match status.as_u16() {
                401 | 403 => warn!("Inference service rejected credential ({})", status),
                429 => warn!("Inference service quota exhausted ({})", status),
                _ => error!("Inference service error ({}): {}", status, body),
            }
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: GenerateContentResponse = resp.json().await?;
        debug!(
            model,
            latency_ms = start.elapsed().as_millis() as u64,
            candidates = envelope.candidates.len(),
            "inference response received"
        );
        Ok(envelope)
    }
}
