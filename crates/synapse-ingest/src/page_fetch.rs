//! Outbound HTTP used by the metadata resolver.
//!
//! Page markup is fetched for meta-tag extraction, Open Library is queried
//! as JSON, and cover images are probed with `HEAD`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value as JsonValue;
use tracing::{debug, instrument};

use synapse_core::{Error, MetadataSettings, Result};

/// HTTP access needed by metadata enrichment.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// GET `url` and return the body as text. Non-2xx is an error.
    async fn get_text(&self, url: &str) -> Result<String>;

    /// GET `url` and decode the body as JSON. Non-2xx is an error.
    async fn get_json(&self, url: &str) -> Result<JsonValue>;

    /// HEAD `url`; `true` only for a 200 response.
    async fn head_ok(&self, url: &str) -> Result<bool>;
}

/// reqwest-backed fetcher sending the configured user agent.
#[derive(Clone)]
pub struct HttpPageFetcher {
    client: Client,
    max_page_bytes: usize,
}

impl HttpPageFetcher {
    pub fn new(settings: &MetadataSettings) -> Result<Self> {
        let client = Client::builder()
            .user_agent(settings.user_agent.clone())
            .timeout(settings.lookup_timeout())
            .connect_timeout(Duration::from_secs(settings.lookup_timeout_secs.min(5)))
            .build()
            .map_err(|e| Error::Config(format!("Failed to build page fetch client: {}", e)))?;
        Ok(Self {
            client,
            max_page_bytes: settings.max_page_bytes,
        })
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Metadata(format!("GET {} returned {}", url, status)));
        }
        Ok(response)
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    #[instrument(skip(self), fields(subsystem = "ingest", component = "page_fetch", op = "get_text"))]
    async fn get_text(&self, url: &str) -> Result<String> {
        let mut response = self.get(url).await?;
        let mut body: Vec<u8> = Vec::new();
        let mut truncated = false;

        while let Some(chunk) = response.chunk().await? {
            let room = self.max_page_bytes - body.len();
            if chunk.len() >= room {
                body.extend_from_slice(&chunk[..room]);
                truncated = chunk.len() > room;
                break;
            }
            body.extend_from_slice(&chunk);
        }

        debug!(body_len = body.len(), truncated, "Fetched page");
        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    #[instrument(skip(self), fields(subsystem = "ingest", component = "page_fetch", op = "get_json"))]
    async fn get_json(&self, url: &str) -> Result<JsonValue> {
        let body = self.get(url).await?.json::<JsonValue>().await?;
        Ok(body)
    }

    #[instrument(skip(self), fields(subsystem = "ingest", component = "page_fetch", op = "head"))]
    async fn head_ok(&self, url: &str) -> Result<bool> {
        let response = self.client.head(url).send().await?;
        debug!(status = response.status().as_u16(), "HEAD complete");
        Ok(response.status() == reqwest::StatusCode::OK)
    }
}
