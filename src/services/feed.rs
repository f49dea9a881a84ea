//! Feed source service.
//!
//! Retrieves the raw snapshot bytes. Decoding lives in
//! [`pipeline::parse`](crate::pipeline::parse).

use async_trait::async_trait;
use reqwest::Client;

use crate::error::Result;
use crate::models::FeedConfig;
use crate::utils::http;

/// Source of raw snapshot bytes.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch the current snapshot.
    async fn fetch(&self) -> Result<Vec<u8>>;

    /// Human-readable location, used in logs.
    fn describe(&self) -> String;
}

/// Feed served over HTTP GET.
pub struct HttpFeed {
    client: Client,
    url: String,
}

impl HttpFeed {
    /// Create a feed using a client configured from `config`.
    pub fn new(config: &FeedConfig) -> Result<Self> {
        let client = http::create_async_client(config)?;
        Ok(Self::with_client(client, &config.url))
    }

    pub fn with_client(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl FeedSource for HttpFeed {
    async fn fetch(&self) -> Result<Vec<u8>> {
        let body = http::fetch_bytes(&self.client, &self.url).await?;
        log::debug!("Fetched {} bytes from {}", body.len(), self.url);
        Ok(body)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}
