use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::core::error::FetchError;
use crate::core::quote::{Quote, QuoteProvider};

/// Fetches USD-BRL from the AwesomeAPI `last` endpoint under a hard deadline.
pub struct AwesomeApiProvider {
    url: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl AwesomeApiProvider {
    pub fn new(url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("cotacao/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(AwesomeApiProvider {
            url: url.to_string(),
            timeout,
            client,
        })
    }

    async fn request(&self) -> Result<Quote, FetchError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(FetchError::Transport)?;

        debug!(status = %response.status(), "Received upstream response");

        if !response.status().is_success() {
            return Err(FetchError::BadStatus(response.status()));
        }

        let body = response.bytes().await.map_err(FetchError::Transport)?;
        serde_json::from_slice(&body).map_err(FetchError::Decode)
    }
}

#[async_trait]
impl QuoteProvider for AwesomeApiProvider {
    #[instrument(name = "UpstreamQuoteFetch", skip(self), fields(url = %self.url))]
    async fn fetch_quote(&self) -> Result<Quote, FetchError> {
        // One deadline for connect, headers, body and decode
        tokio::time::timeout(self.timeout, self.request())
            .await
            .unwrap_or(Err(FetchError::Timeout(self.timeout.as_millis())))
    }
}
