use std::{future::Future, time::Duration};

use anyhow::{Context, Result};
use reqwest::{Client, Url};
use tracing::debug;

use crate::{config::AppConfig, error::RepositoryError};

/// Provider of the raw remote card document.
pub trait DocumentSource: Send + Sync + 'static {
    /// Retrieve the document bytes.
    fn fetch(&self) -> impl Future<Output = Result<Vec<u8>, RepositoryError>> + Send;
}

/// HTTP retrieval of the card dump, optionally routed through a CORS relay.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
    url: Url,
}

impl HttpSource {
    /// Build a source for `target`, wrapped by `relay` when one is given.
    pub fn new(target: &str, relay: Option<&str>, timeout: Duration) -> Result<Self> {
        let url = request_url(target, relay)?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { client, url })
    }

    /// Source configured from `repository_url`, `relay_url` and the request timeout.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(
            &config.repository_url,
            config.relay_url.as_deref(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    /// URL actually requested.
    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl DocumentSource for HttpSource {
    async fn fetch(&self) -> Result<Vec<u8>, RepositoryError> {
        debug!(url = %self.url, "Fetching card repository");
        let response = self.client.get(self.url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RepositoryError::Status(status.as_u16()));
        }
        Ok(response.bytes().await?.to_vec())
    }
}

fn request_url(target: &str, relay: Option<&str>) -> Result<Url> {
    match relay.map(str::trim).filter(|relay| !relay.is_empty()) {
        Some(relay) => Url::parse_with_params(relay, &[("url", target)])
            .with_context(|| format!("invalid relay url {relay}")),
        None => Url::parse(target).with_context(|| format!("invalid repository url {target}")),
    }
}
