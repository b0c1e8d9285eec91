use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::warn;

/// Where the aggregator gets catalog JSON from.
///
/// Never fails: transport errors, timeouts, non-2xx statuses and unparsable
/// bodies all collapse to `None`, meaning "no data for this request".
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch(&self, path: &str, params: &[(&str, &str)]) -> Option<Value>;
}

/// Fetch client that goes through the proxy gateway's `/api/tmdb` route.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    client: Client,
    endpoint: String,
}

impl GatewayClient {
    pub fn new(gateway_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(timeout)
            .build()
            .context("Failed to build gateway HTTP client")?;
        Ok(Self {
            client,
            endpoint: format!("{}/api/tmdb", gateway_url.trim_end_matches('/')),
        })
    }

    async fn try_fetch(&self, path: &str, params: &[(&str, &str)]) -> Result<Value> {
        let res = self
            .client
            .get(&self.endpoint)
            .query(&[("path", path)])
            .query(params)
            .send()
            .await
            .context("request failed")?;
        let status = res.status();
        if !status.is_success() {
            anyhow::bail!("API error: status {}", status);
        }
        let text = res.text().await.context("reading body failed")?;
        serde_json::from_str(&text).context("JSON parse failed")
    }
}

#[async_trait]
impl CatalogSource for GatewayClient {
    async fn fetch(&self, path: &str, params: &[(&str, &str)]) -> Option<Value> {
        match self.try_fetch(path, params).await {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Failed to fetch {}: {:#}", path, e);
                None
            }
        }
    }
}
