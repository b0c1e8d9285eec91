use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;


const DEFAULT_LANGUAGE: &str = "en-US";

/// Raw upstream answer: the status and the JSON body, whatever the status.
#[derive(Debug, Clone)]
pub struct UpstreamReply {
    pub status: StatusCode,
    pub body: Value,
}

#[async_trait]
pub trait TmdbApi: Send + Sync {
    /// Issues `GET {base}/{path}` with the credential and the forwarded params.
    ///
    /// Errors only on transport failure or a body that is not JSON; upstream
    /// error statuses come back as a normal `UpstreamReply`.
    async fn get(
        &self,
        api_key: &str,
        path: &str,
        params: &[(String, String)],
    ) -> Result<UpstreamReply>;
}

#[derive(Debug, Clone)]
pub struct TmdbClient {
    client: Client,
    base_url: String,
}

impl TmdbClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let user_agent = format!("dhavaflix/{}", env!("CARGO_PKG_VERSION"));
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .context("Failed to build TMDB HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_matches('/'))
    }
}

#[async_trait]
impl TmdbApi for TmdbClient {
    async fn get(
        &self,
        api_key: &str,
        path: &str,
        params: &[(String, String)],
    ) -> Result<UpstreamReply> {
        let url = self.url_for(path);
        let query = upstream_query(api_key, params);
        debug!("TMDB GET {}?{}", url, redacted_query(&query));

        let res = self
            .client
            .get(&url)
            .query(&query)
            .send()
            .await
            // reqwest errors embed the full URL, credential included.
            .map_err(|e| anyhow!("request to {} failed: {}", url, e.without_url()))?;
        let status = res.status();
        let bytes = res
            .bytes()
            .await
            .map_err(|e| anyhow!("reading body from {} failed: {}", url, e.without_url()))?;
        let body: Value = serde_json::from_slice(&bytes)
            .with_context(|| format!("{} returned non-JSON body (status {})", url, status))?;
        Ok(UpstreamReply { status, body })
    }
}

/// Credential first, `language=en-US` unless the caller sets one, then the
/// caller's params verbatim.
pub fn upstream_query(api_key: &str, params: &[(String, String)]) -> Vec<(String, String)> {
    let mut query = Vec::with_capacity(params.len() + 2);
    query.push(("api_key".to_string(), api_key.to_string()));
    if !params.iter().any(|(k, _)| k == "language") {
        query.push(("language".to_string(), DEFAULT_LANGUAGE.to_string()));
    }
    query.extend(params.iter().cloned());
    query
}

pub fn redacted_query(query: &[(String, String)]) -> String {
    query
        .iter()
        .map(|(k, v)| {
            let value = if k == "api_key" { "***" } else { v.as_str() };
            format!("{}={}", urlencoding::encode(k), urlencoding::encode(value))
        })
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn query_injects_key_and_default_language() {
        let q = upstream_query("secret", &params(&[("region", "IN")]));
        assert_eq!(
            q,
            params(&[("api_key", "secret"), ("language", "en-US"), ("region", "IN")])
        );
    }

    #[test]
    fn caller_language_replaces_default() {
        let q = upstream_query("secret", &params(&[("language", "hi-IN")]));
        assert_eq!(q, params(&[("api_key", "secret"), ("language", "hi-IN")]));
    }

    #[test]
    fn redaction_hides_credential() {
        let q = upstream_query("secret", &params(&[("query", "the office")]));
        let shown = redacted_query(&q);
        assert!(!shown.contains("secret"));
        assert!(shown.contains("api_key=%2A%2A%2A"));
        assert!(shown.contains("query=the%20office"));
    }

    #[test]
    fn url_joins_logical_path() {
        let client = TmdbClient::new("http://upstream/3/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.url_for("/movie/550"), "http://upstream/3/movie/550");
    }
}
