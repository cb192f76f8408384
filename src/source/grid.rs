use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::provider::PayloadSource;

/// Match timeline fetched from the GRID series-data API.
pub struct GridSource {
    http: Client,
    endpoint: Url,
    api_key: String,
    name: String,
}

impl GridSource {
    pub fn new(base_url: &str, api_key: &str, match_id: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(GridSource {
            http,
            endpoint: timeline_url(base_url, match_id)?,
            api_key: api_key.to_string(),
            name: format!("grid:{}", match_id),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

/// `{base}/series-data/matches/{id}/timeline`, with the id escaped.
fn timeline_url(base_url: &str, match_id: &str) -> Result<Url> {
    let mut url = Url::parse(base_url).with_context(|| format!("Invalid GRID base URL '{}'", base_url))?;
    url.path_segments_mut()
        .map_err(|_| anyhow::anyhow!("GRID base URL '{}' cannot carry a path", base_url))?
        .pop_if_empty()
        .extend(["series-data", "matches", match_id, "timeline"]);
    Ok(url)
}

#[async_trait]
impl PayloadSource for GridSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self) -> Result<Value> {
        debug!("Fetching match timeline from {}", self.endpoint);

        let resp = self
            .http
            .get(self.endpoint.clone())
            .header("x-api-key", &self.api_key)
            .send()
            .await
            .context("GRID request failed")?;

        if !resp.status().is_success() {
            anyhow::bail!("GRID error: {}", resp.status());
        }

        resp.json().await.context("Failed to parse GRID response")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeline_url() {
        let url = timeline_url("https://api.grid.gg", "2718").unwrap();
        assert_eq!(url.as_str(), "https://api.grid.gg/series-data/matches/2718/timeline");
    }

    #[test]
    fn test_timeline_url_keeps_base_path_and_escapes_id() {
        let url = timeline_url("https://example.com/proxy/", "a/b").unwrap();
        assert_eq!(url.as_str(), "https://example.com/proxy/series-data/matches/a%2Fb/timeline");
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(timeline_url("not a url", "1").is_err());
        assert!(timeline_url("mailto:someone@example.com", "1").is_err());
    }

    #[test]
    fn test_source_name() {
        let source = GridSource::new("https://api.grid.gg", "key", "42", Duration::from_secs(5)).unwrap();
        assert_eq!(source.name(), "grid:42");
        assert!(source.endpoint().as_str().ends_with("/42/timeline"));
    }
}
