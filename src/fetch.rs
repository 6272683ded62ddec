use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use log::warn;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::error::FetchError;

/// Request headers as (name, value) pairs, in send order.
pub type HeaderSet = Vec<(String, String)>;

/// Transport used by the coordinator to pull a page body.
///
/// CONTRACT:
/// - Non-2xx responses are errors
/// - A request exceeding `timeout` is `FetchError::Timeout`
/// - No retries; the caller decides what a failure means
///
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(
        &self,
        url: &str,
        headers: &HeaderSet,
        timeout: Duration,
    ) -> Result<String, FetchError>;
}

/// reqwest-backed fetcher shared by all sources.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(
        &self,
        url: &str,
        headers: &HeaderSet,
        timeout: Duration,
    ) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .headers(header_map(headers))
            .timeout(timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.text().await?)
    }
}

/// Invalid names or values are dropped with a warning rather than
/// failing the request.
fn header_map(headers: &HeaderSet) -> HeaderMap {
    let mut map = HeaderMap::with_capacity(headers.len());

    for (name, value) in headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                map.insert(name, value);
            }
            _ => warn!("[Fetch] dropping invalid header {name:?}"),
        }
    }

    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_map_skips_invalid_entries() {
        let headers = vec![
            ("User-Agent".to_string(), "jobs-harvester/0.1".to_string()),
            ("Bad Header".to_string(), "x".to_string()),
            ("Referer".to_string(), "https://www.linkedin.com/jobs/".to_string()),
        ];

        let map = header_map(&headers);

        assert_eq!(map.len(), 2);
        assert_eq!(map["user-agent"], "jobs-harvester/0.1");
        assert!(map.contains_key("referer"));
    }
}
