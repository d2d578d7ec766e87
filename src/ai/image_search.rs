use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use super::UpstreamError;
use crate::config::ImageSearchConfig;

const PROVIDER: &str = "bing";
const SIZE_FILTER: &str = "medium";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageHit {
    pub content_url: String,
}

#[derive(Debug, Default, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    value: Option<Vec<ImageHit>>,
}

#[async_trait]
pub trait ImageSearch: Send + Sync {
    /// Hits in provider ranking order; empty when nothing matched.
    async fn search(&self, query: &str) -> Result<Vec<ImageHit>, UpstreamError>;
}

#[derive(Clone)]
pub struct BingImageSearch {
    http: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl BingImageSearch {
    pub fn new(http: reqwest::Client, config: &ImageSearchConfig) -> Self {
        Self {
            http,
            api_key: config.api_key.clone(),
            endpoint: config.endpoint.clone(),
        }
    }
}

#[async_trait]
impl ImageSearch for BingImageSearch {
    async fn search(&self, query: &str) -> Result<Vec<ImageHit>, UpstreamError> {
        let response = self
            .http
            .get(&self.endpoint)
            .header("Ocp-Apim-Subscription-Key", &self.api_key)
            .query(&[("q", query), ("size", SIZE_FILTER)])
            .send()
            .await
            .map_err(|source| UpstreamError::Request {
                provider: PROVIDER,
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, "image search rejected");
            return Err(UpstreamError::Status {
                provider: PROVIDER,
                status: status.as_u16(),
            });
        }

        let body = response
            .json::<SearchResponse>()
            .await
            .map_err(|e| UpstreamError::Parse {
                provider: PROVIDER,
                reason: e.to_string(),
            })?;
        let hits = body.value.unwrap_or_default();
        debug!(query, hits = hits.len(), "image search done");
        Ok(hits)
    }
}
