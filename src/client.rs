// Upstream client for the NextBus public XML feed.
//
// Feed endpoint: https://retro.umoiq.com/service/publicXMLFeed
// - command=predictions&a=<agency>&stopId=<id>
// - command=routeConfig&a=<agency>&r=<route tag>
// - command=routeList&a=<agency>

use crate::config::FeedConfig;
use crate::error::{FeedError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use tracing::{Instrument, debug, info_span};

/// A single request against the feed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FeedQuery {
    Predictions { stop_id: String },
    RouteConfig { route_tag: String },
    RouteList,
}

impl FeedQuery {
    pub fn command(&self) -> &'static str {
        match self {
            FeedQuery::Predictions { .. } => "predictions",
            FeedQuery::RouteConfig { .. } => "routeConfig",
            FeedQuery::RouteList => "routeList",
        }
    }

    /// Query parameters in the order the feed documents them.
    pub fn query_pairs<'a>(&'a self, agency: &'a str) -> Vec<(&'static str, &'a str)> {
        let mut pairs = vec![("command", self.command()), ("a", agency)];
        match self {
            FeedQuery::Predictions { stop_id } => pairs.push(("stopId", stop_id.as_str())),
            FeedQuery::RouteConfig { route_tag } => pairs.push(("r", route_tag.as_str())),
            FeedQuery::RouteList => {}
        }
        pairs
    }
}

/// Fetches raw feed documents.
#[async_trait]
pub trait FeedFetcher: Send + Sync {
    async fn fetch(&self, query: &FeedQuery) -> Result<Bytes>;
}

pub struct NextBusClient {
    http: reqwest::Client,
    config: FeedConfig,
}

impl NextBusClient {
    pub fn new(config: FeedConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FeedError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(NextBusClient { http, config })
    }
}

#[async_trait]
impl FeedFetcher for NextBusClient {
    #[tracing::instrument(skip(self), err)]
    async fn fetch(&self, query: &FeedQuery) -> Result<Bytes> {
        let response = self
            .http
            .get(self.config.base_url.clone())
            .query(&query.query_pairs(&self.config.agency))
            .send()
            .instrument(info_span!("Fetching feed", command = query.command()))
            .await
            .map_err(|e| FeedError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Transport(format!("feed returned {}", status)));
        }

        let body = response
            .bytes()
            .instrument(info_span!("Reading body of response"))
            .await
            .map_err(|e| FeedError::Transport(format!("Failed to read response: {}", e)))?;

        debug!(bytes = body.len(), "feed document received");

        Ok(body)
    }
}
