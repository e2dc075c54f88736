use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use crate::config::Credentials;
use crate::provider::{ChannelInfo, ContentProvider, Post, PostQuery, ProviderError};

pub const DEFAULT_API_BASE: &str = "https://api.tumblr.com";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// HTTP client for the Tumblr REST API (v2).
///
/// Read endpoints authenticate with the consumer key; the remaining
/// credential strings are carried as opaque configuration.
pub struct TumblrClient {
    creds: Credentials,
    api_base: String,
    http: reqwest::Client,
}

impl TumblrClient {
    pub fn new(creds: Credentials) -> anyhow::Result<Self> {
        Self::with_base_url(creds, DEFAULT_API_BASE)
    }

    /// Create a client against a non-default API base (used by tests).
    pub fn with_base_url(creds: Credentials, api_base: impl Into<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("phazr/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            creds,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    /// Access credentials (for testing).
    pub fn credentials(&self) -> &Credentials {
        &self.creds
    }

    /// Build a full API URL for a blog endpoint.
    fn blog_url(&self, channel: &str, endpoint: &str) -> String {
        format!("{}/v2/blog/{channel}/{endpoint}", self.api_base)
    }

    /// Make an authenticated GET request, return the `response` payload
    /// of the API envelope.
    async fn get(
        &self,
        channel: &str,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<Value, ProviderError> {
        let url = self.blog_url(channel, endpoint);
        let resp = self
            .http
            .get(&url)
            .query(&[("api_key", self.creds.consumer_key.as_str())])
            .query(params)
            .send()
            .await
            .map_err(|e| ProviderError::Fetch(format!("GET {endpoint}: {e}")))?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ProviderError::NotFound(channel.to_string()));
        }
        if !resp.status().is_success() {
            return Err(ProviderError::Fetch(format!(
                "GET {endpoint}: status {}",
                resp.status()
            )));
        }

        let body: Value = resp
            .json()
            .await
            .map_err(|e| ProviderError::Fetch(format!("GET {endpoint}: bad JSON: {e}")))?;
        Ok(body["response"].clone())
    }
}

#[async_trait]
impl ContentProvider for TumblrClient {
    async fn channel_info(&self, channel: &str) -> Result<ChannelInfo, ProviderError> {
        let response = self.get(channel, "info", &[]).await?;
        let post_count = response["blog"]["posts"]
            .as_u64()
            .ok_or_else(|| ProviderError::NotFound(channel.to_string()))?;
        Ok(ChannelInfo { post_count })
    }

    async fn posts(&self, channel: &str, query: PostQuery) -> Result<Vec<Post>, ProviderError> {
        let mut params = vec![
            ("limit", query.limit.to_string()),
            ("offset", query.offset.to_string()),
            ("npf", "true".to_string()),
        ];
        if query.reblog_info {
            params.push(("reblog_info", "true".to_string()));
        }

        let response = self.get(channel, "posts", &params).await?;
        match response["posts"].as_array() {
            Some(posts) => Ok(posts.clone()),
            None => Err(ProviderError::Fetch(format!(
                "posts missing from response for {channel}"
            ))),
        }
    }
}
