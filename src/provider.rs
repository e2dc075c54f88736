use async_trait::async_trait;

/// A post as returned by the provider. The shape is provider-defined and
/// passed through to clients unmodified; no schema is imposed here.
pub type Post = serde_json::Value;

/// Channel metadata reported by the provider.
#[derive(Debug, Clone, Copy)]
pub struct ChannelInfo {
    pub post_count: u64,
}

/// Parameters for one page request.
#[derive(Debug, Clone, Copy)]
pub struct PostQuery {
    pub limit: u32,
    pub offset: u64,
    /// Request reblog provenance alongside each post.
    pub reblog_info: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("channel not found: {0}")]
    NotFound(String),

    /// Any transport or API-level failure. Network errors collapse into
    /// this from the caller's perspective.
    #[error("fetch failed: {0}")]
    Fetch(String),
}

/// Abstraction over the remote content provider. The sync and relay
/// components only see this trait; the Tumblr client implements it, and
/// tests substitute scripted providers.
#[async_trait]
pub trait ContentProvider: Send + Sync {
    /// Query channel metadata (post count).
    async fn channel_info(&self, channel: &str) -> Result<ChannelInfo, ProviderError>;

    /// Fetch one page of posts.
    async fn posts(&self, channel: &str, query: PostQuery) -> Result<Vec<Post>, ProviderError>;
}
