use rand::Rng;
use tracing::{debug, info};

use crate::provider::{ContentProvider, Post, PostQuery};
use crate::shuffle::shuffled;

/// Page size for history pagination.
pub const PAGE_SIZE: u32 = 50;

/// Upper bound on posts fetched from a single channel.
pub const FETCH_CAP: u64 = 500;

/// Channels reporting at least this many posts are capped at FETCH_CAP.
pub const CAP_THRESHOLD: u64 = 1000;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SyncError {
    #[error("channel not found")]
    ChannelNotFound,

    #[error("fetch failed")]
    FetchFailed,
}

/// How many posts to fetch given a channel's reported post count.
/// Small channels are fetched exhaustively; very large ones are capped.
pub fn fetch_target(post_count: u64) -> u64 {
    if post_count >= CAP_THRESHOLD {
        FETCH_CAP
    } else {
        post_count
    }
}

/// Fetch a channel's post history and return it in uniformly random order.
///
/// Pages of PAGE_SIZE are requested strictly one after another at offsets
/// 0, 50, 100, ... until the accumulated count reaches the target or the
/// provider returns a short page (exhausted, or the reported count was
/// stale). A metadata failure maps to ChannelNotFound without issuing any
/// page request; any page failure aborts the whole sync with FetchFailed
/// and discards partial results.
pub async fn sync_channel<R: Rng + Send>(
    provider: &dyn ContentProvider,
    channel: &str,
    rng: &mut R,
) -> Result<Vec<Post>, SyncError> {
    let info = provider
        .channel_info(channel)
        .await
        .map_err(|_| SyncError::ChannelNotFound)?;

    let target = fetch_target(info.post_count);
    info!(
        channel,
        post_count = info.post_count,
        target,
        "starting bulk sync"
    );

    let mut posts: Vec<Post> = Vec::with_capacity(target as usize);
    let mut offset: u64 = 0;

    while (posts.len() as u64) < target {
        let page = provider
            .posts(
                channel,
                PostQuery {
                    limit: PAGE_SIZE,
                    offset,
                    reblog_info: true,
                },
            )
            .await
            .map_err(|_| SyncError::FetchFailed)?;

        let exhausted = page.len() < PAGE_SIZE as usize;
        posts.extend(page);
        debug!(channel, fetched = posts.len(), target, "sync progress");

        if exhausted {
            break;
        }
        offset += u64::from(PAGE_SIZE);
    }

    info!(channel, total = posts.len(), "bulk sync finished");
    Ok(shuffled(&posts, rng))
}
