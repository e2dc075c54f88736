use async_trait::async_trait;
use rand::Rng;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::provider::{ContentProvider, PostQuery};
use crate::shuffle::shuffled;

/// Posts fetched per channel on each relay pass.
pub const RELAY_PAGE_SIZE: u32 = 15;

/// Random start offsets are drawn from [0, MAX_START_OFFSET).
pub const MAX_START_OFFSET: u64 = 20;

/// Pause between consecutive channels, rate-limiting the provider and
/// pacing delivery to the consumer.
pub const CHANNEL_PACING: Duration = Duration::from_millis(1200);

/// Destination for relay frames. The web layer backs this with the SSE
/// response channel; tests substitute recording sinks.
#[async_trait]
pub trait EventSink: Send {
    /// Push one framed payload to the consumer.
    async fn push_frame(&mut self, frame: String);

    /// Whether the consumer has disconnected. Checked only between
    /// channel iterations; cancellation is cooperative and coarse.
    fn is_consumer_gone(&self) -> bool;
}

/// Relay one randomized pass over `channels` into `sink`.
///
/// Each channel yields at most one frame: a page of RELAY_PAGE_SIZE posts
/// fetched at a random offset, JSON-encoded. Failed or empty fetches are
/// skipped without surfacing an error; the fixed pacing delay elapses
/// after every channel regardless of outcome. The pass stops early if the
/// consumer is gone at a checkpoint, and never loops back.
pub async fn relay_posts<R: Rng + Send>(
    provider: &dyn ContentProvider,
    channels: &[String],
    sink: &mut dyn EventSink,
    rng: &mut R,
) {
    let working_order = shuffled(channels, rng);
    info!(channels = working_order.len(), "live relay started");

    for channel in &working_order {
        if sink.is_consumer_gone() {
            info!("consumer disconnected, stopping relay");
            break;
        }

        let offset = rng.random_range(0..MAX_START_OFFSET);
        let query = PostQuery {
            limit: RELAY_PAGE_SIZE,
            offset,
            reblog_info: true,
        };

        match provider.posts(channel, query).await {
            Ok(posts) if !posts.is_empty() => match serde_json::to_string(&posts) {
                Ok(frame) => {
                    info!(%channel, posts = posts.len(), "relaying frame");
                    sink.push_frame(frame).await;
                }
                Err(e) => warn!(%channel, error = %e, "failed to encode frame, skipping"),
            },
            Ok(_) => debug!(%channel, "no posts at offset, skipping"),
            Err(e) => warn!(%channel, error = %e, "channel fetch failed, skipping"),
        }

        tokio::time::sleep(CHANNEL_PACING).await;
    }
}
