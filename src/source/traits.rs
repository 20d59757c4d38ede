//! The channel source seam

use crate::types::{Channel, Post};
use async_trait::async_trait;
use url::Url;

/// Remote collaborator consumed by the pipeline
///
/// Implementations receive an already-authenticated session; none of these
/// calls retry. A failure is returned to the caller, which scopes it to the
/// channel being processed.
#[async_trait]
pub trait ChannelSource: Send + Sync {
    /// Resolve a configured identifier to the channel's numeric ID and name
    ///
    /// # Errors
    ///
    /// Transport failures, API error envelopes, or
    /// [`Error::ChannelNotFound`](crate::Error::ChannelNotFound) when the API
    /// returns no match.
    async fn resolve_channel(&self, identifier: &str) -> crate::Result<Channel>;

    /// Up to `count` of the channel's most recent posts, newest first, in the
    /// order the API returned them
    async fn recent_posts(&self, channel: &Channel, count: u32) -> crate::Result<Vec<Post>>;

    /// Raw bytes behind a photo URL
    async fn fetch_photo(&self, url: &Url) -> crate::Result<Vec<u8>>;
}
