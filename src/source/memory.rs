//! In-memory channel source for tests

use super::traits::ChannelSource;
use crate::error::{Error, Result};
use crate::types::{Channel, Post};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use url::Url;

/// Serves canned channels, posts and photo bytes; records photo requests
#[derive(Default)]
pub(crate) struct MemorySource {
    channels: HashMap<String, (Channel, Vec<Post>)>,
    failing: HashMap<String, String>,
    photos: HashMap<String, Vec<u8>>,
    photo_requests: Mutex<Vec<String>>,
}

impl MemorySource {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_channel(mut self, identifier: &str, id: i64, name: &str, posts: Vec<Post>) -> Self {
        let channel = Channel {
            identifier: identifier.to_string(),
            id,
            name: name.to_string(),
        };
        self.channels.insert(identifier.to_string(), (channel, posts));
        self
    }

    /// Resolving this identifier fails with an API error
    pub(crate) fn with_failing_channel(mut self, identifier: &str, message: &str) -> Self {
        self.failing.insert(identifier.to_string(), message.to_string());
        self
    }

    pub(crate) fn with_photo(mut self, url: &str, bytes: &[u8]) -> Self {
        self.photos.insert(url.to_string(), bytes.to_vec());
        self
    }

    pub(crate) fn photo_requests(&self) -> Vec<String> {
        self.photo_requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChannelSource for MemorySource {
    async fn resolve_channel(&self, identifier: &str) -> Result<Channel> {
        if let Some(message) = self.failing.get(identifier) {
            return Err(Error::Api {
                method: "groups.getById".to_string(),
                code: 100,
                message: message.clone(),
            });
        }
        self.channels
            .get(identifier)
            .map(|(channel, _)| channel.clone())
            .ok_or_else(|| Error::ChannelNotFound(identifier.to_string()))
    }

    async fn recent_posts(&self, channel: &Channel, count: u32) -> Result<Vec<Post>> {
        Ok(self
            .channels
            .get(&channel.identifier)
            .map(|(_, posts)| posts.iter().take(count as usize).cloned().collect())
            .unwrap_or_default())
    }

    async fn fetch_photo(&self, url: &Url) -> Result<Vec<u8>> {
        self.photo_requests.lock().unwrap().push(url.to_string());
        // Yield so concurrently polled photo tasks interleave
        tokio::task::yield_now().await;
        self.photos
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| Error::Other(format!("no photo at {}", url)))
    }
}
