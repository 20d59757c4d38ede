//! HTTP client for the VK method API

use super::traits::ChannelSource;
use super::wire::{self, ApiErrorBody, GroupsResponse, WallResponse};
use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::types::{Channel, Post};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

/// [`ChannelSource`] backed by the VK method API
///
/// Holds one `reqwest::Client` for API calls and photo downloads. Use
/// [`ApiConfig::base_url`] to point it at a mock server in tests.
pub struct VkClient {
    http: reqwest::Client,
    base_url: Url,
    token: String,
    version: String,
}

impl VkClient {
    /// Build a client from API settings
    ///
    /// # Errors
    ///
    /// [`Error::Network`] if the HTTP client cannot be constructed, or
    /// [`Error::Config`] if the base URL is not a valid URL.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("wall-ingest/", env!("CARGO_PKG_VERSION")))
            .build()?;

        // Ensure exactly one trailing slash so method names join as path segments
        let normalized = format!("{}/", config.base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalized).map_err(|e| Error::Config {
            message: format!("invalid API base URL '{}': {}", config.base_url, e),
            key: Some("VK_API_URL".to_string()),
        })?;

        Ok(Self {
            http,
            base_url,
            token: config.token.clone(),
            version: config.version.clone(),
        })
    }

    /// Call an API method and decode its `response` payload
    async fn call<T: DeserializeOwned>(&self, method: &str, params: &[(&str, String)]) -> Result<T> {
        let url = self.base_url.join(method)?;
        tracing::debug!(method, "Calling remote API");

        let body: Value = self
            .http
            .get(url)
            .query(&[("access_token", self.token.as_str()), ("v", self.version.as_str())])
            .query(params)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        decode_envelope(method, body)
    }
}

/// Split an API envelope into its payload or its error
pub(super) fn decode_envelope<T: DeserializeOwned>(method: &str, mut body: Value) -> Result<T> {
    if let Some(error) = body.get_mut("error").map(Value::take) {
        let error: ApiErrorBody =
            serde_json::from_value(error).map_err(|e| Error::UnexpectedResponse {
                method: method.to_string(),
                reason: format!("unreadable error body: {}", e),
            })?;
        return Err(Error::Api {
            method: method.to_string(),
            code: error.error_code,
            message: error.error_msg,
        });
    }

    let response = body
        .get_mut("response")
        .map(Value::take)
        .ok_or_else(|| Error::UnexpectedResponse {
            method: method.to_string(),
            reason: "neither `response` nor `error` present".to_string(),
        })?;

    serde_json::from_value(response).map_err(|e| Error::UnexpectedResponse {
        method: method.to_string(),
        reason: e.to_string(),
    })
}

#[async_trait]
impl ChannelSource for VkClient {
    async fn resolve_channel(&self, identifier: &str) -> Result<Channel> {
        let groups: GroupsResponse = self
            .call(
                "groups.getById",
                &[("group_ids", identifier.to_string())],
            )
            .await?;

        let channel = groups
            .into_first()
            .ok_or_else(|| Error::ChannelNotFound(identifier.to_string()))?
            .into_channel(identifier);

        tracing::debug!(
            identifier,
            id = channel.id,
            name = %channel.name,
            "Resolved channel"
        );
        Ok(channel)
    }

    async fn recent_posts(&self, channel: &Channel, count: u32) -> Result<Vec<Post>> {
        let wall: WallResponse = self
            .call(
                "wall.get",
                &[
                    ("owner_id", channel.owner_id().to_string()),
                    ("count", count.to_string()),
                ],
            )
            .await?;

        Ok(wall
            .items
            .into_iter()
            .filter_map(wire::post_from_value)
            .take(count as usize)
            .collect())
    }

    async fn fetch_photo(&self, url: &Url) -> Result<Vec<u8>> {
        let bytes = self
            .http
            .get(url.clone())
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        Ok(bytes.to_vec())
    }
}
