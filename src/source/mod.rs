//! Remote channel API access
//!
//! The ingestion pipeline never talks HTTP directly. It consumes a
//! [`ChannelSource`], which resolves channels, lists their recent wall posts
//! and fetches photo bytes.
//!
//! - [`VkClient`]: the HTTP implementation against the VK method API
//!
//! ## Usage
//!
//! ```no_run
//! use wall_ingest::config::ApiConfig;
//! use wall_ingest::source::{ChannelSource, VkClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = VkClient::new(&ApiConfig::with_token("token"))?;
//!
//!     let channel = client.resolve_channel("apiclub").await?;
//!     let posts = client.recent_posts(&channel, 10).await?;
//!     println!("{} has {} recent posts", channel.name, posts.len());
//!
//!     Ok(())
//! }
//! ```

mod traits;
mod vk;
mod wire;

pub use traits::ChannelSource;
pub use vk::VkClient;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod memory;
