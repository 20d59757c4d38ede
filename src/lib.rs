//! # wall-ingest
//!
//! Ingests the most recent wall posts of a set of remote channels into a local
//! media store and a per-channel "used/unused" ledger, for a downstream
//! republisher to consume.
//!
//! ## Design Philosophy
//!
//! wall-ingest is designed to be:
//! - **Batch-oriented** - One [`Pipeline::run`] per invocation, no daemon
//! - **Idempotent** - Re-ingesting a post never duplicates or resets its ledger row
//! - **Isolated** - One failing channel never aborts the others
//! - **Event-driven** - Consumers can subscribe to progress events
//!
//! ## Layout on disk
//!
//! ```text
//! <data_dir>/<channel>/text/<post_id>.txt
//! <data_dir>/<channel>/photo/<post_id>-item-<n>.jpg
//! <ledger_path>   (SQLite, one table per channel)
//! ```
//!
//! ## Quick Start
//!
//! ```no_run
//! use wall_ingest::{Config, Pipeline};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let pipeline = Pipeline::new(config)?;
//!
//!     // Subscribe to events
//!     let mut events = pipeline.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let report = pipeline.run().await;
//!     println!("done in {:?}", report.elapsed);
//!
//!     // Hand unused posts to a consumer, then mark them used
//!     let unused = pipeline.unused_post_files("demo").await?;
//!     let taken: Vec<_> = unused.keys().copied().collect();
//!     pipeline.ledger().mark_used("demo", &taken).await?;
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Post ingestion (text and photos of one post)
pub mod ingest;
/// Per-channel used/unused ledger
pub mod ledger;
/// Filesystem media store
pub mod media;
/// Run orchestration
pub mod pipeline;
/// Remote channel sources
pub mod source;
/// Core types and events
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use config::{ApiConfig, Config, StorageConfig};
pub use error::{DatabaseError, Error, Result};
pub use ingest::PostIngestor;
pub use ledger::Ledger;
pub use media::MediaStore;
pub use pipeline::Pipeline;
pub use source::{ChannelSource, VkClient};
pub use types::{
    Attachment, Channel, ChannelOutcome, ChannelReport, Event, IngestedPost, InsertOutcome,
    LedgerRecord, Photo, PhotoOutcome, PhotoSize, Post, PostFiles, PostId, RunReport, SkipReason,
    UnusedPost,
};
