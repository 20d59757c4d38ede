//! Pipeline orchestrator
//!
//! One [`Pipeline::run`] ingests every configured channel concurrently. Inside
//! a channel, posts not yet in the ledger are ingested concurrently (and photos
//! within each post), then the channel's ledger records are written in one
//! batch once every post has finished. Posts already recorded are left alone,
//! files included. A failing channel never cancels or blocks its siblings.

use crate::config::Config;
use crate::error::Result;
use crate::ingest::PostIngestor;
use crate::ledger::Ledger;
use crate::media::MediaStore;
use crate::source::{ChannelSource, VkClient};
use crate::types::{
    ChannelOutcome, ChannelReport, Event, InsertOutcome, PhotoOutcome, PostFiles, PostId,
    RunReport,
};
use chrono::Utc;
use futures::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::broadcast;

/// Event buffer per subscriber; slow subscribers lag rather than block a run
const EVENT_BUFFER: usize = 1000;

/// Ingestion pipeline (cloneable - all shared state is Arc-wrapped)
#[derive(Clone)]
pub struct Pipeline {
    /// Configuration
    config: Arc<Config>,
    /// Remote API (trait object so tests can swap in a fake)
    source: Arc<dyn ChannelSource>,
    /// Media files
    media: MediaStore,
    /// Used/unused records
    ledger: Ledger,
    /// Event broadcast channel sender (multiple subscribers supported)
    event_tx: broadcast::Sender<Event>,
}

impl Pipeline {
    /// Create a pipeline talking to the VK API described by `config.api`
    ///
    /// # Errors
    ///
    /// [`Error::Config`](crate::Error::Config) if the configuration is invalid,
    /// or a network error if the HTTP client cannot be built.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let source = Arc::new(VkClient::new(&config.api)?);
        Ok(Self::with_source(config, source))
    }

    /// Create a pipeline over any [`ChannelSource`]
    pub fn with_source(config: Config, source: Arc<dyn ChannelSource>) -> Self {
        let media = MediaStore::new(&config.storage.data_dir);
        let ledger = Ledger::new(&config.storage.ledger_path);
        let (event_tx, _rx) = broadcast::channel(EVENT_BUFFER);

        Self {
            config: Arc::new(config),
            source,
            media,
            ledger,
            event_tx,
        }
    }

    /// Subscribe to progress events
    ///
    /// Each subscriber receives every event emitted after it subscribed.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Configuration in use
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Media store the pipeline writes into
    pub fn media(&self) -> &MediaStore {
        &self.media
    }

    /// Ledger the pipeline records into
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Ingest every configured channel once.
    ///
    /// Waits for all channels, including their nested post and photo work,
    /// before returning. Per-channel failures are reported in the returned
    /// [`RunReport`], never propagated.
    pub async fn run(&self) -> RunReport {
        let started_at = Utc::now();
        let start = Instant::now();
        tracing::info!(
            channels = self.config.channels.len(),
            "Starting ingestion run"
        );

        let channels = join_all(self.config.channels.iter().map(|identifier| async move {
            let result = self.run_channel(identifier).await;
            if let Err(e) = &result {
                tracing::warn!(
                    identifier = %identifier,
                    code = e.error_code(),
                    error = %e,
                    "Channel ingestion failed"
                );
                self.emit(Event::ChannelFailed {
                    identifier: identifier.clone(),
                    code: e.error_code().to_string(),
                    error: e.to_string(),
                });
            }
            ChannelOutcome {
                identifier: identifier.clone(),
                result,
            }
        }))
        .await;

        let report = RunReport {
            started_at,
            elapsed: start.elapsed(),
            channels,
        };

        let succeeded = report.succeeded().count();
        let failed = report.failed().count();
        let elapsed_ms = report.elapsed.as_millis() as u64;
        tracing::info!(succeeded, failed, elapsed_ms, "Ingestion run completed");
        self.emit(Event::RunCompleted {
            succeeded,
            failed,
            elapsed_ms,
        });

        report
    }

    /// Ingest one channel: resolve, fetch recent posts, persist the ones not
    /// yet recorded, then write the channel's ledger batch.
    ///
    /// Posts already in the ledger count as duplicates; their files are not
    /// touched.
    pub async fn run_channel(&self, identifier: &str) -> Result<ChannelReport> {
        let start = Instant::now();

        let channel = self.source.resolve_channel(identifier).await?;
        self.emit(Event::ChannelResolved {
            identifier: channel.identifier.clone(),
            id: channel.id,
            name: channel.name.clone(),
        });

        let posts = self
            .source
            .recent_posts(&channel, self.config.api.post_count)
            .await?;
        tracing::debug!(
            channel = %channel.name,
            posts = posts.len(),
            "Fetched recent posts"
        );

        // Posts already in the ledger keep the files written when they were
        // first recorded; only new posts are ingested
        let ids: Vec<PostId> = posts.iter().map(|post| post.id).collect();
        let recorded = self.ledger.recorded_ids(&channel.name, &ids).await?;
        if !recorded.is_empty() {
            tracing::debug!(
                channel = %channel.name,
                already_recorded = recorded.len(),
                "Skipping posts already in the ledger"
            );
        }

        let ingestor = PostIngestor::new(&self.media, self.source.as_ref());
        let ingested = join_all(
            posts
                .iter()
                .filter(|post| !recorded.contains(&post.id))
                .map(|post| ingestor.ingest_post(&channel.name, post)),
        )
        .await
        .into_iter()
        .collect::<Result<Vec<_>>>()?;

        let mut photos_saved = 0;
        let mut photos_skipped = 0;
        for post in &ingested {
            for photo in &post.photos {
                match photo {
                    PhotoOutcome::Saved(_) => photos_saved += 1,
                    PhotoOutcome::Skipped { position, reason } => {
                        photos_skipped += 1;
                        self.emit(Event::PhotoSkipped {
                            channel: channel.name.clone(),
                            post_id: post.record.post_id,
                            position: *position,
                            reason: reason.clone(),
                        });
                    }
                }
            }
            self.emit(Event::PostIngested {
                channel: channel.name.clone(),
                post_id: post.record.post_id,
                text_exists: post.record.text_exists,
                photo_count: post.record.photo_count,
            });
        }

        // Every post task has finished; one ledger write for the channel
        let records: Vec<_> = ingested.iter().map(|post| post.record).collect();
        let outcomes = self.ledger.record_batch(&channel.name, &records).await?;
        let records_inserted = outcomes
            .iter()
            .filter(|o| **o == InsertOutcome::Inserted)
            .count();
        let duplicates = recorded.len() + (outcomes.len() - records_inserted);

        let report = ChannelReport {
            posts_fetched: posts.len(),
            records_inserted,
            duplicates,
            photos_saved,
            photos_skipped,
            elapsed: start.elapsed(),
            channel,
        };

        tracing::info!(
            channel = %report.channel.name,
            posts = report.posts_fetched,
            inserted = report.records_inserted,
            duplicates = report.duplicates,
            photos_saved = report.photos_saved,
            photos_skipped = report.photos_skipped,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Channel ingested"
        );
        self.emit(Event::ChannelCompleted {
            channel: report.channel.name.clone(),
            records_inserted,
            duplicates,
        });

        Ok(report)
    }

    /// Files of every unused post of a channel, keyed by post ID.
    ///
    /// This is the hand-off for a downstream consumer, which is expected to
    /// [`Ledger::mark_used`] the posts it takes.
    pub async fn unused_post_files(&self, channel_name: &str) -> Result<BTreeMap<PostId, PostFiles>> {
        let unused = self.ledger.fetch_unused(channel_name).await?;
        Ok(unused
            .into_iter()
            .map(|(post_id, post)| {
                let files = self.media.post_files(
                    channel_name,
                    post_id,
                    post.text_exists,
                    post.count_photo,
                );
                (post_id, files)
            })
            .collect())
    }

    fn emit(&self, event: Event) {
        // No subscribers is not an error
        let _ = self.event_tx.send(event);
    }
}
