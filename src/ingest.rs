//! Post ingestion: persist one post's text and photos
//!
//! Photos of a post are downloaded concurrently. Successful downloads are then
//! numbered `1..=n` in attachment order and written concurrently, so the photo
//! count handed to the ledger always equals the number of files on disk.

use crate::error::Result;
use crate::media::MediaStore;
use crate::source::ChannelSource;
use crate::types::{IngestedPost, LedgerRecord, PhotoOutcome, Post, SkipReason};
use futures::future::join_all;

/// Persists posts of a channel into a [`MediaStore`], fetching photo bytes
/// through a [`ChannelSource`]
pub struct PostIngestor<'a> {
    media: &'a MediaStore,
    source: &'a dyn ChannelSource,
}

impl<'a> PostIngestor<'a> {
    /// Create an ingestor over a media store and a photo source
    pub fn new(media: &'a MediaStore, source: &'a dyn ChannelSource) -> Self {
        Self { media, source }
    }

    /// Persist one post and build its ledger record.
    ///
    /// A photo whose URL cannot be resolved, or whose download fails, is
    /// skipped and left out of the record's photo count. The ledger itself is
    /// not touched here; the caller batches records per channel.
    ///
    /// # Errors
    ///
    /// Storage failures (directories or files that cannot be written) abort
    /// the post.
    pub async fn ingest_post(&self, channel_name: &str, post: &Post) -> Result<IngestedPost> {
        self.media.ensure_channel_dirs(channel_name).await?;

        let text_path = if post.has_text() {
            Some(
                self.media
                    .write_text(channel_name, post.id, &post.text)
                    .await?,
            )
        } else {
            None
        };

        let downloads = join_all(post.photos().map(|photo| async move {
            let url = photo.resolve_url()?;
            let bytes = self
                .source
                .fetch_photo(&url)
                .await
                .map_err(|e| SkipReason::DownloadFailed(e.to_string()))?;
            Ok::<_, SkipReason>(bytes)
        }))
        .await;

        // Number successful downloads before any write starts
        let mut saved = 0usize;
        let slots: Vec<_> = downloads
            .into_iter()
            .enumerate()
            .map(|(i, download)| {
                let position = i + 1;
                match download {
                    Ok(bytes) => {
                        saved += 1;
                        Ok((saved, bytes))
                    }
                    Err(reason) => Err((position, reason)),
                }
            })
            .collect();

        let photos = join_all(slots.into_iter().map(|slot| async move {
            match slot {
                Ok((index, bytes)) => self
                    .media
                    .write_photo(channel_name, post.id, index, &bytes)
                    .await
                    .map(PhotoOutcome::Saved),
                Err((position, reason)) => Ok(PhotoOutcome::Skipped { position, reason }),
            }
        }))
        .await
        .into_iter()
        .collect::<Result<Vec<_>>>()?;

        for outcome in &photos {
            if let PhotoOutcome::Skipped { position, reason } = outcome {
                tracing::warn!(
                    channel = %channel_name,
                    post_id = post.id.0,
                    position,
                    reason = %reason,
                    "Skipped photo"
                );
            }
        }

        let record = LedgerRecord::new(post.id, text_path.is_some(), saved as u32);
        tracing::debug!(
            channel = %channel_name,
            post_id = post.id.0,
            text_exists = record.text_exists,
            photo_count = record.photo_count,
            "Post ingested"
        );

        Ok(IngestedPost {
            record,
            text_path,
            photos,
        })
    }
}
