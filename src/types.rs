//! Core types and events

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Identifier of a post, unique within its channel
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(pub i64);

impl PostId {
    /// Get the inner i64 value
    pub fn get(&self) -> i64 {
        self.0
    }
}

impl From<i64> for PostId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<PostId> for i64 {
    fn from(id: PostId) -> Self {
        id.0
    }
}

impl std::fmt::Display for PostId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Stored as INTEGER in the ledger
impl sqlx::Type<sqlx::Sqlite> for PostId {
    fn type_info() -> sqlx::sqlite::SqliteTypeInfo {
        <i64 as sqlx::Type<sqlx::Sqlite>>::type_info()
    }

    fn compatible(ty: &sqlx::sqlite::SqliteTypeInfo) -> bool {
        <i64 as sqlx::Type<sqlx::Sqlite>>::compatible(ty)
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Sqlite> for PostId {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<sqlx::sqlite::SqliteArgumentValue<'q>>,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        sqlx::Encode::<sqlx::Sqlite>::encode_by_ref(&self.0, buf)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Sqlite> for PostId {
    fn decode(value: sqlx::sqlite::SqliteValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let id = <i64 as sqlx::Decode<sqlx::Sqlite>>::decode(value)?;
        Ok(Self(id))
    }
}

/// A remote channel, resolved once per run
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    /// Identifier as configured (screen name or numeric string)
    pub identifier: String,
    /// Resolved numeric ID (positive)
    pub id: i64,
    /// Display name; also names the media directory and the ledger table
    pub name: String,
}

impl Channel {
    /// Owner ID used by wall calls (community walls are addressed negatively)
    pub fn owner_id(&self) -> i64 {
        -self.id
    }
}

/// One size variant of a photo
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoSize {
    /// Direct URL of this variant
    pub url: String,
    /// Width in pixels, if reported
    pub width: Option<u32>,
    /// Height in pixels, if reported
    pub height: Option<u32>,
}

impl PhotoSize {
    /// Pixel area, if both dimensions are known and non-zero
    pub fn area(&self) -> Option<u64> {
        match (self.width, self.height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => Some(u64::from(w) * u64::from(h)),
            _ => None,
        }
    }
}

/// Photo attachment with its size variants, in the order the API returned them
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photo {
    /// Size variants
    pub sizes: Vec<PhotoSize>,
}

impl Photo {
    /// The largest variant by pixel area.
    ///
    /// Variants without dimensions rank below any with dimensions; ties keep
    /// the later variant, so a list without any dimensions yields its last
    /// element (the API lists sizes smallest to largest).
    pub fn largest(&self) -> Option<&PhotoSize> {
        self.sizes
            .iter()
            .enumerate()
            .max_by_key(|(index, size)| (size.area(), *index))
            .map(|(_, size)| size)
    }

    /// Source URL of the largest variant, or why there is none
    pub fn resolve_url(&self) -> std::result::Result<Url, SkipReason> {
        let size = self.largest().ok_or(SkipReason::NoSizes)?;
        if size.url.trim().is_empty() {
            return Err(SkipReason::InvalidUrl("empty URL".to_string()));
        }

        let url = Url::parse(&size.url)
            .map_err(|e| SkipReason::InvalidUrl(format!("{}: {}", size.url, e)))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(SkipReason::InvalidUrl(format!(
                "unsupported scheme {:?} in {}",
                other, size.url
            ))),
        }
    }
}

/// A post attachment
///
/// Only photos are ingested; every other kind is carried for completeness and
/// otherwise ignored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Attachment {
    /// Photo attachment
    Photo(Photo),
    /// Any other attachment kind (video, link, audio, ...)
    Other {
        /// Kind reported by the API
        kind_name: String,
    },
}

/// One post fetched from a channel wall. Immutable once fetched.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Post ID, unique within the channel
    pub id: PostId,
    /// Raw text (possibly empty)
    pub text: String,
    /// Attachments in API order
    pub attachments: Vec<Attachment>,
}

impl Post {
    /// Whether the post carries text
    pub fn has_text(&self) -> bool {
        !self.text.is_empty()
    }

    /// Photo attachments in order
    pub fn photos(&self) -> impl Iterator<Item = &Photo> {
        self.attachments.iter().filter_map(|a| match a {
            Attachment::Photo(photo) => Some(photo),
            Attachment::Other { .. } => None,
        })
    }
}

/// Why a single photo was not persisted
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    /// The attachment had no usable size variants
    NoSizes,
    /// The selected variant's URL is missing or malformed
    InvalidUrl(String),
    /// Fetching the photo bytes failed
    DownloadFailed(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::NoSizes => write!(f, "photo has no size variants"),
            SkipReason::InvalidUrl(detail) => write!(f, "invalid photo URL ({})", detail),
            SkipReason::DownloadFailed(detail) => write!(f, "photo download failed ({})", detail),
        }
    }
}

/// Result of one photo task
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PhotoOutcome {
    /// Photo written to this path
    Saved(PathBuf),
    /// Photo skipped; `position` is its 1-based position among the post's photo attachments
    Skipped {
        /// 1-based position among the post's photo attachments
        position: usize,
        /// Why it was skipped
        reason: SkipReason,
    },
}

/// Result of inserting a ledger row
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsertOutcome {
    /// A new row was created
    Inserted,
    /// A row for this post already existed and was left untouched
    AlreadyRecorded,
}

/// One ledger row
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRecord {
    /// Post ID
    pub post_id: PostId,
    /// Whether a text file was written for the post
    pub text_exists: bool,
    /// Number of photo files written for the post
    pub photo_count: u32,
    /// Whether a downstream consumer has taken the post
    pub used: bool,
}

impl LedgerRecord {
    /// Fresh, unused record for a just-ingested post
    pub fn new(post_id: PostId, text_exists: bool, photo_count: u32) -> Self {
        Self {
            post_id,
            text_exists,
            photo_count,
            used: false,
        }
    }
}

/// What `fetch_unused` reports for each unused post
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnusedPost {
    /// Whether a text file exists
    pub text_exists: bool,
    /// Number of photo files
    pub count_photo: u32,
}

/// Paths of the files persisted for one post
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PostFiles {
    /// Text file, if the post had text
    pub text: Option<PathBuf>,
    /// Photo files in order
    pub photos: Vec<PathBuf>,
}

/// Result of ingesting one post (before the ledger write)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IngestedPost {
    /// Record to be written to the ledger
    pub record: LedgerRecord,
    /// Text file written, if any
    pub text_path: Option<PathBuf>,
    /// Per-photo results, in attachment order
    pub photos: Vec<PhotoOutcome>,
}

impl IngestedPost {
    /// Number of photos that were skipped
    pub fn skipped_photos(&self) -> usize {
        self.photos
            .iter()
            .filter(|p| matches!(p, PhotoOutcome::Skipped { .. }))
            .count()
    }
}

/// Summary of one channel's ingestion
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelReport {
    /// Resolved channel
    pub channel: Channel,
    /// Posts fetched from the wall
    pub posts_fetched: usize,
    /// Ledger rows newly created
    pub records_inserted: usize,
    /// Posts that were already in the ledger
    pub duplicates: usize,
    /// Photo files written
    pub photos_saved: usize,
    /// Photos skipped
    pub photos_skipped: usize,
    /// Wall-clock time spent on the channel
    pub elapsed: Duration,
}

/// Outcome of one channel task
#[derive(Debug)]
pub struct ChannelOutcome {
    /// Channel identifier as configured
    pub identifier: String,
    /// Report, or the error that aborted the channel
    pub result: crate::Result<ChannelReport>,
}

/// Summary of a whole run
#[derive(Debug)]
pub struct RunReport {
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// Total wall-clock time, including all nested fan-out
    pub elapsed: Duration,
    /// One outcome per configured channel, in configuration order
    pub channels: Vec<ChannelOutcome>,
}

impl RunReport {
    /// Channels that completed
    pub fn succeeded(&self) -> impl Iterator<Item = &ChannelReport> {
        self.channels.iter().filter_map(|c| c.result.as_ref().ok())
    }

    /// Channels that failed, with their errors
    pub fn failed(&self) -> impl Iterator<Item = (&str, &crate::Error)> {
        self.channels
            .iter()
            .filter_map(|c| c.result.as_ref().err().map(|e| (c.identifier.as_str(), e)))
    }
}

/// Progress events emitted during a run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A channel identifier was resolved
    ChannelResolved {
        /// Identifier as configured
        identifier: String,
        /// Resolved numeric ID
        id: i64,
        /// Resolved name
        name: String,
    },
    /// A post's media was persisted
    PostIngested {
        /// Channel name
        channel: String,
        /// Post ID
        post_id: PostId,
        /// Whether text was written
        text_exists: bool,
        /// Photos written
        photo_count: u32,
    },
    /// A single photo was skipped
    PhotoSkipped {
        /// Channel name
        channel: String,
        /// Post ID
        post_id: PostId,
        /// 1-based position among the post's photo attachments
        position: usize,
        /// Why
        reason: SkipReason,
    },
    /// A channel finished, ledger included
    ChannelCompleted {
        /// Channel name
        channel: String,
        /// Ledger rows newly created
        records_inserted: usize,
        /// Posts already in the ledger
        duplicates: usize,
    },
    /// A channel task failed; siblings keep running
    ChannelFailed {
        /// Identifier as configured
        identifier: String,
        /// Machine-readable error code
        code: String,
        /// Error message
        error: String,
    },
    /// Every channel task has finished
    RunCompleted {
        /// Channels that completed
        succeeded: usize,
        /// Channels that failed
        failed: usize,
        /// Total wall-clock time in milliseconds
        elapsed_ms: u64,
    },
}
