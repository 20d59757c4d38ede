//! Filesystem media store
//!
//! Layout under the media root, per channel:
//!
//! ```text
//! <root>/<channel_name>/text/<post_id>.txt
//! <root>/<channel_name>/photo/<post_id>-item-<n>.jpg   (n is 1-based)
//! ```

use crate::error::{Error, Result};
use crate::types::{PostFiles, PostId};
use crate::utils::sanitize_dir_name;
use std::path::{Path, PathBuf};

const TEXT_DIR: &str = "text";
const PHOTO_DIR: &str = "photo";

/// Writes post text and photos under a media root
#[derive(Clone, Debug)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    /// Create a store rooted at `root`. Nothing is touched on disk until a write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Media root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding everything for one channel
    pub fn channel_dir(&self, channel_name: &str) -> PathBuf {
        self.root.join(sanitize_dir_name(channel_name))
    }

    /// Path of a post's text file
    pub fn text_path(&self, channel_name: &str, post_id: PostId) -> PathBuf {
        self.channel_dir(channel_name)
            .join(TEXT_DIR)
            .join(format!("{}.txt", post_id))
    }

    /// Path of a post's `index`-th photo (1-based)
    pub fn photo_path(&self, channel_name: &str, post_id: PostId, index: usize) -> PathBuf {
        self.channel_dir(channel_name)
            .join(PHOTO_DIR)
            .join(format!("{}-item-{}.jpg", post_id, index))
    }

    /// Create the channel's `text/` and `photo/` directories if absent.
    ///
    /// Safe to call concurrently and repeatedly.
    pub async fn ensure_channel_dirs(&self, channel_name: &str) -> Result<()> {
        let channel_dir = self.channel_dir(channel_name);
        for sub in [TEXT_DIR, PHOTO_DIR] {
            let dir = channel_dir.join(sub);
            tokio::fs::create_dir_all(&dir)
                .await
                .map_err(|e| Error::MediaWrite {
                    path: dir.clone(),
                    source: e,
                })?;
        }
        Ok(())
    }

    /// Write a post's text as UTF-8, replacing any previous content
    pub async fn write_text(
        &self,
        channel_name: &str,
        post_id: PostId,
        text: &str,
    ) -> Result<PathBuf> {
        let path = self.text_path(channel_name, post_id);
        write_file(&path, text.as_bytes()).await?;
        Ok(path)
    }

    /// Write the `index`-th photo of a post (1-based)
    pub async fn write_photo(
        &self,
        channel_name: &str,
        post_id: PostId,
        index: usize,
        bytes: &[u8],
    ) -> Result<PathBuf> {
        let path = self.photo_path(channel_name, post_id, index);
        write_file(&path, bytes).await?;
        Ok(path)
    }

    /// Paths of the files persisted for a post, as recorded in the ledger.
    ///
    /// Does not check that the files exist.
    pub fn post_files(
        &self,
        channel_name: &str,
        post_id: PostId,
        text_exists: bool,
        photo_count: u32,
    ) -> PostFiles {
        let text = text_exists.then(|| self.text_path(channel_name, post_id));
        let photos = (1..=photo_count as usize)
            .map(|n| self.photo_path(channel_name, post_id, n))
            .collect();
        PostFiles { text, photos }
    }
}

async fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    tokio::fs::write(path, bytes)
        .await
        .map_err(|e| Error::MediaWrite {
            path: path.to_path_buf(),
            source: e,
        })
}
