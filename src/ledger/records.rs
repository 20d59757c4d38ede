//! Ledger record operations: insert-if-absent, fetch-unused, mark-used, lookup.

use crate::error::DatabaseError;
use crate::types::{InsertOutcome, LedgerRecord, PostId, UnusedPost};
use crate::utils::quote_identifier;
use crate::{Error, Result};
use sqlx::SqliteConnection;
use std::collections::{BTreeMap, BTreeSet};

use super::Ledger;

impl Ledger {
    /// Record a single post as ingested and unused.
    ///
    /// First write wins: if the post is already recorded the existing row is
    /// left as it is (including its `used` flag) and
    /// [`InsertOutcome::AlreadyRecorded`] is returned.
    pub async fn upsert(
        &self,
        channel: &str,
        post_id: PostId,
        text_exists: bool,
        count_photo: u32,
    ) -> Result<InsertOutcome> {
        let record = LedgerRecord::new(post_id, text_exists, count_photo);
        let mut outcomes = self.record_batch(channel, &[record]).await?;
        outcomes
            .pop()
            .ok_or_else(|| Error::Other("ledger batch returned no outcome".to_string()))
    }

    /// Record every post of one channel in a single transaction.
    ///
    /// Creates the channel table if needed. Outcomes are returned in input
    /// order. The `used` flag of the input records is ignored; new rows always
    /// start unused.
    pub async fn record_batch(
        &self,
        channel: &str,
        records: &[LedgerRecord],
    ) -> Result<Vec<InsertOutcome>> {
        let mut conn = self.connect().await?;
        let result = Self::record_batch_on(&mut conn, channel, records).await;
        Self::disconnect(conn).await;

        let outcomes = result?;
        let duplicates = outcomes
            .iter()
            .filter(|o| **o == InsertOutcome::AlreadyRecorded)
            .count();
        tracing::debug!(
            channel = %channel,
            inserted = outcomes.len() - duplicates,
            duplicates,
            "Ledger batch committed"
        );

        Ok(outcomes)
    }

    async fn record_batch_on(
        conn: &mut SqliteConnection,
        channel: &str,
        records: &[LedgerRecord],
    ) -> Result<Vec<InsertOutcome>> {
        Self::begin_write(conn, channel).await?;
        let result = Self::insert_records(conn, channel, records).await;
        Self::finish_write(conn, channel, result).await
    }

    async fn insert_records(
        conn: &mut SqliteConnection,
        channel: &str,
        records: &[LedgerRecord],
    ) -> Result<Vec<InsertOutcome>> {
        Self::ensure_table(conn, channel).await?;

        let sql = format!(
            r#"
            INSERT INTO {} (post_id, text_exists, count_photo, used_post)
            VALUES (?, ?, ?, 0)
            ON CONFLICT(post_id) DO NOTHING
            "#,
            quote_identifier(channel)
        );

        let mut outcomes = Vec::with_capacity(records.len());
        for record in records {
            let result = sqlx::query(&sql)
                .bind(record.post_id)
                .bind(i64::from(record.text_exists))
                .bind(i64::from(record.photo_count))
                .execute(&mut *conn)
                .await
                .map_err(|e| {
                    Error::Database(DatabaseError::QueryFailed(format!(
                        "Failed to record post {} for channel '{}': {}",
                        record.post_id, channel, e
                    )))
                })?;

            if result.rows_affected() > 0 {
                outcomes.push(InsertOutcome::Inserted);
            } else {
                tracing::warn!(
                    channel = %channel,
                    post_id = record.post_id.get(),
                    "Post already recorded in ledger, keeping existing row"
                );
                outcomes.push(InsertOutcome::AlreadyRecorded);
            }
        }

        Ok(outcomes)
    }

    /// All unused posts of a channel, keyed by post ID.
    ///
    /// A channel with no table yet has nothing ingested and yields an empty map.
    pub async fn fetch_unused(&self, channel: &str) -> Result<BTreeMap<PostId, UnusedPost>> {
        let mut conn = self.connect().await?;
        let result = Self::fetch_unused_on(&mut conn, channel).await;
        Self::disconnect(conn).await;

        let unused = result?;
        tracing::info!(
            channel = %channel,
            count = unused.len(),
            "Fetched unused posts"
        );
        Ok(unused)
    }

    async fn fetch_unused_on(
        conn: &mut SqliteConnection,
        channel: &str,
    ) -> Result<BTreeMap<PostId, UnusedPost>> {
        if !Self::table_exists(conn, channel).await? {
            tracing::warn!(channel = %channel, "No ledger table for channel");
            return Ok(BTreeMap::new());
        }

        let sql = format!(
            "SELECT post_id, text_exists, count_photo FROM {} WHERE used_post = 0 ORDER BY post_id",
            quote_identifier(channel)
        );
        let rows: Vec<(PostId, Option<i64>, Option<i64>)> = sqlx::query_as(&sql)
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to fetch unused posts for channel '{}': {}",
                    channel, e
                )))
            })?;

        Ok(rows
            .into_iter()
            .map(|(post_id, text_exists, count_photo)| {
                (
                    post_id,
                    UnusedPost {
                        text_exists: text_exists.unwrap_or(0) != 0,
                        count_photo: count_photo
                            .and_then(|c| u32::try_from(c).ok())
                            .unwrap_or(0),
                    },
                )
            })
            .collect())
    }

    /// Mark posts as used in one transaction.
    ///
    /// IDs not present in the channel's table are ignored, as is a channel with
    /// no table at all. Returns how many rows flipped from unused to used.
    pub async fn mark_used(&self, channel: &str, post_ids: &[PostId]) -> Result<u64> {
        let mut conn = self.connect().await?;
        let result = Self::mark_used_on(&mut conn, channel, post_ids).await;
        Self::disconnect(conn).await;

        let updated = result?;
        tracing::info!(
            channel = %channel,
            requested = post_ids.len(),
            updated,
            "Marked posts as used"
        );
        Ok(updated)
    }

    async fn mark_used_on(
        conn: &mut SqliteConnection,
        channel: &str,
        post_ids: &[PostId],
    ) -> Result<u64> {
        if post_ids.is_empty() || !Self::table_exists(conn, channel).await? {
            return Ok(0);
        }

        Self::begin_write(conn, channel).await?;
        let result = Self::update_used(conn, channel, post_ids).await;
        Self::finish_write(conn, channel, result).await
    }

    async fn update_used(
        conn: &mut SqliteConnection,
        channel: &str,
        post_ids: &[PostId],
    ) -> Result<u64> {
        let sql = format!(
            "UPDATE {} SET used_post = 1 WHERE post_id = ? AND used_post = 0",
            quote_identifier(channel)
        );

        let mut updated = 0;
        for post_id in post_ids {
            let result = sqlx::query(&sql)
                .bind(post_id)
                .execute(&mut *conn)
                .await
                .map_err(|e| {
                    Error::Database(DatabaseError::QueryFailed(format!(
                        "Failed to mark post {} used for channel '{}': {}",
                        post_id, channel, e
                    )))
                })?;
            updated += result.rows_affected();
        }

        Ok(updated)
    }

    /// Which of `post_ids` already have a row in the channel's table.
    ///
    /// A channel with no table yet has nothing recorded.
    pub async fn recorded_ids(
        &self,
        channel: &str,
        post_ids: &[PostId],
    ) -> Result<BTreeSet<PostId>> {
        if post_ids.is_empty() {
            return Ok(BTreeSet::new());
        }

        let mut conn = self.connect().await?;
        let result = Self::recorded_ids_on(&mut conn, channel, post_ids).await;
        Self::disconnect(conn).await;
        result
    }

    async fn recorded_ids_on(
        conn: &mut SqliteConnection,
        channel: &str,
        post_ids: &[PostId],
    ) -> Result<BTreeSet<PostId>> {
        if !Self::table_exists(conn, channel).await? {
            return Ok(BTreeSet::new());
        }

        let sql = format!(
            "SELECT post_id FROM {} WHERE post_id = ?",
            quote_identifier(channel)
        );

        let mut recorded = BTreeSet::new();
        for post_id in post_ids {
            let found: Option<PostId> = sqlx::query_scalar(&sql)
                .bind(post_id)
                .fetch_optional(&mut *conn)
                .await
                .map_err(|e| {
                    Error::Database(DatabaseError::QueryFailed(format!(
                        "Failed to look up post {} for channel '{}': {}",
                        post_id, channel, e
                    )))
                })?;
            recorded.extend(found);
        }

        Ok(recorded)
    }

    /// Full record for one post, if recorded
    pub async fn get(&self, channel: &str, post_id: PostId) -> Result<Option<LedgerRecord>> {
        let mut conn = self.connect().await?;
        let result = Self::get_on(&mut conn, channel, post_id).await;
        Self::disconnect(conn).await;
        result
    }

    async fn get_on(
        conn: &mut SqliteConnection,
        channel: &str,
        post_id: PostId,
    ) -> Result<Option<LedgerRecord>> {
        if !Self::table_exists(conn, channel).await? {
            return Ok(None);
        }

        let sql = format!(
            "SELECT post_id, text_exists, count_photo, used_post FROM {} WHERE post_id = ?",
            quote_identifier(channel)
        );
        let row: Option<(PostId, Option<i64>, Option<i64>, Option<i64>)> = sqlx::query_as(&sql)
            .bind(post_id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to get post {} for channel '{}': {}",
                    post_id, channel, e
                )))
            })?;

        Ok(row.map(|(post_id, text_exists, count_photo, used)| LedgerRecord {
            post_id,
            text_exists: text_exists.unwrap_or(0) != 0,
            photo_count: count_photo.and_then(|c| u32::try_from(c).ok()).unwrap_or(0),
            used: used.unwrap_or(0) != 0,
        }))
    }
}
