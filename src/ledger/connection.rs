//! Connection and table lifecycle.

use crate::error::DatabaseError;
use crate::utils::quote_identifier;
use crate::{Error, Result};
use sqlx::{Connection, SqliteConnection};

use super::Ledger;

impl Ledger {
    /// Open a fresh connection, creating the database directory if needed
    pub(super) async fn connect(&self) -> Result<SqliteConnection> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                Error::Database(DatabaseError::ConnectionFailed(format!(
                    "Failed to create database directory {}: {}",
                    parent.display(),
                    e
                )))
            })?;
        }

        SqliteConnection::connect_with(&self.options)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::ConnectionFailed(format!(
                    "Failed to open ledger {}: {}",
                    self.path.display(),
                    e
                )))
            })
    }

    /// Close a connection, logging rather than failing if the close itself errors
    pub(super) async fn disconnect(conn: SqliteConnection) {
        if let Err(e) = conn.close().await {
            tracing::debug!(error = %e, "Ledger connection did not close cleanly");
        }
    }

    /// Start a write transaction.
    ///
    /// `BEGIN IMMEDIATE` takes the write lock up front, waiting up to the busy
    /// timeout while another channel's batch holds it.
    pub(super) async fn begin_write(conn: &mut SqliteConnection, channel: &str) -> Result<()> {
        sqlx::query("BEGIN IMMEDIATE")
            .execute(&mut *conn)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::TransactionFailed(format!(
                    "Failed to begin transaction for channel '{}': {}",
                    channel, e
                )))
            })?;
        Ok(())
    }

    /// Commit if the work succeeded, roll back otherwise
    pub(super) async fn finish_write<T>(
        conn: &mut SqliteConnection,
        channel: &str,
        result: Result<T>,
    ) -> Result<T> {
        match result {
            Ok(value) => {
                sqlx::query("COMMIT")
                    .execute(&mut *conn)
                    .await
                    .map_err(|e| {
                        Error::Database(DatabaseError::TransactionFailed(format!(
                            "Failed to commit transaction for channel '{}': {}",
                            channel, e
                        )))
                    })?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback_err) = sqlx::query("ROLLBACK").execute(&mut *conn).await {
                    tracing::error!(
                        channel = %channel,
                        error = %rollback_err,
                        "Failed to roll back ledger transaction"
                    );
                }
                Err(e)
            }
        }
    }

    /// Create the channel's table if it does not exist
    pub(super) async fn ensure_table(conn: &mut SqliteConnection, channel: &str) -> Result<()> {
        let sql = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                post_id INTEGER PRIMARY KEY,
                text_exists INTEGER,
                count_photo INTEGER,
                used_post INTEGER
            )
            "#,
            quote_identifier(channel)
        );

        sqlx::query(&sql).execute(&mut *conn).await.map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to create table for channel '{}': {}",
                channel, e
            )))
        })?;

        Ok(())
    }

    /// Whether the channel has a table yet
    ///
    /// SQLite resolves table names case-insensitively (ASCII), so the lookup
    /// does too: "Demo" and "demo" name the same table.
    pub(super) async fn table_exists(conn: &mut SqliteConnection, channel: &str) -> Result<bool> {
        let name: Option<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ? COLLATE NOCASE",
        )
        .bind(channel)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to look up table for channel '{}': {}",
                channel, e
            )))
        })?;

        Ok(name.is_some())
    }

    /// Names of all channel tables, sorted
    pub async fn channel_tables(&self) -> Result<Vec<String>> {
        let mut conn = self.connect().await?;
        let names = sqlx::query_scalar(
            r#"
            SELECT name FROM sqlite_master
            WHERE type = 'table' AND name NOT LIKE 'sqlite\_%' ESCAPE '\'
            ORDER BY name
            "#,
        )
        .fetch_all(&mut conn)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to list channel tables: {}",
                e
            )))
        });
        Self::disconnect(conn).await;

        names
    }
}
