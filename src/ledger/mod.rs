//! Post ledger: durable per-channel used/unused records
//!
//! One SQLite file holds every channel; each channel gets its own table named
//! after the channel, created on first write:
//!
//! ```sql
//! post_id INTEGER PRIMARY KEY, text_exists INTEGER, count_photo INTEGER, used_post INTEGER
//! ```
//!
//! A connection is opened per operation (or per write batch) and closed when
//! it finishes, so no lock is held across a run.
//!
//! ## Submodules
//!
//! Methods on [`Ledger`] are organized by concern:
//! - `connection`: opening connections, table lifecycle
//! - `records`: insert-if-absent, fetch-unused, mark-used, lookup

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode};
use std::path::{Path, PathBuf};
use std::time::Duration;

mod connection;
mod records;

/// How long a connection waits on a locked database before giving up
const BUSY_TIMEOUT: Duration = Duration::from_secs(30);

/// Handle to the ledger database file
#[derive(Clone, Debug)]
pub struct Ledger {
    path: PathBuf,
    options: SqliteConnectOptions,
}

impl Ledger {
    /// Ledger backed by the SQLite file at `path`.
    ///
    /// Nothing is opened here; the file and its parent directory are created on
    /// the first operation.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let options = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true)
            // Rollback journal: the ledger stays a single file between runs
            .journal_mode(SqliteJournalMode::Delete)
            .busy_timeout(BUSY_TIMEOUT);
        Self { path, options }
    }

    /// Database file path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
