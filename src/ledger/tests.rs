use crate::ledger::*;
use crate::types::{InsertOutcome, LedgerRecord, PostId, UnusedPost};
use tempfile::TempDir;

fn temp_ledger() -> (Ledger, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let ledger = Ledger::new(temp_dir.path().join("info.db"));
    (ledger, temp_dir)
}

#[tokio::test]
async fn test_fetch_unused_without_table_is_empty() {
    let (ledger, _temp_dir) = temp_ledger();

    let unused = ledger.fetch_unused("never-ingested").await.unwrap();
    assert!(unused.is_empty());

    // Looking does not create the table
    assert!(ledger.channel_tables().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_upsert_is_first_write_wins() {
    let (ledger, _temp_dir) = temp_ledger();

    let first = ledger.upsert("demo", PostId(1), true, 3).await.unwrap();
    assert_eq!(first, InsertOutcome::Inserted);

    // Same post with different values: no overwrite, no error
    let second = ledger.upsert("demo", PostId(1), false, 0).await.unwrap();
    assert_eq!(second, InsertOutcome::AlreadyRecorded);

    let record = ledger.get("demo", PostId(1)).await.unwrap().unwrap();
    assert_eq!(record, LedgerRecord::new(PostId(1), true, 3));
}

#[tokio::test]
async fn test_record_batch_reports_outcomes_in_order() {
    let (ledger, _temp_dir) = temp_ledger();
    ledger.upsert("demo", PostId(2), false, 2).await.unwrap();

    let outcomes = ledger
        .record_batch(
            "demo",
            &[
                LedgerRecord::new(PostId(1), true, 0),
                LedgerRecord::new(PostId(2), false, 2),
                LedgerRecord::new(PostId(3), true, 1),
            ],
        )
        .await
        .unwrap();

    assert_eq!(
        outcomes,
        vec![
            InsertOutcome::Inserted,
            InsertOutcome::AlreadyRecorded,
            InsertOutcome::Inserted,
        ]
    );
    assert_eq!(ledger.fetch_unused("demo").await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_record_batch_ignores_input_used_flag() {
    let (ledger, _temp_dir) = temp_ledger();

    let mut record = LedgerRecord::new(PostId(9), true, 0);
    record.used = true;
    ledger.record_batch("demo", &[record]).await.unwrap();

    let stored = ledger.get("demo", PostId(9)).await.unwrap().unwrap();
    assert!(!stored.used);
}

#[tokio::test]
async fn test_demo_scenario_fetch_and_mark_used() {
    let (ledger, _temp_dir) = temp_ledger();
    ledger
        .record_batch(
            "demo",
            &[
                LedgerRecord::new(PostId(1), true, 0),
                LedgerRecord::new(PostId(2), false, 2),
            ],
        )
        .await
        .unwrap();

    let unused = ledger.fetch_unused("demo").await.unwrap();
    assert_eq!(unused.len(), 2);
    assert_eq!(
        unused[&PostId(1)],
        UnusedPost {
            text_exists: true,
            count_photo: 0
        }
    );
    assert_eq!(
        unused[&PostId(2)],
        UnusedPost {
            text_exists: false,
            count_photo: 2
        }
    );

    let updated = ledger.mark_used("demo", &[PostId(1)]).await.unwrap();
    assert_eq!(updated, 1);

    let unused = ledger.fetch_unused("demo").await.unwrap();
    assert_eq!(unused.keys().copied().collect::<Vec<_>>(), vec![PostId(2)]);
}

#[tokio::test]
async fn test_mark_used_ignores_unknown_ids() {
    let (ledger, _temp_dir) = temp_ledger();
    ledger.upsert("demo", PostId(1), true, 0).await.unwrap();

    let updated = ledger
        .mark_used("demo", &[PostId(404), PostId(405)])
        .await
        .unwrap();
    assert_eq!(updated, 0);

    // No new rows were created
    assert!(ledger.get("demo", PostId(404)).await.unwrap().is_none());
    assert_eq!(ledger.fetch_unused("demo").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_mark_used_on_missing_table_is_noop() {
    let (ledger, _temp_dir) = temp_ledger();

    let updated = ledger.mark_used("ghost", &[PostId(1)]).await.unwrap();
    assert_eq!(updated, 0);
    assert!(ledger.channel_tables().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_used_is_never_reverted_by_reingestion() {
    let (ledger, _temp_dir) = temp_ledger();
    ledger.upsert("demo", PostId(1), true, 1).await.unwrap();
    ledger.mark_used("demo", &[PostId(1)]).await.unwrap();

    let outcome = ledger.upsert("demo", PostId(1), true, 1).await.unwrap();
    assert_eq!(outcome, InsertOutcome::AlreadyRecorded);

    assert!(ledger.get("demo", PostId(1)).await.unwrap().unwrap().used);
    assert!(ledger.fetch_unused("demo").await.unwrap().is_empty());

    // Marking again does not count as an update
    assert_eq!(ledger.mark_used("demo", &[PostId(1)]).await.unwrap(), 0);
}

#[tokio::test]
async fn test_channels_are_isolated_tables() {
    let (ledger, _temp_dir) = temp_ledger();
    ledger.upsert("alpha", PostId(1), true, 0).await.unwrap();
    ledger.upsert("beta", PostId(1), false, 4).await.unwrap();

    ledger.mark_used("alpha", &[PostId(1)]).await.unwrap();

    assert!(ledger.fetch_unused("alpha").await.unwrap().is_empty());
    assert_eq!(ledger.fetch_unused("beta").await.unwrap().len(), 1);
    assert_eq!(
        ledger.channel_tables().await.unwrap(),
        vec!["alpha".to_string(), "beta".to_string()]
    );
}

#[tokio::test]
async fn test_awkward_channel_names_are_quoted() {
    let (ledger, _temp_dir) = temp_ledger();
    let names = ["Новости дня", "quote\"d", "semi; DROP TABLE x; --", "it's"];

    for name in names {
        ledger.upsert(name, PostId(10), true, 1).await.unwrap();
        let unused = ledger.fetch_unused(name).await.unwrap();
        assert_eq!(unused.len(), 1, "channel {name:?}");
    }

    assert_eq!(ledger.channel_tables().await.unwrap().len(), names.len());
}

#[tokio::test]
async fn test_table_schema_matches_layout() {
    use sqlx::Connection;

    let (ledger, _temp_dir) = temp_ledger();
    ledger.upsert("demo", PostId(1), true, 0).await.unwrap();

    let mut conn = sqlx::SqliteConnection::connect_with(
        &sqlx::sqlite::SqliteConnectOptions::new().filename(ledger.path()),
    )
    .await
    .unwrap();
    let columns: Vec<(String, String)> =
        sqlx::query_as("SELECT name, type FROM pragma_table_info('demo') ORDER BY cid")
            .fetch_all(&mut conn)
            .await
            .unwrap();
    conn.close().await.unwrap();

    assert_eq!(
        columns,
        vec![
            ("post_id".to_string(), "INTEGER".to_string()),
            ("text_exists".to_string(), "INTEGER".to_string()),
            ("count_photo".to_string(), "INTEGER".to_string()),
            ("used_post".to_string(), "INTEGER".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_ledger_creates_parent_directory() {
    let temp_dir = TempDir::new().unwrap();
    let ledger = Ledger::new(temp_dir.path().join("nested/deeper/info.db"));

    ledger.upsert("demo", PostId(1), false, 0).await.unwrap();
    assert!(temp_dir.path().join("nested/deeper/info.db").exists());
}

#[tokio::test]
async fn test_unopenable_ledger_is_storage_error() {
    let temp_dir = TempDir::new().unwrap();
    // A directory where the database file should be
    let blocked = temp_dir.path().join("info.db");
    std::fs::create_dir(&blocked).unwrap();

    let ledger = Ledger::new(&blocked);
    let err = ledger.upsert("demo", PostId(1), true, 0).await.unwrap_err();
    assert!(err.is_storage(), "unexpected error: {err}");
}

#[tokio::test]
async fn test_concurrent_channel_batches() {
    let (ledger, _temp_dir) = temp_ledger();
    ledger.upsert("setup", PostId(1), false, 0).await.unwrap();

    let batches = (0..4).map(|c| {
        let ledger = ledger.clone();
        async move {
            let channel = format!("channel-{c}");
            let records: Vec<_> = (1..=5)
                .map(|p| LedgerRecord::new(PostId(p), p % 2 == 0, p as u32))
                .collect();
            ledger.record_batch(&channel, &records).await
        }
    });

    for result in futures::future::join_all(batches).await {
        assert_eq!(result.unwrap().len(), 5);
    }
    assert_eq!(ledger.channel_tables().await.unwrap().len(), 5);
}

#[tokio::test]
async fn test_recorded_ids_reports_only_existing_rows() {
    let (ledger, _temp_dir) = temp_ledger();

    // No table yet
    let none = ledger
        .recorded_ids("demo", &[PostId(1), PostId(2)])
        .await
        .unwrap();
    assert!(none.is_empty());

    ledger.upsert("demo", PostId(2), false, 2).await.unwrap();
    ledger.upsert("demo", PostId(5), true, 0).await.unwrap();

    let recorded = ledger
        .recorded_ids("demo", &[PostId(1), PostId(2), PostId(5)])
        .await
        .unwrap();
    assert_eq!(recorded.into_iter().collect::<Vec<_>>(), vec![PostId(2), PostId(5)]);
    assert!(ledger.recorded_ids("demo", &[]).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_table_lookup_ignores_ascii_case() {
    let (ledger, _temp_dir) = temp_ledger();
    ledger.upsert("Demo", PostId(1), true, 0).await.unwrap();

    // SQLite table names are case-insensitive; lookups agree with it
    let unused = ledger.fetch_unused("demo").await.unwrap();
    assert_eq!(unused.keys().copied().collect::<Vec<_>>(), vec![PostId(1)]);
    assert_eq!(ledger.mark_used("DEMO", &[PostId(1)]).await.unwrap(), 1);
    assert!(ledger.get("demo", PostId(1)).await.unwrap().unwrap().used);
    assert_eq!(ledger.channel_tables().await.unwrap(), vec!["Demo".to_string()]);
}

#[tokio::test]
async fn test_channel_tables_lists_names_starting_like_sqlite() {
    let (ledger, _temp_dir) = temp_ledger();
    ledger.upsert("sqliteFans", PostId(1), true, 0).await.unwrap();
    ledger.upsert("demo", PostId(1), true, 0).await.unwrap();

    assert_eq!(
        ledger.channel_tables().await.unwrap(),
        vec!["demo".to_string(), "sqliteFans".to_string()]
    );
}
