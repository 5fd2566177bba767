// Integration tests for the append-only monitoring ledger.

use chrono::{Duration, Utc};
use rusqlite::Connection;

use driftwatch::services::ledger::{IngestionRecord, Ledger, ScoreKind, ScoreRecord};
use driftwatch::MonitorError;

fn ingestion(path: &str, rows: i64) -> IngestionRecord {
    IngestionRecord {
        source_path: path.to_string(),
        row_count: rows,
        observed_at: Utc::now(),
    }
}

#[test]
fn open_creates_both_tables_and_reopen_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("db").join("monitoring.sqlite");

    {
        let ledger = Ledger::open(&db_path).expect("first open");
        ledger.append_ingestion(&ingestion("/data/a.csv", 10)).unwrap();
    }
    // Second open must not re-create or clobber anything.
    let ledger = Ledger::open(&db_path).expect("reopen");
    let records = ledger.list_ingestions().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].source_path, "/data/a.csv");
    assert_eq!(records[0].row_count, 10);
}

#[test]
fn appends_preserve_insertion_order() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = Ledger::open(&dir.path().join("m.sqlite")).unwrap();

    for i in 0..5 {
        ledger
            .append_ingestion(&ingestion(&format!("/data/{i}.csv"), i))
            .unwrap();
    }
    let paths: Vec<String> = ledger
        .list_ingestions()
        .unwrap()
        .into_iter()
        .map(|r| r.source_path)
        .collect();
    assert_eq!(
        paths,
        (0..5).map(|i| format!("/data/{i}.csv")).collect::<Vec<_>>()
    );
}

#[test]
fn latest_score_picks_maximal_timestamp_per_version() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = Ledger::open(&dir.path().join("m.sqlite")).unwrap();

    let base = Utc::now();
    for (offset, value) in [(0, 0.70), (60, 0.85), (30, 0.80)] {
        ledger
            .append_score(&ScoreRecord {
                model_version: "0.1".to_string(),
                observed_at: base + Duration::seconds(offset),
                score_kind: ScoreKind::F1,
                value,
            })
            .unwrap();
    }
    // Different version must not shadow 0.1.
    ledger
        .append_score(&ScoreRecord {
            model_version: "0.2".to_string(),
            observed_at: base + Duration::seconds(120),
            score_kind: ScoreKind::F1,
            value: 0.99,
        })
        .unwrap();

    let latest = ledger.latest_score("0.1").unwrap().expect("some score");
    assert_eq!(latest.value, 0.85);
    assert!(ledger.latest_score("9.9").unwrap().is_none());
}

#[test]
fn ingested_paths_are_distinct() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = Ledger::open(&dir.path().join("m.sqlite")).unwrap();

    ledger.append_ingestion(&ingestion("/data/a.csv", 1)).unwrap();
    ledger.append_ingestion(&ingestion("/data/a.csv", 1)).unwrap();
    ledger.append_ingestion(&ingestion("/data/b.csv", 2)).unwrap();

    let paths = ledger.ingested_paths().unwrap();
    assert_eq!(paths.len(), 2);
    assert!(paths.contains("/data/a.csv"));
    assert!(paths.contains("/data/b.csv"));
}

#[test]
fn mismatched_existing_schema_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("m.sqlite");

    // Pre-create a store whose ingestions table has the wrong shape.
    let conn = Connection::open(&db_path).unwrap();
    conn.execute_batch("CREATE TABLE ingestions (id INTEGER PRIMARY KEY, wrong TEXT);")
        .unwrap();
    drop(conn);

    match Ledger::open(&db_path) {
        Err(MonitorError::SchemaMismatch { table, .. }) => assert_eq!(table, "ingestions"),
        Err(other) => panic!("expected SchemaMismatch, got {other:?}"),
        Ok(_) => panic!("open accepted a mismatched schema"),
    }
}

#[test]
fn append_waits_out_a_competing_writer_instead_of_failing() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("m.sqlite");
    let ledger = Ledger::open(&db_path).unwrap();

    // Hold the write lock from a raw second connection for a moment.
    let blocker = Connection::open(&db_path).unwrap();
    blocker.execute_batch("BEGIN IMMEDIATE;").unwrap();

    let handle = std::thread::spawn(move || {
        ledger
            .append_ingestion(&ingestion("/data/a.csv", 1))
            .map(|_| ledger)
    });
    std::thread::sleep(std::time::Duration::from_millis(200));
    blocker.execute_batch("COMMIT;").unwrap();

    // The append blocked on the busy timeout rather than erroring out.
    let ledger = handle.join().unwrap().unwrap();
    assert_eq!(ledger.list_ingestions().unwrap().len(), 1);
}

#[test]
fn appends_from_independent_handles_are_all_visible() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("m.sqlite");

    let a = Ledger::open(&db_path).unwrap();
    let b = Ledger::open(&db_path).unwrap();
    a.append_ingestion(&ingestion("/data/a.csv", 1)).unwrap();
    b.append_ingestion(&ingestion("/data/b.csv", 2)).unwrap();
    a.append_ingestion(&ingestion("/data/c.csv", 3)).unwrap();

    assert_eq!(a.list_ingestions().unwrap().len(), 3);
    assert_eq!(b.list_ingestions().unwrap().len(), 3);
}
