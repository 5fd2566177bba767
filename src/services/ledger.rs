//! Append-only monitoring ledger.
//!
//! Two fact tables, `ingestions` and `scores`, in one SQLite file. Rows are
//! immutable historical facts: there is no UPDATE or DELETE path anywhere in
//! this module. Each append is a single SQLite INSERT, atomic and durable
//! before the call returns, which is what lets independent ingestion and
//! scoring invocations share the store without application-level locking.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::Serialize;

use crate::error::{MonitorError, Result};

/// What a score value measures. Only F1 today; the column is a plain string
/// so new kinds extend without a schema migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScoreKind {
    F1,
}

impl ScoreKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreKind::F1 => "F1",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "F1" => Some(ScoreKind::F1),
            _ => None,
        }
    }
}

impl fmt::Display for ScoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One source file absorbed by a merge-ingestion run.
#[derive(Debug, Clone, Serialize)]
pub struct IngestionRecord {
    pub source_path: String,
    pub row_count: i64,
    pub observed_at: DateTime<Utc>,
}

/// One scoring invocation against a model version.
#[derive(Debug, Clone, Serialize)]
pub struct ScoreRecord {
    pub model_version: String,
    pub observed_at: DateTime<Utc>,
    pub score_kind: ScoreKind,
    pub value: f64,
}

const INGESTIONS_COLUMNS: [&str; 4] = ["id", "filepath", "num_entries", "timestamp"];
const SCORES_COLUMNS: [&str; 5] = ["id", "model_version", "timestamp", "score_kind", "value"];

/// Handle on the ledger. Lifecycle is owned by the caller: open it for a run,
/// drop it when the run ends.
pub struct Ledger {
    db: Connection,
}

impl Ledger {
    /// Open (or create) the ledger at `path`.
    ///
    /// First use against a non-existent file creates both tables with an
    /// auto-incrementing identity key. An existing file is never re-created;
    /// instead its tables are verified against the expected shape and any
    /// divergence is reported as `SchemaMismatch`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| MonitorError::StoreUnavailable(e.to_string()))?;
        }
        let db = Connection::open(path)
            .map_err(|e| MonitorError::StoreUnavailable(e.to_string()))?;
        // A writer holding the lock makes a concurrent append wait instead
        // of surfacing SQLITE_BUSY immediately.
        db.busy_timeout(std::time::Duration::from_secs(5))?;

        // WAL keeps concurrent appenders from blocking readers.
        db.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;

            CREATE TABLE IF NOT EXISTS ingestions (
              id          INTEGER PRIMARY KEY AUTOINCREMENT,
              filepath    TEXT NOT NULL,
              num_entries INTEGER NOT NULL,
              timestamp   TEXT NOT NULL      -- RFC3339 UTC
            );

            CREATE TABLE IF NOT EXISTS scores (
              id            INTEGER PRIMARY KEY AUTOINCREMENT,
              model_version TEXT NOT NULL,
              timestamp     TEXT NOT NULL,   -- RFC3339 UTC
              score_kind    TEXT NOT NULL DEFAULT 'F1',
              value         REAL NOT NULL
            );
            "#,
        )?;

        let ledger = Self { db };
        ledger.verify_table("ingestions", &INGESTIONS_COLUMNS)?;
        ledger.verify_table("scores", &SCORES_COLUMNS)?;
        Ok(ledger)
    }

    fn verify_table(&self, table: &str, expected: &[&str]) -> Result<()> {
        let mut stmt = self
            .db
            .prepare(&format!("PRAGMA table_info({table})"))?;
        let actual: Vec<String> = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<std::result::Result<_, _>>()?;
        if actual != expected {
            return Err(MonitorError::SchemaMismatch {
                table: table.to_string(),
                detail: format!(
                    "expected columns [{}], found [{}]",
                    expected.join(","),
                    actual.join(",")
                ),
            });
        }
        Ok(())
    }

    /// Append one ingestion fact; returns the row id.
    pub fn append_ingestion(&self, record: &IngestionRecord) -> Result<i64> {
        self.db.execute(
            "INSERT INTO ingestions (filepath, num_entries, timestamp) VALUES (?1, ?2, ?3)",
            rusqlite::params![
                record.source_path,
                record.row_count,
                record.observed_at.to_rfc3339()
            ],
        )?;
        Ok(self.db.last_insert_rowid())
    }

    /// Append one score fact; returns the row id.
    pub fn append_score(&self, record: &ScoreRecord) -> Result<i64> {
        self.db.execute(
            "INSERT INTO scores (model_version, timestamp, score_kind, value) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![
                record.model_version,
                record.observed_at.to_rfc3339(),
                record.score_kind.as_str(),
                record.value
            ],
        )?;
        Ok(self.db.last_insert_rowid())
    }

    /// All ingestion facts in insertion order.
    pub fn list_ingestions(&self) -> Result<Vec<IngestionRecord>> {
        let mut stmt = self
            .db
            .prepare("SELECT filepath, num_entries, timestamp FROM ingestions ORDER BY id ASC")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;
        let mut out = Vec::new();
        for row in rows {
            let (source_path, row_count, ts) = row?;
            out.push(IngestionRecord {
                source_path,
                row_count,
                observed_at: parse_timestamp(&ts)?,
            });
        }
        Ok(out)
    }

    /// All score facts in insertion order.
    pub fn list_scores(&self) -> Result<Vec<ScoreRecord>> {
        let mut stmt = self.db.prepare(
            "SELECT model_version, timestamp, score_kind, value FROM scores ORDER BY id ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, f64>(3)?,
            ))
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(score_from_row(row?)?);
        }
        Ok(out)
    }

    /// Most recent score for a model version: maximal timestamp, insertion
    /// order breaking ties.
    pub fn latest_score(&self, model_version: &str) -> Result<Option<ScoreRecord>> {
        let mut stmt = self.db.prepare(
            "SELECT model_version, timestamp, score_kind, value FROM scores
             WHERE model_version = ?1 ORDER BY timestamp DESC, id DESC LIMIT 1",
        )?;
        let mut rows = stmt.query([model_version])?;
        if let Some(row) = rows.next()? {
            let tuple = (
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, f64>(3)?,
            );
            Ok(Some(score_from_row(tuple)?))
        } else {
            Ok(None)
        }
    }

    /// Distinct source paths that already have an ingestion record.
    pub fn ingested_paths(&self) -> Result<HashSet<String>> {
        let mut stmt = self
            .db
            .prepare("SELECT DISTINCT filepath FROM ingestions")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut out = HashSet::new();
        for row in rows {
            out.insert(row?);
        }
        Ok(out)
    }
}

fn score_from_row(row: (String, String, String, f64)) -> Result<ScoreRecord> {
    let (model_version, ts, kind, value) = row;
    let score_kind = ScoreKind::parse(&kind).ok_or_else(|| MonitorError::SchemaMismatch {
        table: "scores".to_string(),
        detail: format!("unknown score_kind '{kind}'"),
    })?;
    Ok(ScoreRecord {
        model_version,
        observed_at: parse_timestamp(&ts)?,
        score_kind,
        value,
    })
}

fn parse_timestamp(ts: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(ts)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| MonitorError::SchemaMismatch {
            table: "ledger".to_string(),
            detail: format!("bad timestamp '{ts}': {e}"),
        })
}
