//! Ingestion-completeness tracking and whole-batch merge-ingestion.
//!
//! The tracker compares the source directory against the ledger's recorded
//! paths by exact canonical-path string match. Content is never hashed: two
//! identical files at different paths are distinct sources and both merge.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::config::MonitorConfig;
use crate::dataset::Dataset;
use crate::error::{MonitorError, Result};
use crate::services::ledger::{IngestionRecord, Ledger};

/// Result of one merge-ingestion pass over the full source directory.
#[derive(Debug)]
pub struct MergeOutcome {
    pub merged_path: PathBuf,
    pub per_file_rows: Vec<(PathBuf, i64)>,
    pub merged_rows: usize,
}

/// Check whether every source file already has an ingestion record; if not,
/// merge-ingest the whole directory and record every file processed.
///
/// Returns true iff previously-unrecorded files were found. An empty source
/// directory is vacuously complete and returns false without side effects.
pub fn check_and_ingest(cfg: &MonitorConfig, ledger: &Ledger) -> Result<bool> {
    let files = list_source_files(&cfg.ingestion.source_dir)?;
    let known = ledger.ingested_paths()?;

    let new_files: Vec<&PathBuf> = files
        .iter()
        .filter(|p| !known.contains(&p.to_string_lossy().to_string()))
        .collect();
    if new_files.is_empty() {
        tracing::info!(
            source_dir = %cfg.ingestion.source_dir.display(),
            files = files.len(),
            "all source files already recorded"
        );
        return Ok(false);
    }

    tracing::info!(
        new = new_files.len(),
        total = files.len(),
        "unrecorded source files found, running merge-ingestion"
    );

    // The merge is whole-batch: every directory file is re-read and merged,
    // and every file gets a fresh ledger record for this run.
    let outcome = merge_source_files(cfg)?;
    let observed_at = Utc::now();
    let mut records = Vec::with_capacity(outcome.per_file_rows.len());
    for (path, rows) in &outcome.per_file_rows {
        let record = IngestionRecord {
            source_path: path.to_string_lossy().to_string(),
            row_count: *rows,
            observed_at,
        };
        ledger.append_ingestion(&record)?;
        records.push(record);
    }
    write_snapshot(&cfg.ingestion_snapshot_path(), &records)?;
    Ok(true)
}

/// Merge every recognized source file into the single canonical dataset.
/// Exact-duplicate rows are dropped; the merged file is wholly rewritten and
/// owned by ingestion from this point on.
pub fn merge_source_files(cfg: &MonitorConfig) -> Result<MergeOutcome> {
    let files = list_source_files(&cfg.ingestion.source_dir)?;
    if files.is_empty() {
        return Err(MonitorError::SourceDataMissing(
            cfg.ingestion.source_dir.clone(),
        ));
    }

    let mut merged = Dataset::load_csv(&files[0])?;
    let mut per_file_rows = vec![(files[0].clone(), merged.len() as i64)];
    for path in &files[1..] {
        let ds = Dataset::load_csv(path)?;
        per_file_rows.push((path.clone(), ds.len() as i64));
        merged.append_rows(&ds, path)?;
    }
    merged.drop_duplicates();

    let merged_path = cfg.merged_dataset_path();
    merged.save_csv(&merged_path)?;
    tracing::info!(
        merged = %merged_path.display(),
        rows = merged.len(),
        sources = files.len(),
        "merged dataset written"
    );
    Ok(MergeOutcome {
        merged_path,
        per_file_rows,
        merged_rows: merged.len(),
    })
}

/// Enumerate `*.csv` files under the source directory as canonical absolute
/// paths, in stable (sorted) order.
fn list_source_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(MonitorError::SourceDataMissing(dir.to_path_buf()));
    }
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|e| e == "csv") {
            files.push(fs::canonicalize(&path)?);
        }
    }
    files.sort();
    Ok(files)
}

/// Write the ingestion lineage snapshot (`filepath,num_entries,timestamp`)
/// that deployment later copies next to the production artifact.
fn write_snapshot(path: &Path, records: &[IngestionRecord]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut f = fs::File::create(path)?;
    writeln!(f, "filepath,num_entries,timestamp")?;
    for r in records {
        writeln!(
            f,
            "{},{},{}",
            r.source_path,
            r.row_count,
            r.observed_at.to_rfc3339()
        )?;
    }
    Ok(())
}
