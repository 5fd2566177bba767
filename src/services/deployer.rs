//! Redeployment: copy-over promotion of the staged model artifact and its
//! lineage snapshots into the single production location.
//!
//! The replacement is a plain file copy, not a swap-and-verify: if an
//! individual copy fails, the deployed set may be left partially updated.
//! That is an accepted, documented risk of this design; versioning history
//! lives only in the ledger.

use std::fs;
use std::path::PathBuf;

use crate::config::MonitorConfig;
use crate::error::{MonitorError, Result};

/// Promote the staged artifact set into the production directory. Returns
/// the paths written. The staged model must exist; lineage snapshots that
/// have not been produced yet (first deployment) are skipped with a warning.
pub fn promote(cfg: &MonitorConfig) -> Result<Vec<PathBuf>> {
    let staged_model = cfg.staged_model_path();
    if !staged_model.exists() {
        return Err(MonitorError::SourceDataMissing(staged_model));
    }
    fs::create_dir_all(&cfg.model.deploy_dir)?;

    let mut written = Vec::new();

    let deployed_model = cfg.deployed_model_path();
    fs::copy(&staged_model, &deployed_model)?;
    written.push(deployed_model);

    for snapshot in [cfg.ingestion_snapshot_path(), cfg.score_snapshot_path()] {
        let file_name = snapshot
            .file_name()
            .ok_or_else(|| MonitorError::SourceDataMissing(snapshot.clone()))?;
        let target = cfg.model.deploy_dir.join(file_name);
        if snapshot.exists() {
            fs::copy(&snapshot, &target)?;
            written.push(target);
        } else {
            tracing::warn!(
                snapshot = %snapshot.display(),
                "lineage snapshot not present yet, skipping copy"
            );
        }
    }

    tracing::info!(
        deploy_dir = %cfg.model.deploy_dir.display(),
        files = written.len(),
        "deployment copy-over complete"
    );
    Ok(written)
}
