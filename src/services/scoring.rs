//! Model scoring: F1 of a persisted artifact against a dataset, plus the
//! ledger append and `latest_score.csv` snapshot for the deployed model.

use std::fs;
use std::io::Write;
use std::path::Path;

use chrono::Utc;

use crate::config::MonitorConfig;
use crate::dataset::Dataset;
use crate::error::Result;
use crate::metrics;
use crate::model::ModelPipeline;
use crate::services::ledger::{Ledger, ScoreKind, ScoreRecord};

/// Score a model artifact against a dataset. This is the raw collaborator:
/// no ledger writes, no snapshots.
pub fn score_artifact(
    model_path: &Path,
    dataset_path: &Path,
    features: &[String],
    target: &str,
) -> Result<f64> {
    let model = ModelPipeline::load(model_path)?;
    let dataset = Dataset::load_csv(dataset_path)?;
    let (xs, ys) = dataset.feature_matrix(features, target, dataset_path)?;
    let preds = model.predict_batch(&xs);
    let truths: Vec<u8> = ys.iter().map(|&y| if y >= 0.5 { 1 } else { 0 }).collect();
    Ok(metrics::f1_score(&truths, &preds))
}

/// Score the deployed model against the held-out test dataset, append the
/// resulting ScoreRecord to the ledger, and refresh the score snapshot that
/// deployment copies as lineage.
pub fn score_deployed_and_record(cfg: &MonitorConfig, ledger: &Ledger) -> Result<ScoreRecord> {
    let value = score_artifact(
        &cfg.deployed_model_path(),
        &cfg.test_dataset_path(),
        &cfg.model.features,
        &cfg.model.target,
    )?;
    let record = ScoreRecord {
        model_version: cfg.model.version.clone(),
        observed_at: Utc::now(),
        score_kind: ScoreKind::F1,
        value,
    };
    ledger.append_score(&record)?;
    write_score_snapshot(&cfg.score_snapshot_path(), &record)?;
    tracing::info!(
        version = %record.model_version,
        f1 = record.value,
        "deployed model scored against held-out test set"
    );
    Ok(record)
}

fn write_score_snapshot(path: &Path, record: &ScoreRecord) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut f = fs::File::create(path)?;
    writeln!(f, "model_version,timestamp,score_kind,value")?;
    writeln!(
        f,
        "{},{},{},{}",
        record.model_version,
        record.observed_at.to_rfc3339(),
        record.score_kind,
        record.value
    )?;
    Ok(())
}
