//! Diagnostics snapshot for the current deployment: test-set predictions,
//! per-column summary statistics of the merged dataset, stage timings, and a
//! dependency-version audit. Each diagnostic is an explicit record type; the
//! whole snapshot is persisted as one JSON document.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::MonitorConfig;
use crate::dataset::{ColumnSummary, Dataset};
use crate::error::{MonitorError, Result};
use crate::model::ModelPipeline;
use crate::services::{ingestion, training};

#[derive(Debug, Serialize)]
pub struct PredictionsDiagnostic {
    pub dataset: String,
    pub truths: Vec<u8>,
    pub predictions: Vec<u8>,
}

/// Wall-clock timings of a fresh merge-ingestion and training pass.
#[derive(Debug, Serialize)]
pub struct TimingDiagnostic {
    pub ingestion_secs: f64,
    pub training_secs: f64,
}

/// Expected-vs-actual version pair for one package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionPair {
    pub expected: String,
    pub actual: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DiagnosticsSnapshot {
    pub generated_at: DateTime<Utc>,
    pub model_version: String,
    pub predictions: PredictionsDiagnostic,
    pub column_summaries: Vec<ColumnSummary>,
    pub timing: TimingDiagnostic,
    pub dependencies: BTreeMap<String, VersionPair>,
}

/// Build the full snapshot for the currently deployed model and persist it
/// to the staging directory.
pub fn run_diagnostics(cfg: &MonitorConfig) -> Result<DiagnosticsSnapshot> {
    let predictions = model_predictions(cfg)?;
    let column_summaries = dataset_summary(cfg)?;
    let timing = execution_timing(cfg)?;
    let dependencies = audit_dependencies(
        &cfg.diagnostics.lockfile_path,
        &cfg.diagnostics.expected_packages,
    )?;

    let snapshot = DiagnosticsSnapshot {
        generated_at: Utc::now(),
        model_version: cfg.model.version.clone(),
        predictions,
        column_summaries,
        timing,
        dependencies,
    };

    let out = cfg.diagnostics_path();
    if let Some(parent) = out.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(&snapshot)
        .map_err(|e| MonitorError::collaborator("diagnostics", e))?;
    fs::write(&out, json)?;
    tracing::info!(snapshot = %out.display(), "diagnostics snapshot written");
    Ok(snapshot)
}

/// Predictions of the deployed model over the held-out test set.
pub fn model_predictions(cfg: &MonitorConfig) -> Result<PredictionsDiagnostic> {
    let model = ModelPipeline::load(&cfg.deployed_model_path())?;
    let test_path = cfg.test_dataset_path();
    let dataset = Dataset::load_csv(&test_path)?;
    let (xs, ys) = dataset.feature_matrix(&cfg.model.features, &cfg.model.target, &test_path)?;
    Ok(PredictionsDiagnostic {
        dataset: test_path.to_string_lossy().to_string(),
        truths: ys.iter().map(|&y| if y >= 0.5 { 1 } else { 0 }).collect(),
        predictions: model.predict_batch(&xs),
    })
}

/// Summary statistics (mean, median, std dev, missing count) for every
/// configured feature column of the merged dataset.
pub fn dataset_summary(cfg: &MonitorConfig) -> Result<Vec<ColumnSummary>> {
    let path = cfg.merged_dataset_path();
    let dataset = Dataset::load_csv(&path)?;
    cfg.model
        .features
        .iter()
        .map(|f| dataset.column_summary(f, &path))
        .collect()
}

/// Re-run merge-ingestion and training against the current data and time
/// both stages. Both operations are idempotent over unchanged inputs.
pub fn execution_timing(cfg: &MonitorConfig) -> Result<TimingDiagnostic> {
    let t0 = Instant::now();
    ingestion::merge_source_files(cfg)?;
    let ingestion_secs = t0.elapsed().as_secs_f64();

    let t1 = Instant::now();
    training::train_model(cfg)?;
    let training_secs = t1.elapsed().as_secs_f64();

    Ok(TimingDiagnostic {
        ingestion_secs,
        training_secs,
    })
}

/// Compare expected package versions against the versions pinned in a
/// Cargo.lock-style lockfile. Structured metadata query, no subprocess
/// output parsing. Packages absent from the lockfile report `actual: None`.
pub fn audit_dependencies(
    lockfile: &Path,
    expected: &BTreeMap<String, String>,
) -> Result<BTreeMap<String, VersionPair>> {
    let mut actual_versions: BTreeMap<String, String> = BTreeMap::new();
    if lockfile.exists() {
        let text = fs::read_to_string(lockfile)?;
        let value: toml::Value =
            text.parse()
                .map_err(|e: toml::de::Error| MonitorError::MalformedData {
                    path: lockfile.to_path_buf(),
                    detail: e.to_string(),
                })?;
        if let Some(packages) = value.get("package").and_then(|p| p.as_array()) {
            for pkg in packages {
                let name = pkg.get("name").and_then(|v| v.as_str());
                let version = pkg.get("version").and_then(|v| v.as_str());
                if let (Some(name), Some(version)) = (name, version) {
                    actual_versions.insert(name.to_string(), version.to_string());
                }
            }
        }
    } else {
        tracing::warn!(lockfile = %lockfile.display(), "lockfile not found; dependency audit has no actuals");
    }

    Ok(expected
        .iter()
        .map(|(name, want)| {
            (
                name.clone(),
                VersionPair {
                    expected: want.clone(),
                    actual: actual_versions.get(name).cloned(),
                },
            )
        })
        .collect())
}
