//! Confusion-matrix report for the deployed model on the held-out test set,
//! persisted as a structured JSON artifact.

use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::MonitorConfig;
use crate::dataset::Dataset;
use crate::error::{MonitorError, Result};
use crate::metrics::ConfusionMatrix;
use crate::model::ModelPipeline;

#[derive(Debug, Serialize)]
pub struct ConfusionReport {
    pub model_version: String,
    pub generated_at: DateTime<Utc>,
    pub test_dataset: String,
    pub matrix: ConfusionMatrix,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// Predict the test set with the deployed model, compute the confusion
/// matrix, and write the report artifact. Returns the report path.
pub fn generate_report(cfg: &MonitorConfig) -> Result<PathBuf> {
    let model = ModelPipeline::load(&cfg.deployed_model_path())?;
    let test_path = cfg.test_dataset_path();
    let dataset = Dataset::load_csv(&test_path)?;
    let (xs, ys) = dataset.feature_matrix(&cfg.model.features, &cfg.model.target, &test_path)?;

    let predictions = model.predict_batch(&xs);
    let truths: Vec<u8> = ys.iter().map(|&y| if y >= 0.5 { 1 } else { 0 }).collect();
    let matrix = ConfusionMatrix::from_predictions(&truths, &predictions);

    let report = ConfusionReport {
        model_version: model.version.clone(),
        generated_at: Utc::now(),
        test_dataset: test_path.to_string_lossy().to_string(),
        precision: matrix.precision(),
        recall: matrix.recall(),
        f1: matrix.f1(),
        matrix,
    };

    let out = cfg.report_path();
    if let Some(parent) = out.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(&report)
        .map_err(|e| MonitorError::collaborator("report generation", e))?;
    fs::write(&out, json)?;
    tracing::info!(report = %out.display(), f1 = report.f1, "confusion-matrix report written");
    Ok(out)
}
