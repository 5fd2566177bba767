//! Train a fresh pipeline on the full current merged dataset and persist it
//! to the staging location. Deployment is a separate step; nothing here
//! touches the production directory.

use std::path::PathBuf;

use crate::config::MonitorConfig;
use crate::dataset::Dataset;
use crate::error::Result;
use crate::metrics;
use crate::model::{train_validation_split, ModelPipeline};

/// Fit scaler + logistic regression on the merged dataset and write the
/// staged artifact. Returns the artifact path.
pub fn train_model(cfg: &MonitorConfig) -> Result<PathBuf> {
    let dataset_path = cfg.merged_dataset_path();
    let dataset = Dataset::load_csv(&dataset_path)?;
    let (xs, ys) = dataset.feature_matrix(&cfg.model.features, &cfg.model.target, &dataset_path)?;

    let (train_x, train_y, val_x, val_y) =
        train_validation_split(&xs, &ys, cfg.model.test_size, cfg.model.random_seed);
    let model = ModelPipeline::fit(&cfg.model.version, &cfg.model.features, &train_x, &train_y);

    // Validation split f1 is informational only; the authoritative score is
    // computed against the dedicated held-out test set by scoring.
    if !val_x.is_empty() {
        let preds = model.predict_batch(&val_x);
        let truths: Vec<u8> = val_y.iter().map(|&y| if y >= 0.5 { 1 } else { 0 }).collect();
        tracing::info!(
            f1 = metrics::f1_score(&truths, &preds),
            rows = train_x.len(),
            "model fitted, validation split scored"
        );
    }

    let out = cfg.staged_model_path();
    model.save(&out)?;
    tracing::info!(artifact = %out.display(), version = %model.version, "staged model written");
    Ok(out)
}
