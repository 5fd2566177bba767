// Integration tests for the drift decision logic, including the
// "improvement triggers drift" polarity.

use std::fs;
use std::path::Path;

use chrono::Utc;

use driftwatch::model::{ModelPipeline, StandardScaler};
use driftwatch::services::drift::{has_data_drift, has_model_drift};
use driftwatch::services::ledger::{Ledger, ScoreKind, ScoreRecord};
use driftwatch::MonitorConfig;

const HEADER: &str = "corporation,lastmonth_activity,lastyear_activity,number_of_employees,exited";

fn write_merged_dataset(path: &Path, n: usize) {
    let mut text = format!("{HEADER}\n");
    for i in 0..n {
        let exited = u8::from(i % 100 >= 50);
        text.push_str(&format!("c{i},{},{},{},{exited}\n", i % 100, 2 * i, 10 + i % 7));
    }
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

/// Hand-built pipeline thresholding on lastmonth_activity >= 50, which is
/// exactly how the test data is labeled. Flip the sign to get a model that
/// is wrong on every row.
fn threshold_model(cfg: &MonitorConfig, sign: f64) -> ModelPipeline {
    ModelPipeline {
        version: cfg.model.version.clone(),
        trained_at: Utc::now(),
        feature_names: cfg.model.features.clone(),
        scaler: StandardScaler {
            means: vec![49.5, 0.0, 0.0],
            std_devs: vec![1.0, 1.0, 1.0],
        },
        weights: vec![sign * 10.0, 0.0, 0.0],
        bias: 0.0,
    }
}

fn setup(root: &Path, model_sign: f64) -> (MonitorConfig, Ledger) {
    let cfg = MonitorConfig::load(root).unwrap();
    write_merged_dataset(&cfg.merged_dataset_path(), 100);
    threshold_model(&cfg, model_sign)
        .save(&cfg.deployed_model_path())
        .unwrap();
    let ledger = Ledger::open(&cfg.storage.ledger_path).unwrap();
    (cfg, ledger)
}

fn record_score(ledger: &Ledger, version: &str, value: f64) {
    ledger
        .append_score(&ScoreRecord {
            model_version: version.to_string(),
            observed_at: Utc::now(),
            score_kind: ScoreKind::F1,
            value,
        })
        .unwrap();
}

#[test]
fn improvement_over_recorded_score_triggers_drift() {
    let dir = tempfile::tempdir().unwrap();
    let (cfg, ledger) = setup(dir.path(), 1.0);
    // Fresh score of the perfect model on the merged dataset is 1.0.
    record_score(&ledger, &cfg.model.version, 0.80);

    assert!(has_model_drift(&cfg, &ledger).unwrap());
}

#[test]
fn equal_fresh_score_is_not_drift() {
    let dir = tempfile::tempdir().unwrap();
    let (cfg, ledger) = setup(dir.path(), 1.0);
    record_score(&ledger, &cfg.model.version, 1.0);

    // Strictly-greater comparison: a tie does not fire.
    assert!(!has_model_drift(&cfg, &ledger).unwrap());
}

#[test]
fn degraded_fresh_score_is_not_drift() {
    let dir = tempfile::tempdir().unwrap();
    // Inverted model: fresh score on the merged dataset is 0.0.
    let (cfg, ledger) = setup(dir.path(), -1.0);
    record_score(&ledger, &cfg.model.version, 0.80);

    assert!(!has_model_drift(&cfg, &ledger).unwrap());
}

#[test]
fn missing_prior_score_means_no_drift() {
    let dir = tempfile::tempdir().unwrap();
    let (cfg, ledger) = setup(dir.path(), 1.0);
    // A score for some other version must not count.
    record_score(&ledger, "9.9", 0.10);

    assert!(!has_model_drift(&cfg, &ledger).unwrap());
}

#[test]
fn data_drift_hook_is_always_false() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = MonitorConfig::load(dir.path()).unwrap();
    assert!(!has_data_drift(&cfg));
}
