//! The inference pipeline: a standard scaler feeding a logistic-regression
//! classifier, persisted as a JSON artifact. Fitting is deterministic batch
//! gradient descent; the seed and split fraction come from configuration so
//! retraining is reproducible.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{MonitorError, Result};

const EPOCHS: usize = 500;
const LEARNING_RATE: f64 = 0.1;

/// Column-wise standardization fitted on the training split.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    pub means: Vec<f64>,
    pub std_devs: Vec<f64>,
}

impl StandardScaler {
    pub fn fit(xs: &[Vec<f64>]) -> Self {
        let dims = xs.first().map(|r| r.len()).unwrap_or(0);
        let n = xs.len().max(1) as f64;
        let mut means = vec![0.0; dims];
        for row in xs {
            for (j, v) in row.iter().enumerate() {
                means[j] += v;
            }
        }
        for m in &mut means {
            *m /= n;
        }
        let mut std_devs = vec![0.0; dims];
        for row in xs {
            for (j, v) in row.iter().enumerate() {
                std_devs[j] += (v - means[j]).powi(2);
            }
        }
        for s in &mut std_devs {
            *s = (*s / n).sqrt();
            // Constant columns pass through unscaled.
            if *s == 0.0 {
                *s = 1.0;
            }
        }
        Self { means, std_devs }
    }

    pub fn transform(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .enumerate()
            .map(|(j, v)| (v - self.means[j]) / self.std_devs[j])
            .collect()
    }
}

/// Scaler + logistic regression, together with the metadata needed to audit
/// which deployment produced which scores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelPipeline {
    pub version: String,
    pub trained_at: DateTime<Utc>,
    pub feature_names: Vec<String>,
    pub scaler: StandardScaler,
    pub weights: Vec<f64>,
    pub bias: f64,
}

impl ModelPipeline {
    /// Fit the full pipeline on the given rows (already restricted to the
    /// configured feature columns, targets in {0, 1}).
    pub fn fit(version: &str, feature_names: &[String], xs: &[Vec<f64>], ys: &[f64]) -> Self {
        let scaler = StandardScaler::fit(xs);
        let scaled: Vec<Vec<f64>> = xs.iter().map(|r| scaler.transform(r)).collect();

        let dims = feature_names.len();
        let mut weights = vec![0.0; dims];
        let mut bias = 0.0;
        let n = scaled.len().max(1) as f64;

        for _ in 0..EPOCHS {
            let mut grad_w = vec![0.0; dims];
            let mut grad_b = 0.0;
            for (row, &y) in scaled.iter().zip(ys) {
                let z: f64 = bias + row.iter().zip(&weights).map(|(x, w)| x * w).sum::<f64>();
                let err = sigmoid(z) - y;
                for (g, x) in grad_w.iter_mut().zip(row) {
                    *g += err * x;
                }
                grad_b += err;
            }
            for (w, g) in weights.iter_mut().zip(&grad_w) {
                *w -= LEARNING_RATE * g / n;
            }
            bias -= LEARNING_RATE * grad_b / n;
        }

        Self {
            version: version.to_string(),
            trained_at: Utc::now(),
            feature_names: feature_names.to_vec(),
            scaler,
            weights,
            bias,
        }
    }

    pub fn predict_proba(&self, row: &[f64]) -> f64 {
        let scaled = self.scaler.transform(row);
        let z: f64 = self.bias
            + scaled
                .iter()
                .zip(&self.weights)
                .map(|(x, w)| x * w)
                .sum::<f64>();
        sigmoid(z)
    }

    pub fn predict(&self, row: &[f64]) -> u8 {
        if self.predict_proba(row) >= 0.5 {
            1
        } else {
            0
        }
    }

    pub fn predict_batch(&self, xs: &[Vec<f64>]) -> Vec<u8> {
        xs.iter().map(|r| self.predict(r)).collect()
    }

    /// Persist the artifact as JSON, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| MonitorError::collaborator("model serialization", e))?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load a persisted artifact. A missing file surfaces as
    /// `SourceDataMissing` so callers can report a plain not-found condition.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(MonitorError::SourceDataMissing(path.to_path_buf()));
        }
        let text = fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|e| MonitorError::MalformedData {
            path: path.to_path_buf(),
            detail: format!("not a valid model artifact: {e}"),
        })
    }
}

/// Deterministic train/validation split. The shuffle is a small xorshift
/// keyed on the configured seed, so identical inputs produce identical
/// splits across runs and machines.
pub fn train_validation_split(
    xs: &[Vec<f64>],
    ys: &[f64],
    test_size: f64,
    seed: u64,
) -> (Vec<Vec<f64>>, Vec<f64>, Vec<Vec<f64>>, Vec<f64>) {
    let mut order: Vec<usize> = (0..xs.len()).collect();
    let mut state = seed.wrapping_add(0x9E37_79B9_7F4A_7C15);
    for i in (1..order.len()).rev() {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        let j = (state % (i as u64 + 1)) as usize;
        order.swap(i, j);
    }
    let n_val = ((xs.len() as f64) * test_size).round() as usize;
    let n_val = n_val.min(xs.len().saturating_sub(1));

    let mut train_x = Vec::new();
    let mut train_y = Vec::new();
    let mut val_x = Vec::new();
    let mut val_y = Vec::new();
    for (pos, &idx) in order.iter().enumerate() {
        if pos < n_val {
            val_x.push(xs[idx].clone());
            val_y.push(ys[idx]);
        } else {
            train_x.push(xs[idx].clone());
            train_y.push(ys[idx]);
        }
    }
    (train_x, train_y, val_x, val_y)
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}
