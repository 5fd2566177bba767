//! Binary-classification metrics used by scoring and reporting.

use serde::Serialize;

/// 2x2 confusion matrix for a binary classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConfusionMatrix {
    pub true_negatives: u64,
    pub false_positives: u64,
    pub false_negatives: u64,
    pub true_positives: u64,
}

impl ConfusionMatrix {
    pub fn from_predictions(truths: &[u8], predictions: &[u8]) -> Self {
        let mut m = Self {
            true_negatives: 0,
            false_positives: 0,
            false_negatives: 0,
            true_positives: 0,
        };
        for (&y, &p) in truths.iter().zip(predictions) {
            match (y, p) {
                (0, 0) => m.true_negatives += 1,
                (0, _) => m.false_positives += 1,
                (_, 0) => m.false_negatives += 1,
                (_, _) => m.true_positives += 1,
            }
        }
        m
    }

    pub fn precision(&self) -> f64 {
        let denom = self.true_positives + self.false_positives;
        if denom == 0 {
            0.0
        } else {
            self.true_positives as f64 / denom as f64
        }
    }

    pub fn recall(&self) -> f64 {
        let denom = self.true_positives + self.false_negatives;
        if denom == 0 {
            0.0
        } else {
            self.true_positives as f64 / denom as f64
        }
    }

    /// F1 of the positive class; 0.0 when the classifier never hits it.
    pub fn f1(&self) -> f64 {
        let denom = 2 * self.true_positives + self.false_positives + self.false_negatives;
        if denom == 0 {
            0.0
        } else {
            (2 * self.true_positives) as f64 / denom as f64
        }
    }
}

pub fn f1_score(truths: &[u8], predictions: &[u8]) -> f64 {
    ConfusionMatrix::from_predictions(truths, predictions).f1()
}
