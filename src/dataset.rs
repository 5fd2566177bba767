//! In-memory CSV table used for the merged dataset and the held-out test set.
//!
//! The source files are plain numeric CSVs with a header row; there is no
//! quoting or escaping in this domain, so parsing is a straight split on
//! commas. Missing cells become NaN on numeric extraction and are skipped by
//! training.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::error::{MonitorError, Result};

#[derive(Debug, Clone)]
pub struct Dataset {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Dataset {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Load a CSV file with a header row. A missing file is surfaced as
    /// `SourceDataMissing` so the caller can translate it to a plain
    /// "not found" condition.
    pub fn load_csv(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(MonitorError::SourceDataMissing(path.to_path_buf()));
        }
        let text = fs::read_to_string(path)?;
        let mut lines = text.lines();
        let header = lines.next().ok_or_else(|| MonitorError::MalformedData {
            path: path.to_path_buf(),
            detail: "empty file (no header row)".to_string(),
        })?;
        let columns: Vec<String> = split_row(header);
        let mut rows = Vec::new();
        for (i, line) in lines.enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let row = split_row(line);
            if row.len() != columns.len() {
                return Err(MonitorError::MalformedData {
                    path: path.to_path_buf(),
                    detail: format!(
                        "row {} has {} fields, expected {}",
                        i + 2,
                        row.len(),
                        columns.len()
                    ),
                });
            }
            rows.push(row);
        }
        Ok(Self { columns, rows })
    }

    /// Persist the table, creating parent directories as needed.
    pub fn save_csv(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = String::new();
        out.push_str(&self.columns.join(","));
        out.push('\n');
        for row in &self.rows {
            out.push_str(&row.join(","));
            out.push('\n');
        }
        fs::write(path, out)?;
        Ok(())
    }

    /// Append all rows of `other`; the column sets must match exactly.
    pub fn append_rows(&mut self, other: &Dataset, origin: &Path) -> Result<()> {
        if self.columns != other.columns {
            return Err(MonitorError::MalformedData {
                path: origin.to_path_buf(),
                detail: format!(
                    "column mismatch: expected [{}], got [{}]",
                    self.columns.join(","),
                    other.columns.join(",")
                ),
            });
        }
        self.rows.extend(other.rows.iter().cloned());
        Ok(())
    }

    /// Drop exact-duplicate rows, keeping first occurrences in order.
    pub fn drop_duplicates(&mut self) {
        let mut seen = HashSet::new();
        self.rows.retain(|row| seen.insert(row.join("\u{1f}")));
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Numeric view of one column; empty or unparseable cells become NaN.
    pub fn numeric_column(&self, name: &str, origin: &Path) -> Result<Vec<f64>> {
        let idx = self
            .column_index(name)
            .ok_or_else(|| MonitorError::MalformedData {
                path: origin.to_path_buf(),
                detail: format!("missing column '{name}'"),
            })?;
        Ok(self
            .rows
            .iter()
            .map(|row| row[idx].parse::<f64>().unwrap_or(f64::NAN))
            .collect())
    }

    /// Extract the feature matrix and target vector for model fitting.
    /// Rows with any non-numeric feature or target cell are skipped.
    pub fn feature_matrix(
        &self,
        features: &[String],
        target: &str,
        origin: &Path,
    ) -> Result<(Vec<Vec<f64>>, Vec<f64>)> {
        let mut cols = Vec::with_capacity(features.len());
        for f in features {
            cols.push(self.numeric_column(f, origin)?);
        }
        let y_col = self.numeric_column(target, origin)?;

        let mut xs = Vec::new();
        let mut ys = Vec::new();
        for i in 0..self.rows.len() {
            let row: Vec<f64> = cols.iter().map(|c| c[i]).collect();
            if row.iter().any(|v| v.is_nan()) || y_col[i].is_nan() {
                continue;
            }
            xs.push(row);
            ys.push(y_col[i]);
        }
        if xs.is_empty() {
            return Err(MonitorError::MalformedData {
                path: origin.to_path_buf(),
                detail: "no usable rows after dropping non-numeric cells".to_string(),
            });
        }
        Ok((xs, ys))
    }

    /// Summary statistics over the numeric values of one column. Cells that
    /// do not parse count as missing.
    pub fn column_summary(&self, name: &str, origin: &Path) -> Result<ColumnSummary> {
        let values = self.numeric_column(name, origin)?;
        let mut present: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
        let missing = values.len() - present.len();
        present.sort_by(f64::total_cmp);

        let (mean, median, std_dev) = if present.is_empty() {
            (0.0, 0.0, 0.0)
        } else {
            let n = present.len() as f64;
            let mean = present.iter().sum::<f64>() / n;
            let median = if present.len() % 2 == 1 {
                present[present.len() / 2]
            } else {
                (present[present.len() / 2 - 1] + present[present.len() / 2]) / 2.0
            };
            let var = present.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
            (mean, median, var.sqrt())
        };

        Ok(ColumnSummary {
            column: name.to_string(),
            mean,
            median,
            std_dev,
            missing,
        })
    }
}

/// Per-column summary statistics for the diagnostics snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct ColumnSummary {
    pub column: String,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub missing: usize,
}

fn split_row(line: &str) -> Vec<String> {
    line.trim_end_matches('\r')
        .split(',')
        .map(|s| s.trim().to_string())
        .collect()
}
