use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the monitoring core.
///
/// The core is fail-fast: nothing here is retried automatically, and a
/// failure inside the retrain/redeploy cycle leaves the deployment in
/// whatever state the completed steps produced.
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("monitoring ledger unavailable: {0}")]
    StoreUnavailable(String),

    #[error("ledger schema mismatch in table '{table}': {detail}")]
    SchemaMismatch { table: String, detail: String },

    #[error("File not found: {0}")]
    SourceDataMissing(PathBuf),

    #[error("malformed dataset {path}: {detail}")]
    MalformedData { path: PathBuf, detail: String },

    #[error("{stage} failed: {detail}")]
    CollaboratorFailure { stage: String, detail: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MonitorError {
    /// Wrap a collaborator (train/score/report/diagnose) failure with the
    /// stage name it happened in.
    pub fn collaborator(stage: &str, err: impl std::fmt::Display) -> Self {
        MonitorError::CollaboratorFailure {
            stage: stage.to_string(),
            detail: err.to_string(),
        }
    }
}

impl From<rusqlite::Error> for MonitorError {
    fn from(err: rusqlite::Error) -> Self {
        MonitorError::StoreUnavailable(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MonitorError>;
