// src/services/mod.rs

pub mod cycle;       // retrain/redeploy sequence (fail-fast, no rollback)
pub mod deployer;    // copy-over promotion into the production dir
pub mod diagnostics; // typed diagnostics snapshot
pub mod drift;       // model/data drift decision logic
pub mod ingestion;   // completeness tracking + whole-batch merge
pub mod ledger;      // the ONLY SQLite writer
pub mod monitor;     // top-level state machine
pub mod reporting;   // confusion-matrix report artifact
pub mod scoring;     // F1 scoring + ledger append
pub mod training;    // scaler + logistic regression fit

// Public API
pub use ledger::{IngestionRecord, Ledger, ScoreKind, ScoreRecord};
pub use monitor::{CycleOutcome, Monitor, MonitorState};
