//! driftwatch: operates a deployed predictive model in production.
//!
//! Tracks which raw data has been absorbed, detects when the deployed model
//! has gone stale relative to fresh data, and retrains/rescores/redeploys
//! when it has, keeping an auditable append-only history of ingestions and
//! scores in a SQLite ledger.

pub mod config;
pub mod dataset;
pub mod error;
pub mod metrics;
pub mod model;
pub mod services;
pub mod utils;

pub use config::MonitorConfig;
pub use error::{MonitorError, Result};
pub use services::{CycleOutcome, IngestionRecord, Ledger, Monitor, ScoreKind, ScoreRecord};
