//! Append-only JSONL run log. One line per monitoring event; the structured
//! facts backing decisions live in the SQLite ledger, this is the human
//! audit trail of cycle outcomes.

use std::fs;
use std::io::Write;
use std::path::Path;

use chrono::Utc;
use serde_json::Value;

use crate::error::Result;

pub fn emit_event(log_path: &Path, event: &str, data: Value) -> Result<()> {
    if let Some(parent) = log_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let line = serde_json::json!({
        "timestamp": Utc::now().to_rfc3339(),
        "event": event,
        "data": data
    });
    let mut f = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)?;
    writeln!(f, "{line}")?;
    Ok(())
}
