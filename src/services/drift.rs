//! Drift decision logic.
//!
//! Model drift compares the deployed model's recorded score against a fresh
//! score of the same artifact on the latest merged dataset. The trigger fires
//! when the fresh score is *strictly greater* than the recorded one. The
//! signal is "the deployed model looks different in light of new data", not
//! a regression check. It means retraining chases upward fluctuations and never
//! reacts to degradation; flagged for product-owner confirmation before this
//! is relied on in production.

use crate::config::MonitorConfig;
use crate::error::Result;
use crate::services::ledger::Ledger;
use crate::services::scoring;

/// Fresh-vs-recorded score comparison for the currently deployed model.
///
/// With no recorded score for the deployed version there is nothing to
/// compare against, so no drift is reported.
pub fn has_model_drift(cfg: &MonitorConfig, ledger: &Ledger) -> Result<bool> {
    let Some(previous) = ledger.latest_score(&cfg.model.version)? else {
        tracing::warn!(
            version = %cfg.model.version,
            "no recorded score for deployed model; skipping model-drift check"
        );
        return Ok(false);
    };

    // Deployed artifact on fresh production data, not the held-out test set.
    let f1_new = scoring::score_artifact(
        &cfg.deployed_model_path(),
        &cfg.merged_dataset_path(),
        &cfg.model.features,
        &cfg.model.target,
    )?;
    let drifted = f1_new > previous.value;
    tracing::info!(
        f1_old = previous.value,
        f1_new,
        drifted,
        "model-drift check complete"
    );
    Ok(drifted)
}

/// Statistical data-drift testing is an explicit non-goal; this hook exists
/// below the decision point for a future distributional comparison of column
/// summary statistics across ingestion epochs.
pub fn has_data_drift(_cfg: &MonitorConfig) -> bool {
    false
}
