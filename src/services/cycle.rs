//! The retrain/redeploy cycle: the fixed sequence executed once drift has
//! been detected. Fail-fast: any step error propagates immediately and the
//! remaining steps do not run. There is no rollback; the deployment is left
//! in whatever state the completed steps produced.

use crate::config::MonitorConfig;
use crate::error::Result;
use crate::services::ledger::Ledger;
use crate::services::{deployer, diagnostics, reporting, scoring, training};

/// Run the full cycle: train → deploy → report → score → diagnose.
pub fn execute(cfg: &MonitorConfig, ledger: &Ledger) -> Result<()> {
    tracing::info!("retrain/redeploy cycle: training");
    training::train_model(cfg)?;

    tracing::info!("retrain/redeploy cycle: deploying");
    deployer::promote(cfg)?;

    tracing::info!("retrain/redeploy cycle: reporting");
    reporting::generate_report(cfg)?;

    tracing::info!("retrain/redeploy cycle: scoring");
    scoring::score_deployed_and_record(cfg, ledger)?;

    tracing::info!("retrain/redeploy cycle: diagnostics");
    diagnostics::run_diagnostics(cfg)?;

    Ok(())
}
