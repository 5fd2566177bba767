//! Top-level monitoring orchestrator.
//!
//! One invocation is one run-to-completion pass of the state machine:
//!
//! ```text
//! Idle -> CheckingIngestion -> (NoNewData | CheckingDrift)
//!                                 -> (NoDrift | Retraining) -> Idle
//! ```
//!
//! Each run starts at Idle and ends at Idle, or aborts with a propagated
//! error before returning. No state persists between invocations; the
//! durable facts live in the ledger.

use serde_json::json;
use uuid::Uuid;

use crate::config::MonitorConfig;
use crate::error::Result;
use crate::services::ledger::Ledger;
use crate::services::{cycle, drift, ingestion};
use crate::utils::logbook;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Idle,
    CheckingIngestion,
    NoNewData,
    CheckingDrift,
    NoDrift,
    Retraining,
}

/// Terminal result of one monitoring cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    NoNewData,
    NoDrift,
    Retrained,
}

impl CycleOutcome {
    /// Operator-facing terminal line for this outcome.
    pub fn message(&self) -> &'static str {
        match self {
            CycleOutcome::NoNewData => "No new data found; continuing with current model.",
            CycleOutcome::NoDrift => {
                "No significant changes found; continuing with current model."
            }
            CycleOutcome::Retrained => "Drift detected; model retrained and redeployed.",
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            CycleOutcome::NoNewData => "no_new_data",
            CycleOutcome::NoDrift => "no_drift",
            CycleOutcome::Retrained => "retrained",
        }
    }
}

pub struct Monitor<'a> {
    cfg: &'a MonitorConfig,
}

impl<'a> Monitor<'a> {
    pub fn new(cfg: &'a MonitorConfig) -> Self {
        Self { cfg }
    }

    /// Run one full monitoring cycle against an open ledger.
    pub fn run_cycle(&self, ledger: &Ledger) -> Result<CycleOutcome> {
        let cycle_id = Uuid::new_v4();
        let mut state = MonitorState::Idle;

        state = self.transition(cycle_id, state, MonitorState::CheckingIngestion);
        let new_data = ingestion::check_and_ingest(self.cfg, ledger)?;
        if !new_data {
            state = self.transition(cycle_id, state, MonitorState::NoNewData);
            return self.finish(cycle_id, state, CycleOutcome::NoNewData);
        }

        state = self.transition(cycle_id, state, MonitorState::CheckingDrift);
        let model_drift = drift::has_model_drift(self.cfg, ledger)?;
        let data_drift = drift::has_data_drift(self.cfg);
        if !(model_drift || data_drift) {
            state = self.transition(cycle_id, state, MonitorState::NoDrift);
            return self.finish(cycle_id, state, CycleOutcome::NoDrift);
        }

        state = self.transition(cycle_id, state, MonitorState::Retraining);
        cycle::execute(self.cfg, ledger)?;
        self.finish(cycle_id, state, CycleOutcome::Retrained)
    }

    fn transition(&self, cycle_id: Uuid, from: MonitorState, to: MonitorState) -> MonitorState {
        tracing::debug!(%cycle_id, ?from, ?to, "monitor transition");
        to
    }

    fn finish(
        &self,
        cycle_id: Uuid,
        state: MonitorState,
        outcome: CycleOutcome,
    ) -> Result<CycleOutcome> {
        self.transition(cycle_id, state, MonitorState::Idle);
        tracing::info!(%cycle_id, outcome = outcome.as_str(), "monitoring cycle complete");
        logbook::emit_event(
            &self.cfg.logbook.path,
            "cycle_complete",
            json!({
                "cycle_id": cycle_id.to_string(),
                "outcome": outcome.as_str(),
                "model_version": self.cfg.model.version,
            }),
        )?;
        Ok(outcome)
    }
}
