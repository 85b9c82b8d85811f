//! The stage-sequencing state machine.
//!
//! One orchestrator instance is constructed and owned explicitly per
//! run/session; concurrent queries use independent instances with
//! independent state, so no cross-run locking is needed.

use crate::progress::ProgressSender;
use lantern_common::{
    Collect, Filter, LanternError, Report, Result, Stage, Verify, WorkflowSnapshot, WorkflowState,
};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{error, info};

/// Sequences `Collecting → Verifying → Reporting → Filtering → Complete`,
/// owns the per-run [`WorkflowState`], and emits one
/// [`StatusEvent`](lantern_common::StatusEvent) on entry to each stage, one
/// summarizing its outcome, and one for the terminal condition.
pub struct Orchestrator {
    collector: Arc<dyn Collect>,
    verifier: Arc<dyn Verify>,
    reporter: Arc<dyn Report>,
    ethical: Arc<dyn Filter>,
    state: RwLock<WorkflowState>,
    // One query runs to completion before the next may mutate state.
    run_guard: Mutex<()>,
}

impl Orchestrator {
    pub fn new(
        collector: Arc<dyn Collect>,
        verifier: Arc<dyn Verify>,
        reporter: Arc<dyn Report>,
        ethical: Arc<dyn Filter>,
    ) -> Self {
        Self {
            collector,
            verifier,
            reporter,
            ethical,
            state: RwLock::new(WorkflowState::default()),
            run_guard: Mutex::new(()),
        }
    }

    /// Process one query through the whole pipeline, streaming progress
    /// into `progress`. Returns the final report, or the stage error that
    /// moved the run to `Failed`. Either way the caller gets a terminal
    /// outcome; the pipeline never stalls silently.
    pub async fn process_query(&self, query: &str, progress: &ProgressSender) -> Result<String> {
        let _run = self.run_guard.lock().await;

        *self.state.write().await = WorkflowState::new(query);
        info!(query, "Processing query");

        // Collection.
        self.enter(Stage::Collecting, "Starting data collection...", progress)
            .await;
        let collected = match self.collector.collect(query).await {
            Ok(items) => items,
            Err(e) => return self.fail(Stage::Collecting, e, progress).await,
        };
        {
            let mut state = self.state.write().await;
            state.collected = collected.clone();
        }
        progress.emit(
            Stage::Collecting,
            format!("Collection complete. Found {} items.", collected.len()),
        );

        // Verification.
        self.enter(Stage::Verifying, "Starting verification process...", progress)
            .await;
        let verified = match self.verifier.verify(query, collected).await {
            Ok(items) => items,
            Err(e) => return self.fail(Stage::Verifying, e, progress).await,
        };
        {
            let mut state = self.state.write().await;
            state.verified = verified.clone();
        }
        progress.emit(
            Stage::Verifying,
            format!("Verification complete. {} items verified.", verified.len()),
        );

        // Report writing.
        self.enter(Stage::Reporting, "Generating report...", progress)
            .await;
        let draft = match self.reporter.generate_report(query, &verified).await {
            Ok(draft) => draft,
            Err(e) => return self.fail(Stage::Reporting, e, progress).await,
        };
        {
            let mut state = self.state.write().await;
            state.draft_report = draft.clone();
        }
        progress.emit(Stage::Reporting, "Draft report generated.");

        // Ethical filtering.
        self.enter(Stage::Filtering, "Applying ethical filter...", progress)
            .await;
        let final_report = match self.ethical.filter(&draft).await {
            Ok(report) => report,
            Err(e) => return self.fail(Stage::Filtering, e, progress).await,
        };
        {
            let mut state = self.state.write().await;
            state.final_report = final_report.clone();
        }
        progress.emit(Stage::Filtering, "Ethical filter applied.");

        self.state.write().await.stage = Stage::Complete;
        progress.emit(Stage::Complete, "Report complete.");

        info!(query, "Run complete");
        Ok(final_report)
    }

    async fn enter(&self, stage: Stage, message: &str, progress: &ProgressSender) {
        self.state.write().await.stage = stage;
        progress.emit(stage, message);
    }

    /// Move the run to the absorbing `Failed` state and surface the error
    /// as the terminal outcome.
    async fn fail(
        &self,
        stage: Stage,
        err: LanternError,
        progress: &ProgressSender,
    ) -> Result<String> {
        error!(stage = %stage, error = %err, "Stage failed; aborting run");
        self.state.write().await.stage = Stage::Failed;
        let message = format!("{stage} stage failed: {err}");
        progress.emit(Stage::Failed, message.clone());
        Err(LanternError::Stage(message))
    }

    /// Point-in-time view of the run, available independent of any
    /// streaming consumer.
    pub async fn snapshot(&self) -> WorkflowSnapshot {
        self.state.read().await.snapshot()
    }

    /// Full read-only copy of the workflow state for observers.
    pub async fn state(&self) -> WorkflowState {
        self.state.read().await.clone()
    }

    /// The final report, once the run completed.
    pub async fn final_report(&self) -> Option<String> {
        let state = self.state.read().await;
        if state.final_report.is_empty() {
            None
        } else {
            Some(state.final_report.clone())
        }
    }
}
