//! Per-run workflow state, owned exclusively by the orchestrator.

use crate::{EvidenceItem, Stage};
use serde::{Deserialize, Serialize};

/// Mutable state of one pipeline run.
///
/// Fields are updated only by the owning orchestrator, only after the
/// corresponding stage returns, and monotonically: a field, once set, is
/// never cleared mid-run. External observers see it through
/// [`WorkflowState::snapshot`].
#[derive(Debug, Clone, Default)]
pub struct WorkflowState {
    pub query: String,
    pub stage: Stage,
    pub collected: Vec<EvidenceItem>,
    pub verified: Vec<EvidenceItem>,
    pub draft_report: String,
    pub final_report: String,
}

impl WorkflowState {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Read-only view for pollers, independent of any streaming consumer.
    pub fn snapshot(&self) -> WorkflowSnapshot {
        WorkflowSnapshot {
            query: self.query.clone(),
            stage: self.stage,
            collected_count: self.collected.len(),
            verified_count: self.verified.len(),
            has_draft: !self.draft_report.is_empty(),
            is_complete: !self.final_report.is_empty(),
        }
    }
}

/// Point-in-time view of a run's progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowSnapshot {
    pub query: String,
    pub stage: Stage,
    pub collected_count: usize,
    pub verified_count: usize,
    pub has_draft: bool,
    pub is_complete: bool,
}
