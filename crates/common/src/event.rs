//! Progress events emitted at stage boundaries.

use serde::{Deserialize, Serialize};

/// Pipeline stage of a single run.
///
/// Transitions are strictly sequential and forward-only:
/// `Idle → Collecting → Verifying → Reporting → Filtering → Complete`,
/// with `Failed` reachable from any non-terminal stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    #[default]
    Idle,
    Collecting,
    Verifying,
    Reporting,
    Filtering,
    Complete,
    Failed,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Idle => "idle",
            Stage::Collecting => "collecting",
            Stage::Verifying => "verifying",
            Stage::Reporting => "reporting",
            Stage::Filtering => "filtering",
            Stage::Complete => "complete",
            Stage::Failed => "failed",
        }
    }

    /// Whether no further transitions can happen from this stage.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Complete | Stage::Failed)
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A timestamped progress notification.
///
/// Ordering within a run is total and matches stage execution order; the
/// orchestrator emits one on entry to each stage, one summarizing the stage
/// outcome, and one for the terminal condition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusEvent {
    pub stage: Stage,
    pub message: String,
    /// Unix millis at emission time.
    pub timestamp: u64,
}

impl StatusEvent {
    pub fn new(stage: Stage, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
            timestamp: now_millis(),
        }
    }
}

fn now_millis() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
