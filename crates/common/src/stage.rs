//! Stage contracts implemented by the agent crate.
//!
//! These traits are defined in `lantern-common` so that the pipeline and
//! agent crates can reference them without circular dependencies.

use crate::{EvidenceItem, Result};
use async_trait::async_trait;

/// Collects candidate evidence for a query.
#[async_trait]
pub trait Collect: Send + Sync {
    async fn collect(&self, query: &str) -> Result<Vec<EvidenceItem>>;
}

/// Filters collected evidence down to the subset that passes verification.
///
/// Rejected items are dropped, not retained with a negative verdict.
#[async_trait]
pub trait Verify: Send + Sync {
    async fn verify(&self, query: &str, items: Vec<EvidenceItem>) -> Result<Vec<EvidenceItem>>;
}

/// Synthesizes a narrative report from verified evidence.
#[async_trait]
pub trait Report: Send + Sync {
    async fn generate_report(&self, query: &str, items: &[EvidenceItem]) -> Result<String>;
}

/// Applies the safety/ethics pass to a draft report.
///
/// Implementations must be total (always return text, never block
/// indefinitely) and safe to re-run on their own output.
#[async_trait]
pub trait Filter: Send + Sync {
    async fn filter(&self, draft: &str) -> Result<String>;
}
