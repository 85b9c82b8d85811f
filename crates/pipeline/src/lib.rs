//! Stage-sequencing orchestrator for the Lantern OSINT pipeline.
//!
//! The orchestrator drives one query through
//! `Collecting → Verifying → Reporting → Filtering → Complete`, owns the
//! per-run workflow state, and emits ordered progress events through a
//! best-effort channel.
//!
//! # Architecture
//!
//! ```text
//! Caller / API
//!      │ query                     StatusEvents
//!      ▼                                ▲
//! ┌──────────────┐    progress channel  │
//! │ Orchestrator │──────────────────────┘
//! └──────┬───────┘
//!        │ strict sequence
//!   ┌────┴────┬──────────┬──────────┐
//!   ▼         ▼          ▼          ▼
//! Collector Verifier  Reporter  EthicalFilter
//! ```

pub mod config;
pub mod orchestrator;
pub mod progress;

pub use config::PipelineConfig;
pub use orchestrator::Orchestrator;
pub use progress::{ProgressSender, progress_channel};
