//! Stage agents for the Lantern OSINT pipeline.
//!
//! Each stage role wraps an [`Agent`]: a tool registry of named
//! capabilities, a completion client, a prompt template, and a bounded
//! memory log. The Collector gathers candidate evidence, the Verifier
//! fuses heuristic checks with a model judgment into accept/reject
//! verdicts, the Reporter synthesizes a cited narrative, and the
//! EthicalFilter applies the safety pass before delivery.

pub mod agent;
pub mod collector;
pub mod decision;
pub mod ethical;
pub mod registry;
pub mod reporter;
pub mod tools;
pub mod verifier;

pub use agent::Agent;
pub use collector::CollectorAgent;
pub use decision::{Verdict, parse_search_terms, parse_verdict};
pub use ethical::EthicalFilterAgent;
pub use registry::{Capability, FnCapability, ToolRegistry};
pub use reporter::ReporterAgent;
pub use verifier::VerifierAgent;
