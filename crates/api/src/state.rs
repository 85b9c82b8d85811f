//! Application state and pipeline wiring for the API server.

use lantern_agents::{CollectorAgent, EthicalFilterAgent, ReporterAgent, VerifierAgent};
use lantern_common::Result;
use lantern_llm::{CompletionClient, build_completion_client};
use lantern_pipeline::{Orchestrator, PipelineConfig};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared application state.
///
/// The completion client is built once and shared; each run gets a fresh,
/// independently-owned [`Orchestrator`]. The latest instance is retained so
/// the snapshot and report endpoints can serve pollers.
pub struct AppState {
    config: PipelineConfig,
    client: Arc<dyn CompletionClient>,
    current: RwLock<Option<Arc<Orchestrator>>>,
    start_time: std::time::Instant,
}

impl AppState {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let client = build_completion_client(&config.completion)?;
        Ok(Self::with_client(config, client))
    }

    /// State with an injected completion client, used by tests.
    pub fn with_client(config: PipelineConfig, client: Arc<dyn CompletionClient>) -> Self {
        Self {
            config,
            client,
            current: RwLock::new(None),
            start_time: std::time::Instant::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    pub fn model_name(&self) -> String {
        self.client.model_name().to_string()
    }

    /// Wire a fresh orchestrator with the default capability set per agent.
    pub fn build_orchestrator(&self) -> Result<Arc<Orchestrator>> {
        let collector = CollectorAgent::with_default_capabilities(
            self.client.clone(),
            self.config.media_dir.clone(),
            self.config.max_results_per_source,
        )?;
        let verifier = VerifierAgent::with_default_capabilities(self.client.clone())?;
        let reporter = ReporterAgent::new(self.client.clone());
        let ethical = EthicalFilterAgent::with_default_capabilities(self.client.clone())?;

        Ok(Arc::new(Orchestrator::new(
            Arc::new(collector),
            Arc::new(verifier),
            Arc::new(reporter),
            Arc::new(ethical),
        )))
    }

    /// Retain a run's orchestrator for the polling endpoints.
    pub async fn set_current(&self, orchestrator: Arc<Orchestrator>) {
        *self.current.write().await = Some(orchestrator);
    }

    pub async fn current(&self) -> Option<Arc<Orchestrator>> {
        self.current.read().await.clone()
    }
}
