use std::sync::Arc;

use async_trait::async_trait;
use lantern_common::{LanternError, Result};
use serde::{Deserialize, Serialize};

use crate::anthropic::AnthropicClient;
use crate::client::{CompletionClient, CompletionRequest, CompletionResponse};
use crate::openai::OpenAiClient;
use crate::retry::{RetryConfig, RetryingClient};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    /// "openai" (also any OpenAI-compatible endpoint) or "anthropic".
    pub provider: String,
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_requests: usize,
    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_max_concurrent() -> usize {
    2
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            provider: "openai".into(),
            model: "llama3.2".into(),
            api_key: None,
            api_url: None,
            temperature: None,
            max_tokens: None,
            max_concurrent_requests: default_max_concurrent(),
            retry: RetryConfig::default(),
        }
    }
}

impl CompletionConfig {
    /// Resolve the API key from config or environment.
    ///
    /// Priority: explicit `api_key`, then `OPENAI_API_KEY` /
    /// `ANTHROPIC_API_KEY` depending on the provider.
    pub fn resolve_api_key(&self) -> Option<String> {
        if let Some(ref key) = self.api_key {
            if !key.is_empty() {
                return Some(key.clone());
            }
        }

        let env_var = match self.provider.as_str() {
            "openai" => "OPENAI_API_KEY",
            "anthropic" => "ANTHROPIC_API_KEY",
            _ => return None,
        };

        std::env::var(env_var).ok()
    }
}

/// Wrapper bounding the number of in-flight completion requests.
pub struct SemaphoredClient {
    inner: Arc<dyn CompletionClient>,
    semaphore: Arc<tokio::sync::Semaphore>,
}

impl SemaphoredClient {
    pub fn new(inner: Arc<dyn CompletionClient>, max_concurrent: usize) -> Self {
        Self {
            inner,
            semaphore: Arc::new(tokio::sync::Semaphore::new(max_concurrent)),
        }
    }
}

#[async_trait]
impl CompletionClient for SemaphoredClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|e| LanternError::Completion(format!("Semaphore acquire failed: {e}")))?;
        self.inner.complete(request).await
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}

/// Build the full client stack for a config: provider backend wrapped in
/// retry and concurrency limiting.
pub fn build_completion_client(config: &CompletionConfig) -> Result<Arc<dyn CompletionClient>> {
    let base_client: Box<dyn CompletionClient> = match config.provider.as_str() {
        "openai" => Box::new(OpenAiClient::new(
            config.api_url.clone(),
            config.model.clone(),
            config.resolve_api_key(),
        )),
        "anthropic" => {
            let api_key = config.resolve_api_key().ok_or_else(|| {
                LanternError::Config("Anthropic requires an API key".to_string())
            })?;
            Box::new(AnthropicClient::new(config.model.clone(), api_key))
        }
        other => {
            return Err(LanternError::Config(format!(
                "Unknown completion provider: {other}"
            )));
        }
    };

    let retrying: Box<dyn CompletionClient> =
        Box::new(RetryingClient::new(base_client, config.retry.clone()));

    let semaphored = SemaphoredClient::new(Arc::from(retrying), config.max_concurrent_requests);

    Ok(Arc::new(semaphored))
}
