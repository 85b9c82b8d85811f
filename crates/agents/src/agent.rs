//! The agent abstraction: a named role with a tool registry, a completion
//! client, a prompt template, and a bounded append-only memory log.

use crate::registry::{Capability, ToolRegistry};
use lantern_common::{LanternError, Result};
use lantern_llm::{ChatMessage, CompletionClient, CompletionRequest};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Entries kept in the memory log before the oldest are evicted.
const MEMORY_CAPACITY: usize = 256;

/// Sampling temperature used for all agent completions.
const TEMPERATURE: f32 = 0.2;

/// A stage role wrapping "ask the model" and "invoke a named capability".
pub struct Agent {
    name: String,
    prompt_template: String,
    tools: ToolRegistry,
    client: Arc<dyn CompletionClient>,
    memory: Mutex<VecDeque<Value>>,
}

impl Agent {
    pub fn new(
        name: impl Into<String>,
        prompt_template: impl Into<String>,
        client: Arc<dyn CompletionClient>,
    ) -> Self {
        Self {
            name: name.into(),
            prompt_template: prompt_template.into(),
            tools: ToolRegistry::new(),
            client,
            memory: Mutex::new(VecDeque::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn prompt_template(&self) -> &str {
        &self.prompt_template
    }

    /// Register a capability for this agent. Fails on a duplicate name.
    pub fn register_capability(&mut self, capability: Arc<dyn Capability>) -> Result<()> {
        self.tools.register(capability)
    }

    pub fn has_capability(&self, name: &str) -> bool {
        self.tools.contains(name)
    }

    /// Invoke a registered capability by name, awaiting its backing function
    /// and propagating its failure unchanged.
    pub async fn invoke_capability(&self, name: &str, args: Value) -> Result<Value> {
        self.tools.invoke(name, args).await
    }

    /// Send role-tagged messages to the completion client.
    ///
    /// Transport/provider failure comes back as a typed
    /// [`LanternError::Completion`] result; callers treat the absence of
    /// text as a terminal failure for that operation, not a crash.
    pub async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String> {
        let request = CompletionRequest {
            system_prompt: Some(self.prompt_template.clone()),
            messages,
            temperature: Some(TEMPERATURE),
            max_tokens: None,
        };

        let response = self
            .client
            .complete(request)
            .await
            .map_err(|e| LanternError::Completion(e.to_string()))?;

        Ok(response.content)
    }

    /// Append an entry to the memory log. Side effect only; the log is
    /// never read by decision logic.
    pub fn record(&self, entry: Value) {
        let mut memory = self.memory.lock().unwrap_or_else(|e| e.into_inner());
        if memory.len() == MEMORY_CAPACITY {
            memory.pop_front();
        }
        memory.push_back(entry);
    }

    /// Full ordered memory log, oldest first.
    pub fn history(&self) -> Vec<Value> {
        let memory = self.memory.lock().unwrap_or_else(|e| e.into_inner());
        memory.iter().cloned().collect()
    }
}
