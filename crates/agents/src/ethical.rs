//! Ethical filter agent: content-policy check, anonymization, and a model
//! review pass over the draft report.

use crate::agent::Agent;
use crate::registry::Capability;
use crate::tools::moderation::{
    PolicyReport, anonymize_capability, content_policy_capability,
};
use crate::tools::names;
use async_trait::async_trait;
use chrono::Utc;
use lantern_common::{Filter, Result};
use lantern_llm::{ChatMessage, CompletionClient};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

const ETHICAL_PROMPT: &str = "\
You are an Ethical Filter Agent in an OSINT system. Review the draft report \
for ethical concerns and compliance issues. Check for:

1. Privacy violations (personal information that should be redacted)
2. Graphic content (add warnings where appropriate)
3. Biased or inflammatory language
4. Unsubstantiated claims
5. Sensitive information that could endanger individuals

Return the full adjusted report so it is ethical and responsible.";

/// The safety pass over the draft report.
///
/// This stage is total: every internal failure degrades to returning the
/// best text produced so far, and re-running it on its own output is safe.
pub struct EthicalFilterAgent {
    agent: Agent,
}

impl EthicalFilterAgent {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self {
            agent: Agent::new("ethical_filter", ETHICAL_PROMPT, client),
        }
    }

    pub fn with_default_capabilities(client: Arc<dyn CompletionClient>) -> Result<Self> {
        let mut filter = Self::new(client);
        filter.register_capability(Arc::new(content_policy_capability()))?;
        filter.register_capability(Arc::new(anonymize_capability()))?;
        Ok(filter)
    }

    pub fn register_capability(&mut self, capability: Arc<dyn Capability>) -> Result<()> {
        self.agent.register_capability(capability)
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    async fn policy_report(&self, text: &str) -> Option<PolicyReport> {
        match self
            .agent
            .invoke_capability(names::CHECK_CONTENT_POLICY, json!({ "text": text }))
            .await
        {
            Ok(value) => match serde_json::from_value(value) {
                Ok(report) => Some(report),
                Err(e) => {
                    warn!(error = %e, "Malformed content-policy result; skipping check");
                    None
                }
            },
            Err(e) => {
                warn!(error = %e, "Content-policy check failed; skipping check");
                None
            }
        }
    }

    async fn anonymize(&self, text: &str) -> Option<String> {
        match self
            .agent
            .invoke_capability(names::ANONYMIZE_TEXT, json!({ "text": text }))
            .await
        {
            Ok(value) => value.as_str().map(str::to_string),
            Err(e) => {
                warn!(error = %e, "Anonymization failed; keeping text as-is");
                None
            }
        }
    }
}

#[async_trait]
impl Filter for EthicalFilterAgent {
    async fn filter(&self, draft: &str) -> Result<String> {
        let mut text = draft.to_string();
        let mut violation_count = 0;

        if let Some(report) = self.policy_report(&text).await {
            violation_count = report.violation_count;
            if report.has_violations {
                info!(
                    violations = report.violation_count,
                    categories = ?report.categories,
                    "Policy violations found; anonymizing"
                );
                if let Some(anonymized) = self.anonymize(&text).await {
                    text = anonymized;
                }
            }
        }

        let reviewed = match self
            .agent
            .complete(vec![ChatMessage::user(format!("Draft Report: {text}"))])
            .await
        {
            Ok(reviewed) if !reviewed.trim().is_empty() => reviewed,
            Ok(_) => {
                warn!("Ethics review returned empty text; keeping filtered draft");
                text
            }
            Err(e) => {
                warn!(error = %e, "Ethics review failed; keeping filtered draft");
                text
            }
        };

        self.agent.record(json!({
            "violations": violation_count,
            "report_chars": reviewed.len(),
            "timestamp": Utc::now().to_rfc3339(),
        }));

        Ok(reviewed)
    }
}
