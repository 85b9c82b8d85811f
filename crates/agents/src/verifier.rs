//! Verifier agent: fuses heuristic checks and a model judgment into an
//! accept/reject verdict per evidence item.

use crate::agent::Agent;
use crate::decision::{Verdict, parse_verdict};
use crate::registry::Capability;
use crate::tools::names;
use crate::tools::verification::{
    ConsistencyReport, GeolocationReport, Reliability, ReliabilityReport, ReverseSearchReport,
    ShadowReport, analyze_shadows_capability, geolocate_media_capability,
    metadata_consistency_capability, reverse_image_search_capability,
    source_reliability_capability,
};
use async_trait::async_trait;
use chrono::Utc;
use lantern_common::{EvidenceItem, LanternError, Result, VerificationRecord, Verify};
use lantern_llm::{ChatMessage, CompletionClient};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};

const VERIFIER_PROMPT: &str = "\
You are a Verification Agent in an OSINT system. Evaluate the item and the \
verification results gathered so far and decide whether the item should be \
considered verified. Respond with lines of the form 'Verified: true/false', \
'Confidence: <score between 0 and 1>', and 'Explanation: <one sentence>'.";

/// Verifies collected evidence. Items that fail are dropped from the
/// output, not retained with a negative verdict.
pub struct VerifierAgent {
    agent: Agent,
}

impl VerifierAgent {
    /// A verifier with an empty registry; callers register the check
    /// capabilities themselves.
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self {
            agent: Agent::new("verifier", VERIFIER_PROMPT, client),
        }
    }

    /// A verifier wired with the default capability set.
    pub fn with_default_capabilities(client: Arc<dyn CompletionClient>) -> Result<Self> {
        let mut verifier = Self::new(client);
        verifier.register_capability(Arc::new(source_reliability_capability()))?;
        verifier.register_capability(Arc::new(reverse_image_search_capability()))?;
        verifier.register_capability(Arc::new(geolocate_media_capability()))?;
        verifier.register_capability(Arc::new(analyze_shadows_capability()))?;
        verifier.register_capability(Arc::new(metadata_consistency_capability()))?;
        Ok(verifier)
    }

    pub fn register_capability(&mut self, capability: Arc<dyn Capability>) -> Result<()> {
        self.agent.register_capability(capability)
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    /// Run the per-item pipeline. `Ok(true)` keeps the item; errors abort
    /// only this item's processing.
    async fn verify_item(&self, item: &mut EvidenceItem) -> Result<bool> {
        let mut record = VerificationRecord::default();

        // Source reliability is a hard gate: an unreliable source taints
        // everything downstream regardless of media evidence.
        let reliability: ReliabilityReport = self
            .invoke_typed(
                names::CHECK_SOURCE_RELIABILITY,
                json!({ "source_name": item.source_name, "url": item.url }),
            )
            .await?;

        record.method("source_reliability_check");
        record.note(format!("Source reliability: {}", reliability.reliability));

        if reliability.reliability == Reliability::Unreliable {
            debug!(item_id = %item.id, "Source is known to be unreliable; item rejected");
            return Ok(false);
        }

        if let Some(media) = item.media.clone() {
            self.check_media(item, &media.local_path, &mut record).await?;
        }

        let consistency: ConsistencyReport = self
            .invoke_typed(
                names::CHECK_METADATA_CONSISTENCY,
                serde_json::to_value(&*item)?,
            )
            .await?;

        record.method("metadata_consistency");
        record.note(format!("Metadata check: {}", consistency.result));

        let verdict = self.final_decision(item, &record).await;

        let accepted = verdict.accepted();
        record.verified = verdict.verified;
        record.confidence = verdict.confidence;
        if let Some(assessment) = verdict.assessment {
            record.note(format!("Final assessment: {assessment}"));
        }

        item.verification = Some(record);
        Ok(accepted)
    }

    /// Media checks gather independent, non-authoritative signals: none of
    /// them rejects on its own.
    async fn check_media(
        &self,
        item: &mut EvidenceItem,
        media_path: &str,
        record: &mut VerificationRecord,
    ) -> Result<()> {
        let reverse: ReverseSearchReport = self
            .invoke_typed(names::REVERSE_IMAGE_SEARCH, json!({ "image_path": media_path }))
            .await?;

        record.method("reverse_image_search");

        // Matches without a date sort last rather than winning.
        fn match_date(date: &str) -> &str {
            if date.is_empty() { "9999-12-31" } else { date }
        }
        let earliest = reverse
            .matches
            .iter()
            .min_by(|a, b| match_date(&a.date).cmp(&match_date(&b.date)));

        if let Some(earliest) = earliest {
            match item.claimed_date() {
                Some(claimed) if !earliest.date.is_empty() && earliest.date.as_str() < claimed => {
                    record.note(format!(
                        "WARNING: Image appears to be older than claimed. Earliest match: {} from {}",
                        earliest.date, earliest.url
                    ));
                }
                _ => record.note("Image corroborated by reverse search."),
            }
        } else {
            record.note("No matches found in reverse image search.");
        }

        let geolocation: GeolocationReport = self
            .invoke_typed(names::GEOLOCATE_MEDIA, json!({ "image_path": media_path }))
            .await?;

        record.method("geolocation");

        if let Some(location) = geolocation.location {
            record.note(format!(
                "Geolocation: {} (confidence {:.2})",
                location, geolocation.confidence
            ));
            item.verified_location = Some(location);
        }

        // Temporal consistency needs both a location and a timestamp to
        // reference; without them the check is skipped silently.
        if item.verified_location.is_some() && item.claimed_date().is_some() {
            let shadows: ShadowReport = self
                .invoke_typed(
                    names::ANALYZE_SHADOWS,
                    json!({
                        "image_path": media_path,
                        "claimed_location": item.verified_location,
                        "claimed_time": item.timestamp,
                    }),
                )
                .await?;

            record.method("shadow_analysis");

            match shadows.consistent {
                Some(true) => record.note(format!(
                    "Shadow analysis is consistent with claimed time {}",
                    item.timestamp
                )),
                Some(false) => record.note(format!(
                    "WARNING: Shadow analysis suggests inconsistency with claimed time. Estimated time: {}",
                    shadows.estimated_time.as_deref().unwrap_or("unknown")
                )),
                None => {}
            }
        }

        Ok(())
    }

    /// Final fusion decision: the one place where all accumulated evidence
    /// is judged, so the verdict is auditable via the notes trail.
    async fn final_decision(&self, item: &EvidenceItem, record: &VerificationRecord) -> Verdict {
        let prompt = format!(
            "Item: {}\nVerification results: {}",
            serde_json::to_string_pretty(item).unwrap_or_else(|_| item.id.clone()),
            serde_json::to_string_pretty(record).unwrap_or_default(),
        );

        match self.agent.complete(vec![ChatMessage::user(prompt)]).await {
            Ok(decision_text) => parse_verdict(&decision_text),
            Err(e) => {
                // A failed completion is fatal to this item's decision step
                // and forces the conservative reject outcome.
                warn!(item_id = %item.id, error = %e, "Fusion decision failed; rejecting item");
                Verdict::rejected()
            }
        }
    }

    async fn invoke_typed<T: serde::de::DeserializeOwned>(
        &self,
        name: &str,
        args: serde_json::Value,
    ) -> Result<T> {
        let value = self.agent.invoke_capability(name, args).await?;
        serde_json::from_value(value)
            .map_err(|e| LanternError::Capability(format!("Malformed {name} result: {e}")))
    }
}

#[async_trait]
impl Verify for VerifierAgent {
    async fn verify(&self, query: &str, items: Vec<EvidenceItem>) -> Result<Vec<EvidenceItem>> {
        info!(item_count = items.len(), "Verifying collected evidence");

        let mut verified = Vec::new();

        for mut item in items {
            match self.verify_item(&mut item).await {
                Ok(true) => verified.push(item),
                Ok(false) => debug!(item_id = %item.id, "Item rejected"),
                // A fault anywhere in the per-item pipeline aborts only
                // that item; the stage processes the rest regardless.
                Err(e) => warn!(item_id = %item.id, error = %e, "Item verification faulted"),
            }
        }

        self.agent.record(json!({
            "query": query,
            "verified": verified.len(),
            "timestamp": Utc::now().to_rfc3339(),
        }));

        info!(verified = verified.len(), "Verification finished");
        Ok(verified)
    }
}
