//! Reporter agent: synthesizes a cited narrative report from verified
//! evidence.

use crate::agent::Agent;
use async_trait::async_trait;
use chrono::Utc;
use lantern_common::{EvidenceItem, Report, Result, SourceKind};
use lantern_llm::{ChatMessage, CompletionClient};
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

const REPORTER_PROMPT: &str = "\
You are a Report Writer Agent in an OSINT system. Create a comprehensive, \
objective report based on verified data.

Format the report in Markdown with the following sections:
1. Summary - a brief overview of findings
2. Background - context and explanation of the topic
3. Findings - detailed presentation of the evidence
4. Analysis - interpretation of the evidence and patterns
5. Conclusion - summary of key insights
6. Sources - formatted citations for all sources

Present the facts objectively. Cite sources inline using [ID] notation and \
resolve them in the Sources section. When discussing evidence, note the \
verification methods and confidence levels.";

#[derive(Debug, Clone, Serialize)]
struct Citation {
    id: String,
    title: String,
    url: String,
    source_name: String,
    date: String,
}

/// Generates the draft report. Narrative generation failures fall back to
/// a deterministic citation-list report rather than failing the stage.
pub struct ReporterAgent {
    agent: Agent,
}

impl ReporterAgent {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self {
            agent: Agent::new("reporter", REPORTER_PROMPT, client),
        }
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    fn citation_for(item: &EvidenceItem) -> Citation {
        let title = item.title.clone().unwrap_or_else(|| {
            let mut short: String = item.content.chars().take(50).collect();
            if item.content.chars().count() > 50 {
                short.push_str("...");
            }
            short
        });

        Citation {
            id: item.id.clone(),
            title,
            url: item.url.clone(),
            source_name: item.source_name.clone(),
            date: item.claimed_date().unwrap_or("").to_string(),
        }
    }

    /// Minimal report assembled without the model, used when narrative
    /// generation is unavailable.
    fn fallback_report(query: &str, citations: &[Citation]) -> String {
        let mut report = format!(
            "# OSINT Report: {query}\n\n## Summary\n\nNarrative generation was \
             unavailable for this run; the verified evidence is listed below.\n\n## Sources\n\n"
        );
        for citation in citations {
            report.push_str(&format!(
                "- [{}] {} — {} ({})\n",
                citation.id, citation.title, citation.source_name, citation.url
            ));
        }
        report
    }

    /// Ensure each verified item with media gets an embed marker near its
    /// first citation mention. Best-effort textual splicing: when the id is
    /// never cited, or no paragraph break follows the mention, the media is
    /// silently not embedded.
    fn splice_media_embeds(mut report: String, items: &[EvidenceItem]) -> String {
        for item in items {
            let media = match &item.media {
                Some(media) => media,
                None => continue,
            };

            let marker = format!("\n\n![Media from {}]({})\n", item.id, media.local_path);
            if report.contains(&marker) {
                continue;
            }

            let mention = format!("[{}]", item.id);
            let Some(mention_at) = report.find(&mention) else {
                continue;
            };

            let after_mention = mention_at + mention.len();
            if let Some(paragraph_end) = report[after_mention..].find("\n\n") {
                report.insert_str(after_mention + paragraph_end, &marker);
            }
        }
        report
    }
}

#[async_trait]
impl Report for ReporterAgent {
    async fn generate_report(&self, query: &str, items: &[EvidenceItem]) -> Result<String> {
        info!(verified = items.len(), "Generating report");

        let mut categories: BTreeMap<&'static str, usize> = BTreeMap::new();
        for item in items {
            *categories.entry(item.source_kind.as_str()).or_insert(0) += 1;
        }

        let citations: Vec<Citation> = items.iter().map(Self::citation_for).collect();
        let has_media = items.iter().any(|item| item.media.is_some());

        let data_summary = json!({
            "query": query,
            "categories": categories,
            "source_count": citations.len(),
            "sources": &citations,
            "verified_data_sample": &items[..items.len().min(3)],
            "has_media": has_media,
        });

        let messages = vec![ChatMessage::user(format!(
            "User Query: {query}\n\nData Summary: {}\n\nGenerate a complete OSINT report:",
            serde_json::to_string_pretty(&data_summary)?
        ))];

        let report = match self.agent.complete(messages).await {
            Ok(narrative) if !narrative.trim().is_empty() => narrative,
            Ok(_) => {
                warn!("Narrative generation returned empty text; using fallback report");
                Self::fallback_report(query, &citations)
            }
            Err(e) => {
                warn!(error = %e, "Narrative generation failed; using fallback report");
                Self::fallback_report(query, &citations)
            }
        };

        let report = Self::splice_media_embeds(report, items);

        self.agent.record(json!({
            "query": query,
            "sources_used": citations.len(),
            "report_chars": report.len(),
            "timestamp": Utc::now().to_rfc3339(),
        }));

        Ok(report)
    }
}
