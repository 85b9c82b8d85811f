//! Collector agent: gathers candidate evidence from search capabilities.

use crate::agent::Agent;
use crate::decision::parse_search_terms;
use crate::registry::Capability;
use crate::tools::media::{download_media_capability, extract_metadata_capability};
use crate::tools::names;
use crate::tools::search::{
    SocialPost, WebSearchHit, social_media_search_capability, web_search_capability,
};
use async_trait::async_trait;
use chrono::Utc;
use futures::future::join_all;
use lantern_common::{Collect, EvidenceItem, MediaReference, Result, SourceKind};
use lantern_llm::{ChatMessage, CompletionClient};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

const COLLECTOR_PROMPT: &str = "\
You are a Collector Agent in an OSINT system. Based on the user query, \
generate 3-5 specific search terms that would help gather relevant \
information. Focus on finding evidence related to the query: news articles \
from reputable sources, social media posts with photos or videos, and \
official statements. List one term per line, prefixed with a dash.";

/// Collects evidence items for a query from web and social-media search,
/// downloading and annotating any referenced media along the way.
pub struct CollectorAgent {
    agent: Agent,
    max_results: usize,
}

impl CollectorAgent {
    /// A collector with an empty registry; callers register the search and
    /// media capabilities themselves.
    pub fn new(client: Arc<dyn CompletionClient>, max_results: usize) -> Self {
        Self {
            agent: Agent::new("collector", COLLECTOR_PROMPT, client),
            max_results,
        }
    }

    /// A collector wired with the default capability set.
    pub fn with_default_capabilities(
        client: Arc<dyn CompletionClient>,
        media_dir: PathBuf,
        max_results: usize,
    ) -> Result<Self> {
        let mut collector = Self::new(client, max_results);
        collector.register_capability(Arc::new(web_search_capability()))?;
        collector.register_capability(Arc::new(social_media_search_capability()))?;
        collector.register_capability(Arc::new(download_media_capability(media_dir)))?;
        collector.register_capability(Arc::new(extract_metadata_capability()))?;
        Ok(collector)
    }

    pub fn register_capability(&mut self, capability: Arc<dyn Capability>) -> Result<()> {
        self.agent.register_capability(capability)
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    /// Ask the model for search terms. Collection never short-circuits on
    /// empty extraction: zero parsed terms, or a failed completion, falls
    /// back to the query itself as the sole term.
    async fn propose_search_terms(&self, query: &str) -> Vec<String> {
        let messages = vec![ChatMessage::user(format!(
            "User Query: {query}\n\nGenerate search terms:"
        ))];

        match self.agent.complete(messages).await {
            Ok(response) => {
                let terms = parse_search_terms(&response);
                if terms.is_empty() {
                    debug!("No list-formatted terms in response; using the query itself");
                    vec![query.to_string()]
                } else {
                    terms
                }
            }
            Err(e) => {
                warn!(error = %e, "Search-term proposal failed; using the query itself");
                vec![query.to_string()]
            }
        }
    }

    /// One web-search round. A failure here never aborts sibling rounds;
    /// it is logged and yields no hits.
    async fn web_round(&self, term: &str) -> Vec<WebSearchHit> {
        let args = json!({ "query": term, "max_results": self.max_results });
        match self.agent.invoke_capability(names::WEB_SEARCH, args).await {
            Ok(value) => match serde_json::from_value(value) {
                Ok(hits) => hits,
                Err(e) => {
                    warn!(term, error = %e, "Web search returned malformed hits");
                    Vec::new()
                }
            },
            Err(e) => {
                warn!(term, error = %e, "Web search round failed");
                Vec::new()
            }
        }
    }

    /// One social-media round, resolving media for each post concurrently.
    async fn social_round(&self, term: &str) -> Vec<(SocialPost, Option<MediaReference>)> {
        let args = json!({ "query": term, "max_results": self.max_results });
        let posts: Vec<SocialPost> = match self
            .agent
            .invoke_capability(names::SOCIAL_MEDIA_SEARCH, args)
            .await
        {
            Ok(value) => match serde_json::from_value(value) {
                Ok(posts) => posts,
                Err(e) => {
                    warn!(term, error = %e, "Social search returned malformed posts");
                    return Vec::new();
                }
            },
            Err(e) => {
                warn!(term, error = %e, "Social search round failed");
                return Vec::new();
            }
        };

        join_all(posts.into_iter().map(|post| async move {
            let media = match post.media_url.as_deref() {
                Some(url) => self.resolve_media(url).await,
                None => None,
            };
            (post, media)
        }))
        .await
    }

    /// Download a post's media and extract its metadata. A failure in
    /// either step keeps the item, without a media reference.
    async fn resolve_media(&self, url: &str) -> Option<MediaReference> {
        let path = match self
            .agent
            .invoke_capability(names::DOWNLOAD_MEDIA, json!({ "url": url }))
            .await
        {
            Ok(value) => match value.as_str() {
                Some(path) => path.to_string(),
                None => {
                    warn!(url, "Media download returned no path; keeping item without media");
                    return None;
                }
            },
            Err(e) => {
                warn!(url, error = %e, "Media download failed; keeping item without media");
                return None;
            }
        };

        let metadata = match self
            .agent
            .invoke_capability(names::EXTRACT_METADATA, json!({ "file_path": path }))
            .await
        {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!(url, error = %e, "Metadata extraction failed; keeping item without media");
                return None;
            }
        };

        Some(MediaReference {
            url: url.to_string(),
            local_path: path,
            metadata,
        })
    }
}

fn timestamp_or_now(reported: &str) -> String {
    if reported.is_empty() {
        Utc::now().to_rfc3339()
    } else {
        reported.to_string()
    }
}

#[async_trait]
impl Collect for CollectorAgent {
    async fn collect(&self, query: &str) -> Result<Vec<EvidenceItem>> {
        let terms = self.propose_search_terms(query).await;
        info!(term_count = terms.len(), terms = ?terms, "Collecting evidence");

        // Independent rounds fan out concurrently; join_all keeps term
        // order so output is deterministic for identical tool results.
        let (web_rounds, social_rounds) = tokio::join!(
            join_all(terms.iter().map(|term| self.web_round(term))),
            join_all(terms.iter().map(|term| self.social_round(term))),
        );

        let mut items = Vec::new();

        for (term, hits) in terms.iter().zip(web_rounds) {
            for hit in hits {
                let mut item = EvidenceItem::new(
                    format!("web_{}", items.len()),
                    SourceKind::Web,
                    hit.source,
                    hit.url,
                    hit.snippet,
                    timestamp_or_now(&hit.date),
                    term.as_str(),
                );
                item.title = Some(hit.title);
                items.push(item);
            }
        }

        for (term, posts) in terms.iter().zip(social_rounds) {
            for (post, media) in posts {
                let mut item = EvidenceItem::new(
                    format!("social_{}", items.len()),
                    SourceKind::SocialMedia,
                    post.platform,
                    post.url,
                    post.text,
                    timestamp_or_now(&post.date),
                    term.as_str(),
                );
                item.media = media;
                item.metadata.insert("user".into(), json!(post.user));
                item.metadata.insert("likes".into(), json!(post.likes));
                item.metadata.insert("shares".into(), json!(post.shares));
                item.metadata.insert("comments".into(), json!(post.comments));
                items.push(item);
            }
        }

        self.agent.record(json!({
            "query": query,
            "search_terms": terms,
            "collected": items.len(),
            "timestamp": Utc::now().to_rfc3339(),
        }));

        info!(collected = items.len(), "Collection finished");
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::FnCapability;
    use async_trait::async_trait;
    use lantern_common::LanternError;
    use lantern_llm::{CompletionRequest, CompletionResponse};

    struct ScriptedClient {
        response: Result<&'static str>,
    }

    impl ScriptedClient {
        fn ok(text: &'static str) -> Arc<Self> {
            Arc::new(Self { response: Ok(text) })
        }
        fn failing() -> Arc<Self> {
            Arc::new(Self {
                response: Err(LanternError::Completion("provider down".into())),
            })
        }
    }

    #[async_trait]
    impl CompletionClient for ScriptedClient {
        async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse> {
            match &self.response {
                Ok(text) => Ok(CompletionResponse {
                    content: text.to_string(),
                    model: "scripted".to_string(),
                    usage: None,
                    finish_reason: None,
                }),
                Err(e) => Err(LanternError::Completion(e.to_string())),
            }
        }
        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    fn empty_search_capabilities(collector: &mut CollectorAgent) {
        collector
            .register_capability(Arc::new(FnCapability::from_sync(names::WEB_SEARCH, |_| {
                Ok(json!([]))
            })))
            .unwrap();
        collector
            .register_capability(Arc::new(FnCapability::from_sync(
                names::SOCIAL_MEDIA_SEARCH,
                |_| Ok(json!([])),
            )))
            .unwrap();
    }

    #[tokio::test]
    async fn unparsed_terms_fall_back_to_query() {
        let client = ScriptedClient::ok("I would look into local news and city records.");
        let collector = CollectorAgent::new(client, 5);

        let terms = collector.propose_search_terms("bridge collapse city X").await;
        assert_eq!(terms, vec!["bridge collapse city X"]);
    }

    #[tokio::test]
    async fn completion_failure_falls_back_to_query() {
        let collector = CollectorAgent::new(ScriptedClient::failing(), 5);
        let terms = collector.propose_search_terms("bridge collapse city X").await;
        assert_eq!(terms, vec!["bridge collapse city X"]);
    }

    #[tokio::test]
    async fn ids_are_sequential_web_before_social() {
        let client = ScriptedClient::ok("- term one\n- term two");
        let mut collector = CollectorAgent::new(client, 5);

        collector
            .register_capability(Arc::new(FnCapability::from_sync(names::WEB_SEARCH, |args| {
                let term = args["query"].as_str().unwrap_or("").to_string();
                Ok(json!([{
                    "title": format!("hit for {term}"),
                    "url": "https://example.com/a",
                    "snippet": "snippet",
                    "source": "Example News Source",
                    "date": "2026-07-01",
                }]))
            })))
            .unwrap();
        collector
            .register_capability(Arc::new(FnCapability::from_sync(
                names::SOCIAL_MEDIA_SEARCH,
                |_| {
                    Ok(json!([{
                        "platform": "twitter",
                        "user": "user_0",
                        "url": "https://twitter.com/status/1",
                        "text": "post",
                        "date": "2026-07-01",
                        "likes": 3,
                        "shares": 1,
                        "comments": 0,
                    }]))
                },
            )))
            .unwrap();

        let items = collector.collect("query").await.unwrap();

        // Two terms: one web hit each, then one social post each.
        assert_eq!(items.len(), 4);
        assert_eq!(items[0].id, "web_0");
        assert_eq!(items[1].id, "web_1");
        assert_eq!(items[2].id, "social_2");
        assert_eq!(items[3].id, "social_3");
        assert_eq!(items[0].search_term, "term one");
        assert_eq!(items[1].search_term, "term two");
        assert_eq!(items[2].source_kind, SourceKind::SocialMedia);
        assert_eq!(items[2].metadata["likes"], json!(3));
    }

    #[tokio::test]
    async fn failing_round_does_not_abort_other_terms() {
        let client = ScriptedClient::ok("- good term\n- bad term");
        let mut collector = CollectorAgent::new(client, 5);

        collector
            .register_capability(Arc::new(FnCapability::from_sync(names::WEB_SEARCH, |args| {
                if args["query"] == "bad term" {
                    Err(LanternError::Capability("search backend down".into()))
                } else {
                    Ok(json!([{
                        "title": "t",
                        "url": "https://example.com",
                        "snippet": "s",
                        "source": "Example News Source",
                        "date": "2026-07-01",
                    }]))
                }
            })))
            .unwrap();
        collector
            .register_capability(Arc::new(FnCapability::from_sync(
                names::SOCIAL_MEDIA_SEARCH,
                |_| Ok(json!([])),
            )))
            .unwrap();

        let items = collector.collect("query").await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].search_term, "good term");
    }

    #[tokio::test]
    async fn media_failure_keeps_item_without_reference() {
        let client = ScriptedClient::ok("- only term");
        let mut collector = CollectorAgent::new(client, 5);

        collector
            .register_capability(Arc::new(FnCapability::from_sync(names::WEB_SEARCH, |_| {
                Ok(json!([]))
            })))
            .unwrap();
        collector
            .register_capability(Arc::new(FnCapability::from_sync(
                names::SOCIAL_MEDIA_SEARCH,
                |_| {
                    Ok(json!([{
                        "platform": "twitter",
                        "user": "user_0",
                        "url": "https://twitter.com/status/1",
                        "text": "post with media",
                        "date": "2026-07-01",
                        "media_url": "https://twitter.com/media/0.jpg",
                    }]))
                },
            )))
            .unwrap();
        collector
            .register_capability(Arc::new(FnCapability::from_sync(names::DOWNLOAD_MEDIA, |_| {
                Err(LanternError::Capability("fetch refused".into()))
            })))
            .unwrap();
        collector
            .register_capability(Arc::new(FnCapability::from_sync(
                names::EXTRACT_METADATA,
                |_| Ok(json!({})),
            )))
            .unwrap();

        let items = collector.collect("query").await.unwrap();
        assert_eq!(items.len(), 1);
        assert!(items[0].media.is_none());
    }

    #[tokio::test]
    async fn collection_records_memory() {
        let client = ScriptedClient::ok("no markers here");
        let mut collector = CollectorAgent::new(client, 5);
        empty_search_capabilities(&mut collector);

        collector.collect("bridge collapse city X").await.unwrap();

        let history = collector.agent().history();
        assert_eq!(history.len(), 1);
        assert_eq!(
            history[0]["search_terms"],
            json!(["bridge collapse city X"])
        );
    }
}
