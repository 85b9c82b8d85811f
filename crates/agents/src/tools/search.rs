//! Simulated web and social-media search backends.

use crate::registry::FnCapability;
use crate::tools::names;
use chrono::Utc;
use lantern_common::{LanternError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// One hit from the web-search capability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
    pub source: String,
    pub date: String,
}

/// One post from the social-media-search capability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialPost {
    pub platform: String,
    pub user: String,
    pub url: String,
    pub text: String,
    pub date: String,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub shares: u64,
    #[serde(default)]
    pub comments: u64,
}

#[derive(Deserialize)]
struct SearchArgs {
    query: String,
    #[serde(default = "default_max_results")]
    max_results: usize,
}

fn default_max_results() -> usize {
    10
}

fn parse_args(args: Value) -> Result<SearchArgs> {
    serde_json::from_value(args)
        .map_err(|e| LanternError::Capability(format!("Invalid search arguments: {e}")))
}

/// Simulated web search: a handful of hits from a generic news source.
/// A real deployment registers a search-API backend under the same name.
pub fn web_search_capability() -> FnCapability {
    FnCapability::from_async(names::WEB_SEARCH, |args| async move {
        let args = parse_args(args)?;
        let today = Utc::now().format("%Y-%m-%d").to_string();

        let hits: Vec<WebSearchHit> = (0..args.max_results.min(5))
            .map(|i| WebSearchHit {
                title: format!("Result {} for '{}'", i + 1, args.query),
                url: format!(
                    "https://example.com/search?q={}&result={}",
                    args.query.replace(' ', "+"),
                    i
                ),
                snippet: format!(
                    "This is a snippet of content related to {}. It would contain \
                     relevant information from the web page.",
                    args.query
                ),
                source: "Example News Source".to_string(),
                date: today.clone(),
            })
            .collect();

        Ok(serde_json::to_value(hits)?)
    })
}

/// Simulated social-media search across twitter and reddit; every other
/// post carries a media URL.
pub fn social_media_search_capability() -> FnCapability {
    FnCapability::from_async(names::SOCIAL_MEDIA_SEARCH, |args| async move {
        let args = parse_args(args)?;
        let today = Utc::now().format("%Y-%m-%d").to_string();
        let platforms = ["twitter", "reddit"];
        let per_platform = (args.max_results / platforms.len()).min(3).max(1);

        let mut posts = Vec::new();
        for platform in platforms {
            for i in 0..per_platform {
                let has_media = i % 2 == 0;
                posts.push(SocialPost {
                    platform: platform.to_string(),
                    user: format!("user_{}_{}", platform, i),
                    url: format!(
                        "https://{}.com/status/{}_{}",
                        platform,
                        i,
                        args.query.replace(' ', "")
                    ),
                    text: format!("This is a {} post about {}.", platform, args.query),
                    date: today.clone(),
                    media_url: has_media
                        .then(|| format!("https://{}.com/media/{}.jpg", platform, i)),
                    likes: (i as u64) * 10,
                    shares: (i as u64) * 5,
                    comments: (i as u64) * 3,
                });
            }
        }

        Ok(serde_json::to_value(posts)?)
    })
}

/// Convenience for tests and wiring code.
pub fn search_args(query: &str, max_results: usize) -> Value {
    json!({ "query": query, "max_results": max_results })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Capability;

    #[tokio::test]
    async fn web_search_produces_hits_for_query() {
        let capability = web_search_capability();
        let value = capability
            .invoke(search_args("bridge collapse", 5))
            .await
            .unwrap();
        let hits: Vec<WebSearchHit> = serde_json::from_value(value).unwrap();

        assert_eq!(hits.len(), 5);
        assert!(hits[0].title.contains("bridge collapse"));
        assert!(hits[0].url.starts_with("https://"));
    }

    #[tokio::test]
    async fn social_search_alternates_media() {
        let capability = social_media_search_capability();
        let value = capability
            .invoke(search_args("protest footage", 6))
            .await
            .unwrap();
        let posts: Vec<SocialPost> = serde_json::from_value(value).unwrap();

        assert_eq!(posts.len(), 6);
        assert!(posts.iter().any(|p| p.media_url.is_some()));
        assert!(posts.iter().any(|p| p.media_url.is_none()));
        assert!(posts.iter().any(|p| p.platform == "reddit"));
    }

    #[tokio::test]
    async fn malformed_args_fail_as_capability_error() {
        let capability = web_search_capability();
        let err = capability.invoke(json!({"max_results": 3})).await.unwrap_err();
        assert!(matches!(err, LanternError::Capability(_)));
    }
}
