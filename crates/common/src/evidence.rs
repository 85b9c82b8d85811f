//! Evidence types produced by the Collector and annotated by the Verifier.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Where a unit of evidence was collected from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Web,
    SocialMedia,
    Other,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Web => "web",
            SourceKind::SocialMedia => "social_media",
            SourceKind::Other => "other",
        }
    }
}

/// Opaque handle to a downloaded media file and its extracted metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaReference {
    /// The URL the media was fetched from.
    pub url: String,

    /// Local path of the downloaded file.
    pub local_path: String,

    /// Metadata extracted from the file, shape depends on the media type.
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// One unit of collected OSINT material.
///
/// Created by the Collector and immutable afterwards, except for the
/// verifier-added fields `verified_location` and `verification`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceItem {
    /// Unique within a run, e.g. `web_3` or `social_7`.
    pub id: String,

    pub source_kind: SourceKind,

    /// Human-readable source (outlet name, platform, ...).
    pub source_name: String,

    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Text snippet of the collected material.
    pub content: String,

    /// ISO-8601, best effort. Left as reported by the source.
    pub timestamp: String,

    /// The search term that surfaced this item.
    pub search_term: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<MediaReference>,

    /// Location attached by the Verifier's geolocation check.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified_location: Option<String>,

    /// Open map for source-specific fields (engagement counts, ...).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification: Option<VerificationRecord>,
}

impl EvidenceItem {
    pub fn new(
        id: impl Into<String>,
        source_kind: SourceKind,
        source_name: impl Into<String>,
        url: impl Into<String>,
        content: impl Into<String>,
        timestamp: impl Into<String>,
        search_term: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source_kind,
            source_name: source_name.into(),
            url: url.into(),
            title: None,
            content: content.into(),
            timestamp: timestamp.into(),
            search_term: search_term.into(),
            media: None,
            verified_location: None,
            metadata: HashMap::new(),
            verification: None,
        }
    }

    /// Date portion of the claimed timestamp (`YYYY-MM-DD`), if any.
    pub fn claimed_date(&self) -> Option<&str> {
        if self.timestamp.is_empty() {
            return None;
        }
        Some(self.timestamp.split('T').next().unwrap_or(&self.timestamp))
    }
}

/// The verdict attached to an item by the Verifier.
///
/// Every verification method that ran appended exactly one entry to
/// `methods`; `confidence` is only meaningful once the source-reliability
/// check has run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerificationRecord {
    pub verified: bool,
    pub confidence: f64,
    pub methods: Vec<String>,
    pub notes: Vec<String>,
}

impl VerificationRecord {
    pub fn method(&mut self, name: impl Into<String>) {
        self.methods.push(name.into());
    }

    pub fn note(&mut self, text: impl Into<String>) {
        self.notes.push(text.into());
    }
}
