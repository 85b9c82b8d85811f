//! Verification capabilities: source reliability, metadata consistency,
//! and simulated imagery analysis backends.

use crate::registry::FnCapability;
use crate::tools::{names, pseudo_hash};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use lantern_common::{EvidenceItem, LanternError};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Source reliability
// ---------------------------------------------------------------------------

const RELIABLE_SOURCES: &[&str] = &[
    "BBC",
    "Reuters",
    "Associated Press",
    "Al Jazeera",
    "The Guardian",
    "CNN",
    "Human Rights Watch",
    "Amnesty International",
    "New York Times",
];

const UNRELIABLE_SOURCES: &[&str] = &[
    "FakeNewsDaily",
    "ConspiracyTruth",
    "PropagandaNet",
    "StateMediaChannel",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reliability {
    Reliable,
    Unreliable,
    Unknown,
}

impl std::fmt::Display for Reliability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Reliability::Reliable => "reliable",
            Reliability::Unreliable => "unreliable",
            Reliability::Unknown => "unknown",
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReliabilityReport {
    pub source_name: String,
    pub url: String,
    pub reliability: Reliability,
    pub score: f64,
}

#[derive(Deserialize)]
struct ReliabilityArgs {
    source_name: String,
    #[serde(default)]
    url: String,
}

/// Classify a source against the known reliable/unreliable lists.
/// Unmatched sources are `unknown` with a neutral score.
pub fn source_reliability_capability() -> FnCapability {
    FnCapability::from_sync(names::CHECK_SOURCE_RELIABILITY, |args| {
        let args: ReliabilityArgs = serde_json::from_value(args)
            .map_err(|e| LanternError::Capability(format!("Invalid reliability arguments: {e}")))?;

        let source_lower = args.source_name.to_lowercase();

        let (reliability, score) = if RELIABLE_SOURCES
            .iter()
            .any(|s| source_lower.contains(&s.to_lowercase()))
        {
            (Reliability::Reliable, 0.9)
        } else if UNRELIABLE_SOURCES
            .iter()
            .any(|s| source_lower.contains(&s.to_lowercase()))
        {
            (Reliability::Unreliable, 0.1)
        } else {
            (Reliability::Unknown, 0.5)
        };

        let report = ReliabilityReport {
            source_name: args.source_name,
            url: args.url,
            reliability,
            score,
        };

        Ok(serde_json::to_value(report)?)
    })
}

// ---------------------------------------------------------------------------
// Metadata consistency
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckResult {
    Pass,
    Warning,
    Fail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsistencyCheck {
    pub check: String,
    pub result: CheckResult,
    pub details: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Consistency {
    Consistent,
    PartiallyConsistent,
    Inconsistent,
}

impl std::fmt::Display for Consistency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Consistency::Consistent => "consistent",
            Consistency::PartiallyConsistent => "partially_consistent",
            Consistency::Inconsistent => "inconsistent",
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsistencyReport {
    pub item_id: String,
    pub checks: Vec<ConsistencyCheck>,
    pub result: Consistency,
    pub confidence: f64,
}

/// Best-effort parse of the loosely ISO-8601 timestamps sources report.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|naive| Utc.from_utc_datetime(&naive));
    }
    None
}

/// Internal consistency checks over an evidence item's own metadata.
///
/// Aggregate rule: any fail makes the item `inconsistent` (confidence 0.3),
/// else any warning makes it `partially_consistent` (0.7), else
/// `consistent` (0.9). The outcome is advisory input to the fusion
/// decision, not an automatic gate.
pub fn check_metadata_consistency(item: &EvidenceItem) -> ConsistencyReport {
    let mut checks = Vec::new();
    let now = Utc::now();

    if !item.timestamp.is_empty() {
        match parse_timestamp(&item.timestamp) {
            Some(claimed) => {
                if claimed > now {
                    checks.push(ConsistencyCheck {
                        check: "timestamp_future".into(),
                        result: CheckResult::Fail,
                        details: format!("Timestamp {} is in the future", item.timestamp),
                    });
                } else if now - claimed > Duration::days(365) {
                    checks.push(ConsistencyCheck {
                        check: "timestamp_old".into(),
                        result: CheckResult::Warning,
                        details: format!("Timestamp {} is more than a year old", item.timestamp),
                    });
                } else {
                    checks.push(ConsistencyCheck {
                        check: "timestamp_range".into(),
                        result: CheckResult::Pass,
                        details: "Timestamp is within a reasonable range".into(),
                    });
                }
            }
            None => checks.push(ConsistencyCheck {
                check: "timestamp_format".into(),
                result: CheckResult::Fail,
                details: format!("Invalid timestamp format: {}", item.timestamp),
            }),
        }
    }

    if !item.url.is_empty() {
        let well_formed = item.url.starts_with("http://") || item.url.starts_with("https://");
        checks.push(ConsistencyCheck {
            check: "url_format".into(),
            result: if well_formed { CheckResult::Pass } else { CheckResult::Fail },
            details: if well_formed {
                "URL format is valid".into()
            } else {
                format!("Invalid URL format: {}", item.url)
            },
        });
    }

    if let Some(ref media) = item.media {
        let well_formed = media.metadata.is_object() && !media.metadata.as_object().unwrap().is_empty();
        checks.push(ConsistencyCheck {
            check: "media_metadata".into(),
            result: if well_formed { CheckResult::Pass } else { CheckResult::Fail },
            details: if well_formed {
                "Media metadata is present and well-formed".into()
            } else {
                "Media reference lacks extracted metadata".into()
            },
        });
    }

    let fails = checks.iter().filter(|c| c.result == CheckResult::Fail).count();
    let warnings = checks.iter().filter(|c| c.result == CheckResult::Warning).count();

    let (result, confidence) = if fails > 0 {
        (Consistency::Inconsistent, 0.3)
    } else if warnings > 0 {
        (Consistency::PartiallyConsistent, 0.7)
    } else {
        (Consistency::Consistent, 0.9)
    };

    ConsistencyReport {
        item_id: item.id.clone(),
        checks,
        result,
        confidence,
    }
}

pub fn metadata_consistency_capability() -> FnCapability {
    FnCapability::from_sync(names::CHECK_METADATA_CONSISTENCY, |args| {
        let item: EvidenceItem = serde_json::from_value(args)
            .map_err(|e| LanternError::Capability(format!("Invalid consistency arguments: {e}")))?;
        Ok(serde_json::to_value(check_metadata_consistency(&item))?)
    })
}

// ---------------------------------------------------------------------------
// Simulated imagery backends
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReverseMatch {
    pub url: String,
    pub source: String,
    pub date: String,
    pub similarity: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReverseSearchReport {
    pub matches: Vec<ReverseMatch>,
    pub match_found: bool,
}

#[derive(Deserialize)]
struct ImageArgs {
    image_path: String,
}

/// Simulated reverse image search. Whether matches exist, and their dates,
/// are keyed off the file path so behavior is stable per item.
pub fn reverse_image_search_capability() -> FnCapability {
    FnCapability::from_sync(names::REVERSE_IMAGE_SEARCH, |args| {
        let args: ImageArgs = serde_json::from_value(args)
            .map_err(|e| LanternError::Capability(format!("Invalid image arguments: {e}")))?;

        let hash = pseudo_hash(&args.image_path);
        let has_matches = hash % 3 != 0;

        let matches: Vec<ReverseMatch> = if has_matches {
            (1..=3)
                .map(|i| ReverseMatch {
                    url: format!("https://example.com/image_{i}"),
                    source: format!("Example Source {i}"),
                    date: (Utc::now() - Duration::days(i * 5))
                        .format("%Y-%m-%d")
                        .to_string(),
                    similarity: 0.9 - (i as f64) * 0.1,
                })
                .collect()
        } else {
            Vec::new()
        };

        let report = ReverseSearchReport {
            match_found: !matches.is_empty(),
            matches,
        };
        Ok(serde_json::to_value(report)?)
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeolocationReport {
    pub location: Option<String>,
    pub coordinates: Option<String>,
    pub confidence: f64,
    #[serde(default)]
    pub method: Option<String>,
}

const MOCK_LOCATIONS: &[(&str, &str)] = &[
    ("Gaza City, Palestine", "31.5018 N, 34.4750 E"),
    ("Beirut, Lebanon", "33.8938 N, 35.5018 E"),
    ("Kyiv, Ukraine", "50.4501 N, 30.5234 E"),
    ("Khartoum, Sudan", "15.5007 N, 32.5599 E"),
    ("Rakhine State, Myanmar", "20.1000 N, 93.5000 E"),
];

/// Simulated geolocation from visual features.
pub fn geolocate_media_capability() -> FnCapability {
    FnCapability::from_sync(names::GEOLOCATE_MEDIA, |args| {
        let args: ImageArgs = serde_json::from_value(args)
            .map_err(|e| LanternError::Capability(format!("Invalid image arguments: {e}")))?;

        let hash = pseudo_hash(&args.image_path);
        let report = if hash % 2 == 1 {
            let (name, coords) = MOCK_LOCATIONS[(hash as usize) % MOCK_LOCATIONS.len()];
            GeolocationReport {
                location: Some(name.to_string()),
                coordinates: Some(coords.to_string()),
                confidence: 0.7 + ((hash % 10) as f64) / 40.0,
                method: Some("visual_matching".to_string()),
            }
        } else {
            GeolocationReport {
                location: None,
                coordinates: None,
                confidence: 0.0,
                method: None,
            }
        };

        Ok(serde_json::to_value(report)?)
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShadowReport {
    /// None when the check could not run for lack of reference data.
    pub consistent: Option<bool>,
    #[serde(default)]
    pub estimated_time: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

#[derive(Deserialize)]
struct ShadowArgs {
    image_path: String,
    #[serde(default)]
    claimed_location: Option<String>,
    #[serde(default)]
    claimed_time: Option<String>,
}

/// Simulated shadow/temporal consistency analysis. Requires both a claimed
/// location and a parseable claimed time; otherwise reports inconclusive.
pub fn analyze_shadows_capability() -> FnCapability {
    FnCapability::from_sync(names::ANALYZE_SHADOWS, |args| {
        let args: ShadowArgs = serde_json::from_value(args)
            .map_err(|e| LanternError::Capability(format!("Invalid shadow arguments: {e}")))?;

        let claimed_time = args
            .claimed_time
            .as_deref()
            .and_then(parse_timestamp);

        let report = match (args.claimed_location.as_deref(), claimed_time) {
            (Some(_), Some(time)) => {
                let hash = pseudo_hash(&args.image_path);
                if hash % 3 != 0 {
                    ShadowReport {
                        consistent: Some(true),
                        estimated_time: Some(time.to_rfc3339()),
                        confidence: Some(0.8 + ((hash % 9) as f64) / 50.0),
                    }
                } else {
                    ShadowReport {
                        consistent: Some(false),
                        estimated_time: Some((time + Duration::hours(4)).to_rfc3339()),
                        confidence: Some(0.6 + ((hash % 9) as f64) / 40.0),
                    }
                }
            }
            _ => ShadowReport {
                consistent: None,
                estimated_time: None,
                confidence: None,
            },
        };

        Ok(serde_json::to_value(report)?)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Capability;
    use lantern_common::{MediaReference, SourceKind};
    use serde_json::json;

    fn item(timestamp: &str, url: &str) -> EvidenceItem {
        EvidenceItem::new(
            "web_0",
            SourceKind::Web,
            "Example News Source",
            url,
            "snippet",
            timestamp,
            "query",
        )
    }

    #[tokio::test]
    async fn known_unreliable_source_is_flagged() {
        let capability = source_reliability_capability();
        let value = capability
            .invoke(json!({"source_name": "FakeNewsDaily", "url": "https://fnd.example"}))
            .await
            .unwrap();
        let report: ReliabilityReport = serde_json::from_value(value).unwrap();

        assert_eq!(report.reliability, Reliability::Unreliable);
        assert!(report.score < 0.5);
    }

    #[tokio::test]
    async fn known_reliable_source_matches_case_insensitively() {
        let capability = source_reliability_capability();
        let value = capability
            .invoke(json!({"source_name": "bbc world service"}))
            .await
            .unwrap();
        let report: ReliabilityReport = serde_json::from_value(value).unwrap();

        assert_eq!(report.reliability, Reliability::Reliable);
    }

    #[tokio::test]
    async fn unmatched_source_is_unknown() {
        let capability = source_reliability_capability();
        let value = capability
            .invoke(json!({"source_name": "Example News Source"}))
            .await
            .unwrap();
        let report: ReliabilityReport = serde_json::from_value(value).unwrap();

        assert_eq!(report.reliability, Reliability::Unknown);
        assert!((report.score - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn future_timestamp_is_inconsistent() {
        let future = (Utc::now() + Duration::days(30)).to_rfc3339();
        let report = check_metadata_consistency(&item(&future, "https://example.com/a"));

        assert_eq!(report.result, Consistency::Inconsistent);
        assert!((report.confidence - 0.3).abs() < f64::EPSILON);
        assert!(report.checks.iter().any(|c| c.check == "timestamp_future"));
    }

    #[test]
    fn old_timestamp_is_partially_consistent() {
        let old = (Utc::now() - Duration::days(400)).to_rfc3339();
        let report = check_metadata_consistency(&item(&old, "https://example.com/a"));

        assert_eq!(report.result, Consistency::PartiallyConsistent);
        assert!((report.confidence - 0.7).abs() < f64::EPSILON);
    }

    #[test]
    fn recent_item_with_valid_url_is_consistent() {
        let recent = (Utc::now() - Duration::days(2)).to_rfc3339();
        let report = check_metadata_consistency(&item(&recent, "https://example.com/a"));

        assert_eq!(report.result, Consistency::Consistent);
        assert!((report.confidence - 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn malformed_url_fails() {
        let recent = (Utc::now() - Duration::days(2)).to_rfc3339();
        let report = check_metadata_consistency(&item(&recent, "ftp://example.com/a"));

        assert_eq!(report.result, Consistency::Inconsistent);
        assert!(report.checks.iter().any(|c| c.check == "url_format"));
    }

    #[test]
    fn unparseable_timestamp_fails() {
        let report = check_metadata_consistency(&item("last tuesday", "https://example.com/a"));
        assert_eq!(report.result, Consistency::Inconsistent);
        assert!(report.checks.iter().any(|c| c.check == "timestamp_format"));
    }

    #[test]
    fn media_without_metadata_fails() {
        let recent = (Utc::now() - Duration::days(2)).to_rfc3339();
        let mut item = item(&recent, "https://example.com/a");
        item.media = Some(MediaReference {
            url: "https://example.com/1.jpg".into(),
            local_path: "/tmp/1.jpg".into(),
            metadata: serde_json::Value::Null,
        });

        let report = check_metadata_consistency(&item);
        assert_eq!(report.result, Consistency::Inconsistent);
        assert!(report.checks.iter().any(|c| c.check == "media_metadata"));
    }

    #[test]
    fn date_only_timestamps_parse() {
        assert!(parse_timestamp("2026-07-01").is_some());
        assert!(parse_timestamp("2026-07-01T12:00:00Z").is_some());
        assert!(parse_timestamp("2026-07-01T12:00:00").is_some());
        assert!(parse_timestamp("not a date").is_none());
    }

    #[tokio::test]
    async fn shadow_analysis_requires_both_references() {
        let capability = analyze_shadows_capability();
        let value = capability
            .invoke(json!({"image_path": "/tmp/a.jpg", "claimed_time": "2026-07-01T10:00:00Z"}))
            .await
            .unwrap();
        let report: ShadowReport = serde_json::from_value(value).unwrap();

        assert!(report.consistent.is_none());
        assert!(report.estimated_time.is_none());
    }

    #[tokio::test]
    async fn shadow_analysis_estimates_alternate_time_when_inconsistent() {
        let capability = analyze_shadows_capability();

        // Probe paths until the simulated backend reports an inconsistency.
        for i in 0..32 {
            let path = format!("/tmp/shadow_{i}.jpg");
            let value = capability
                .invoke(json!({
                    "image_path": path,
                    "claimed_location": "Kyiv, Ukraine",
                    "claimed_time": "2026-07-01T10:00:00Z",
                }))
                .await
                .unwrap();
            let report: ShadowReport = serde_json::from_value(value).unwrap();

            if report.consistent == Some(false) {
                let estimated = report.estimated_time.unwrap();
                assert!(estimated.starts_with("2026-07-01T14"));
                return;
            }
        }
        panic!("no inconsistent sample found in 32 probes");
    }

    #[tokio::test]
    async fn reverse_search_is_stable_per_path() {
        let capability = reverse_image_search_capability();
        let args = json!({"image_path": "/tmp/stable.jpg"});

        let first: ReverseSearchReport =
            serde_json::from_value(capability.invoke(args.clone()).await.unwrap()).unwrap();
        let second: ReverseSearchReport =
            serde_json::from_value(capability.invoke(args).await.unwrap()).unwrap();

        assert_eq!(first.match_found, second.match_found);
        assert_eq!(first.matches.len(), second.matches.len());
    }
}
