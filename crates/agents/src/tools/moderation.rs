//! Content-policy checking and anonymization.

use crate::registry::FnCapability;
use crate::tools::names;
use lantern_common::LanternError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::OnceLock;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyReport {
    pub violations: Vec<String>,
    pub categories: Vec<String>,
    pub violation_count: usize,
    pub has_violations: bool,
}

#[derive(Deserialize)]
struct TextArgs {
    text: String,
}

struct PolicyPattern {
    regex: Regex,
    category: &'static str,
    label: &'static str,
}

fn policy_patterns() -> &'static Vec<PolicyPattern> {
    static PATTERNS: OnceLock<Vec<PolicyPattern>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let table: &[(&str, &str, &str)] = &[
            (r"\b\d{3}[-.]?\d{3}[-.]?\d{4}\b", "pii", "Phone number"),
            (
                r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b",
                "pii",
                "Email address",
            ),
            (r"\b\d{3}-?\d{2}-?\d{4}\b", "pii", "Identity number"),
            (
                r"\b(?:decapitat|dismember|mutilat|charred body|severed head)\w*\b",
                "graphic_content",
                "Graphic content",
            ),
            (r"\bpassport number\b", "pii", "Personal identifier"),
            (r"\bidentity card\b", "pii", "Personal identifier"),
            (
                r"\bexact location of safehouse\b",
                "security_risk",
                "Security-sensitive information",
            ),
            (r"\bhiding place\b", "security_risk", "Security-sensitive information"),
            (
                r"\bwitness location\b",
                "security_risk",
                "Security-sensitive information",
            ),
        ];
        table.iter()
            .map(|(pattern, category, label)| PolicyPattern {
                regex: Regex::new(pattern).expect("static policy pattern"),
                category,
                label,
            })
            .collect()
    })
}

fn anonymization_patterns() -> &'static Vec<(Regex, &'static str)> {
    static PATTERNS: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let table: &[(&str, &str)] = &[
            (r"\b\d{3}[-.]?\d{3}[-.]?\d{4}\b", "[PHONE NUMBER REDACTED]"),
            (
                r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b",
                "[EMAIL REDACTED]",
            ),
            (r"\b\d{3}-?\d{2}-?\d{4}\b", "[ID NUMBER REDACTED]"),
            (r"exact location: [^.]+", "location: [LOCATION REDACTED]"),
            (r"address: [^.]+", "address: [ADDRESS REDACTED]"),
            (r"staying at [^.]+", "staying at [LOCATION REDACTED]"),
            (r"witness location[^.]*", "witness location [REDACTED]"),
        ];
        table.iter()
            .map(|(pattern, replacement)| {
                (Regex::new(pattern).expect("static anonymization pattern"), *replacement)
            })
            .collect()
    })
}

/// Scan report text for policy-relevant patterns: PII, graphic content,
/// and security-sensitive details.
pub fn check_content_policy(text: &str) -> PolicyReport {
    let mut violations = Vec::new();
    let mut categories: Vec<String> = Vec::new();

    for pattern in policy_patterns() {
        for found in pattern.regex.find_iter(text) {
            if !categories.iter().any(|c| c.as_str() == pattern.category) {
                categories.push(pattern.category.to_string());
            }
            let snippet: String = found.as_str().chars().take(3).collect();
            violations.push(format!("{} detected: {}***", pattern.label, snippet));
        }
    }

    PolicyReport {
        violation_count: violations.len(),
        has_violations: !violations.is_empty(),
        violations,
        categories,
    }
}

/// Replace sensitive spans with redaction markers.
pub fn anonymize_text(text: &str) -> String {
    let mut output = text.to_string();
    for (regex, replacement) in anonymization_patterns() {
        output = regex.replace_all(&output, *replacement).into_owned();
    }
    output
}

pub fn content_policy_capability() -> FnCapability {
    FnCapability::from_sync(names::CHECK_CONTENT_POLICY, |args| {
        let args: TextArgs = serde_json::from_value(args)
            .map_err(|e| LanternError::Capability(format!("Invalid policy arguments: {e}")))?;
        Ok(serde_json::to_value(check_content_policy(&args.text))?)
    })
}

pub fn anonymize_capability() -> FnCapability {
    FnCapability::from_sync(names::ANONYMIZE_TEXT, |args| {
        let args: TextArgs = serde_json::from_value(args)
            .map_err(|e| LanternError::Capability(format!("Invalid anonymize arguments: {e}")))?;
        Ok(json!(anonymize_text(&args.text)))
    })
}
