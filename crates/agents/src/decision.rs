//! Defensive parsing of free-text model output into typed decisions.
//!
//! Every parse here is total: ambiguity resolves to a documented
//! conservative default instead of an error. Verification must degrade to
//! "rejected" on ambiguity, never to "accepted".

/// Confidence used when extraction finds no usable score at all.
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// Conservative verdict applied when the decision text is malformed.
pub const FALLBACK_CONFIDENCE: f64 = 0.2;

/// A fused verification verdict extracted from model text.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub verified: bool,
    pub confidence: f64,
    /// Human-readable rationale, when one could be extracted.
    pub assessment: Option<String>,
}

impl Verdict {
    /// The conservative outcome forced on malformed decisions and on
    /// completion failures during the final-decision step.
    pub fn rejected() -> Self {
        Self {
            verified: false,
            confidence: FALLBACK_CONFIDENCE,
            assessment: None,
        }
    }

    /// Accept gate: both conditions are required; confidence alone does not
    /// accept an unverified item. The boundary is inclusive at 0.5.
    pub fn accepted(&self) -> bool {
        self.verified && self.confidence >= 0.5
    }
}

/// Parse a free-text verification decision.
///
/// Rules, applied line by line:
/// - the first line containing "confidence" yields the score: the first run
///   of digits/decimal points is parsed as `f64`. No such line, or a line
///   without digits, defaults the score to 0.5. A digit run that does not
///   parse, or a value outside `[0, 1]`, marks the whole decision malformed
///   and forces the conservative `(verified=false, confidence=0.2)`.
/// - the verdict is true only if a line containing "verified" also carries
///   an affirmative marker ("true" or "yes"); it defaults to false.
/// - the assessment is the text after the colon on an "explanation" line,
///   falling back to the first non-empty line.
pub fn parse_verdict(text: &str) -> Verdict {
    let confidence = match extract_confidence(text) {
        Ok(score) => score,
        Err(()) => return Verdict::rejected(),
    };

    let lower = text.to_lowercase();
    let verified = lower.contains("verified: true")
        || lower
            .lines()
            .find(|line| line.contains("verified"))
            .map(|line| line.contains("true") || line.contains("yes"))
            .unwrap_or(false);

    Verdict {
        verified,
        confidence,
        assessment: extract_assessment(text),
    }
}

/// Ok(score) on success or usable default, Err(()) when the decision text
/// is malformed beyond conservative repair.
fn extract_confidence(text: &str) -> std::result::Result<f64, ()> {
    let line = match text
        .lines()
        .find(|line| line.to_lowercase().contains("confidence"))
    {
        Some(line) => line,
        None => return Ok(DEFAULT_CONFIDENCE),
    };

    let run: String = line
        .chars()
        .skip_while(|c| !c.is_ascii_digit() && *c != '.')
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    // Trailing dots are sentence punctuation, not decimal structure.
    let cleaned = run.trim_end_matches('.');
    if cleaned.is_empty() {
        return Ok(DEFAULT_CONFIDENCE);
    }

    match cleaned.parse::<f64>() {
        Ok(score) if (0.0..=1.0).contains(&score) => Ok(score),
        // "1.2.3", NaN-shaped garbage, or out-of-range scores: the decision
        // is malformed, not merely missing.
        _ => Err(()),
    }
}

fn extract_assessment(text: &str) -> Option<String> {
    if let Some(line) = text
        .lines()
        .find(|line| line.to_lowercase().contains("explanation"))
    {
        if let Some((_, rest)) = line.split_once(':') {
            let rest = rest.trim();
            if !rest.is_empty() {
                return Some(rest.to_string());
            }
        }
    }

    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}

/// Extract proposed search terms from a model response.
///
/// Lines beginning with `-`, `*`, or `N.` (single digit) contribute the
/// remainder of the line as a term. The result may be empty; the Collector
/// applies the mandatory query fallback.
pub fn parse_search_terms(text: &str) -> Vec<String> {
    let mut terms = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || !has_list_marker(line) {
            continue;
        }

        let term = match line.split_once(' ') {
            Some((_, rest)) => rest.trim(),
            None => line,
        };

        if !term.is_empty() {
            terms.push(term.to_string());
        }
    }

    terms
}

fn has_list_marker(line: &str) -> bool {
    if line.starts_with('-') || line.starts_with('*') {
        return true;
    }

    let mut chars = line.chars();
    matches!(
        (chars.next(), chars.next()),
        (Some(digit), Some('.')) if digit.is_ascii_digit() && digit != '0'
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_decision() {
        let text = "Verified: true\nConfidence: 0.85\nExplanation: corroborated by two outlets";
        let verdict = parse_verdict(text);

        assert!(verdict.verified);
        assert!((verdict.confidence - 0.85).abs() < f64::EPSILON);
        assert_eq!(
            verdict.assessment.as_deref(),
            Some("corroborated by two outlets")
        );
        assert!(verdict.accepted());
    }

    #[test]
    fn accept_gate_boundary_is_inclusive() {
        let at_boundary = parse_verdict("verified: true\nconfidence: 0.5");
        assert!(at_boundary.accepted());

        let below = parse_verdict("verified: true\nconfidence: 0.4999");
        assert!(!below.accepted());
    }

    #[test]
    fn confidence_alone_does_not_accept() {
        let verdict = parse_verdict("verified: false\nconfidence: 0.99");
        assert!(!verdict.verified);
        assert!(!verdict.accepted());
    }

    #[test]
    fn missing_confidence_defaults_to_half() {
        let verdict = parse_verdict("Verified: yes, the source checks out.");
        assert!(verdict.verified);
        assert!((verdict.confidence - DEFAULT_CONFIDENCE).abs() < f64::EPSILON);
    }

    #[test]
    fn confidence_line_without_digits_defaults_to_half() {
        let verdict = parse_verdict("confidence: high\nverified: true");
        assert!((verdict.confidence - DEFAULT_CONFIDENCE).abs() < f64::EPSILON);
    }

    #[test]
    fn malformed_confidence_forces_conservative_reject() {
        let verdict = parse_verdict("verified: true\nconfidence: 1.2.3");
        assert_eq!(verdict, Verdict::rejected());
        assert!(!verdict.accepted());
    }

    #[test]
    fn out_of_range_confidence_forces_conservative_reject() {
        let verdict = parse_verdict("verified: true\nconfidence: 90");
        assert!(!verdict.verified);
        assert!((verdict.confidence - FALLBACK_CONFIDENCE).abs() < f64::EPSILON);
    }

    #[test]
    fn verdict_defaults_to_false() {
        let verdict = parse_verdict("The item looks plausible.\nConfidence: 0.7");
        assert!(!verdict.verified);
        assert!(!verdict.accepted());
    }

    #[test]
    fn trailing_prose_after_score_is_ignored() {
        let verdict = parse_verdict("confidence: 0.75 (fairly sure)\nverified: true");
        assert!((verdict.confidence - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn sentence_punctuation_and_leading_dots_parse() {
        let with_period = parse_verdict("verified: true\nMy confidence is 0.75.");
        assert!((with_period.confidence - 0.75).abs() < f64::EPSILON);

        let leading_dot = parse_verdict("verified: true\nconfidence: .5");
        assert!((leading_dot.confidence - 0.5).abs() < f64::EPSILON);
        assert!(leading_dot.accepted());
    }

    #[test]
    fn assessment_falls_back_to_first_line() {
        let verdict = parse_verdict("Strong corroboration overall.\nconfidence: 0.8");
        assert_eq!(
            verdict.assessment.as_deref(),
            Some("Strong corroboration overall.")
        );
    }

    #[test]
    fn extracts_terms_from_mixed_markers() {
        let text = "Here are some terms:\n- bridge collapse\n* city X infrastructure\n1. eyewitness footage\n9. last one\nnot a list line";
        let terms = parse_search_terms(text);
        assert_eq!(
            terms,
            vec![
                "bridge collapse",
                "city X infrastructure",
                "eyewitness footage",
                "last one"
            ]
        );
    }

    #[test]
    fn no_markers_yields_empty_terms() {
        let text = "I would search for bridge collapse reports and city records.";
        assert!(parse_search_terms(text).is_empty());
    }

    #[test]
    fn bare_marker_lines_are_skipped() {
        assert!(parse_search_terms("- \n* ").is_empty());
    }
}
