//! Cleanup of free-form LLM text into short insight bullets.
//!
//! The model answers conversationally: intro lines, numbered lists, repeated
//! points, headings. [`clean_insights`] reduces that to at most a handful of
//! closed sentences. All pattern tables live in [`InsightRules`] and are passed
//! in by the caller.

use crate::error::{Result, ScopeError};
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Fallback line when nothing usable survives cleanup
pub const NO_INSIGHTS: &str = "No AI insights.";

/// Default number of insight bullets kept
pub const DEFAULT_MAX_POINTS: usize = 4;

/// Conversational filler the model puts around its actual points
pub const DEFAULT_META_PATTERNS: &[&str] = &[
    r"^here(’|')?s",
    r"^okay",
    r"^based on",
    r"^analysis( of|:)?",
    r"^offering",
    r"^focusing on",
    r"^in summary",
    r"^key insights:?",
    r"^insights:?",
    r"^the following",
    r"^this suggests",
    r"^we see",
    r"^considering",
    r"^provided information",
    r"^let'?s",
];

/// Bullets, list numbering and stray punctuation at the start of a line
pub const DEFAULT_LEADING_MARKER: &str = r"^[-•*\d.)\s]+";

static DEFAULT_RULES: Lazy<InsightRules> = Lazy::new(|| {
    InsightRules::new(DEFAULT_LEADING_MARKER, DEFAULT_META_PATTERNS)
        .expect("Invalid regex: default insight rules")
});

static CODE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```.*?```").expect("Invalid regex: code fence"));
static INLINE_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"`([^`\n]+)`").expect("Invalid regex: inline code"));
static HEADING_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*#{1,6}[ \t]*").expect("Invalid regex: heading marker"));
static BLANK_RUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n{3,}").expect("Invalid regex: blank line runs"));

/// How repeated insight lines are recognized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupPolicy {
    /// Lines are duplicates only when byte-identical
    Exact,
    /// Lines differing only in letter case are duplicates; the first spelling is kept
    #[default]
    IgnoreCase,
    /// Every line is lowercased before comparison and output
    Lowercase,
}

/// Immutable pattern tables driving [`clean_insights`]
#[derive(Debug, Clone)]
pub struct InsightRules {
    leading_marker: Regex,
    meta_patterns: Vec<Regex>,
    dedup: DedupPolicy,
    fallback: String,
}

impl InsightRules {
    /// Compiles a rule set. Meta patterns are matched case-insensitively.
    pub fn new(leading_marker: &str, meta_patterns: &[&str]) -> Result<Self> {
        let leading_marker = Regex::new(leading_marker)
            .map_err(|e| ScopeError::Config(format!("invalid leading marker pattern: {}", e)))?;
        let meta_patterns = meta_patterns
            .iter()
            .map(|pattern| {
                RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| {
                        ScopeError::Config(format!("invalid meta pattern '{}': {}", pattern, e))
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            leading_marker,
            meta_patterns,
            dedup: DedupPolicy::default(),
            fallback: NO_INSIGHTS.to_string(),
        })
    }

    /// Sets the duplicate detection policy
    pub fn with_dedup(mut self, dedup: DedupPolicy) -> Self {
        self.dedup = dedup;
        self
    }

    /// Sets the line returned when no insight survives
    pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = fallback.into();
        self
    }

    /// Checks whether a cleaned line is conversational filler
    pub fn is_meta(&self, line: &str) -> bool {
        self.meta_patterns.iter().any(|pattern| pattern.is_match(line))
    }

    fn strip_marker(&self, line: &str) -> String {
        self.leading_marker.replace(line, "").trim().to_string()
    }
}

impl Default for InsightRules {
    fn default() -> Self {
        DEFAULT_RULES.clone()
    }
}

/// Reduces raw model text to at most `max_points` closed sentences.
///
/// The result is never empty: when nothing survives, it holds the rule set's
/// fallback line. A `max_points` of zero is treated as one.
pub fn clean_insights(raw: &str, max_points: usize, rules: &InsightRules) -> Vec<String> {
    let max_points = max_points.max(1);

    let mut seen = HashSet::new();
    let insights: Vec<String> = raw
        .split(|c: char| c == '\n' || c == '\r')
        .map(|line| rules.strip_marker(line))
        .filter(|line| !line.is_empty())
        .filter(|line| !rules.is_meta(line))
        .map(|line| match rules.dedup {
            DedupPolicy::Lowercase => line.to_lowercase(),
            _ => line,
        })
        .filter(|line| {
            let key = match rules.dedup {
                DedupPolicy::IgnoreCase => line.to_lowercase(),
                _ => line.clone(),
            };
            seen.insert(key)
        })
        .filter(|line| line.chars().any(|c| c.is_ascii_alphanumeric()))
        .take(max_points)
        .map(|line| close_sentence(&capitalize_first(&line)))
        .collect();

    if insights.is_empty() {
        vec![rules.fallback.clone()]
    } else {
        insights
    }
}

/// Tidies raw model Markdown before it is stored as analysis text:
/// drops fenced code, unwraps inline code and bold markers, removes heading
/// markers and collapses blank-line runs.
pub fn sanitize_markdown(raw: &str) -> String {
    let text = CODE_FENCE.replace_all(raw, "");
    let text = INLINE_CODE.replace_all(&text, "$1");
    let text = text.replace("**", "");
    let text = HEADING_MARKER.replace_all(&text, "");
    let text = BLANK_RUNS.replace_all(&text, "\n\n");
    text.trim().to_string()
}

fn capitalize_first(line: &str) -> String {
    let mut chars = line.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn close_sentence(line: &str) -> String {
    if line.ends_with(['.', '?', '!']) {
        line.to_string()
    } else {
        format!("{}.", line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn clean(raw: &str) -> Vec<String> {
        clean_insights(raw, DEFAULT_MAX_POINTS, &InsightRules::default())
    }

    #[test]
    fn test_empty_input_yields_fallback() {
        assert_eq!(clean(""), vec![NO_INSIGHTS]);
        assert_eq!(clean("  \n\r\n "), vec![NO_INSIGHTS]);
    }

    #[test]
    fn test_meta_and_case_duplicates_removed() {
        let raw = "Here's a summary\n- Fast CI pipeline\n- fast CI pipeline\n";
        assert_eq!(clean(raw), vec!["Fast CI pipeline."]);
    }

    #[test]
    fn test_lowercase_policy_folds_text() {
        let rules = InsightRules::default().with_dedup(DedupPolicy::Lowercase);
        let raw = "Here's a summary\n- Fast CI pipeline\n- fast CI pipeline\n";
        assert_eq!(clean_insights(raw, 4, &rules), vec!["Fast ci pipeline."]);
    }

    #[test]
    fn test_exact_policy_keeps_near_duplicates() {
        let rules = InsightRules::default().with_dedup(DedupPolicy::Exact);
        let raw = "- Fast CI pipeline\n- fast CI pipeline\n- Fast CI pipeline";
        assert_eq!(
            clean_insights(raw, 4, &rules),
            vec!["Fast CI pipeline.", "Fast CI pipeline."]
        );
    }

    #[test]
    fn test_literal_duplicates_removed_under_every_policy() {
        for policy in [DedupPolicy::Exact, DedupPolicy::IgnoreCase, DedupPolicy::Lowercase] {
            let rules = InsightRules::default().with_dedup(policy);
            let out = clean_insights("* strong community\n* strong community", 4, &rules);
            assert_eq!(out, vec!["Strong community."], "policy {:?}", policy);
        }
    }

    #[test]
    fn test_numbering_and_bullets_stripped() {
        let raw = "1. large contributor base\n2) steady releases\n• mostly TypeScript\n   - active issue triage";
        assert_eq!(
            clean(raw),
            vec![
                "Large contributor base.",
                "Steady releases.",
                "Mostly TypeScript.",
                "Active issue triage."
            ]
        );
    }

    #[test]
    fn test_truncates_to_max_points() {
        let raw = "one\ntwo\nthree\nfour\nfive\nsix";
        assert_eq!(clean(raw).len(), 4);
        let rules = InsightRules::default();
        assert_eq!(clean_insights(raw, 2, &rules), vec!["One.", "Two."]);
        assert_eq!(clean_insights(raw, 0, &rules), vec!["One."]);
    }

    #[test]
    fn test_terminal_punctuation_preserved() {
        assert_eq!(
            clean("is it maintained?\nhuge adoption!\nstable API."),
            vec!["Is it maintained?", "Huge adoption!", "Stable API."]
        );
    }

    #[test]
    fn test_meta_lines_case_insensitive() {
        let raw = "OKAY, here goes\nHere’s what I found\nBased on the data\nLet's dig in\nKey Insights:\nIN SUMMARY\nreal point";
        assert_eq!(clean(raw), vec!["Real point."]);
    }

    #[test]
    fn test_lines_without_alphanumerics_dropped() {
        assert_eq!(clean("!!!\n???\n---"), vec![NO_INSIGHTS]);
    }

    #[test]
    fn test_custom_fallback_and_patterns() {
        let rules = InsightRules::new(DEFAULT_LEADING_MARKER, &[r"^note"])
            .unwrap()
            .with_fallback("Nothing to add.");
        assert_eq!(clean_insights("Note: skip me", 4, &rules), vec!["Nothing to add."]);
        assert!(InsightRules::new("(", &[]).is_err());
    }

    #[test]
    fn test_sanitize_markdown() {
        let raw = "## Key Insights\n\n\n\n* **Popular** with `react` users\n```js\nconsole.log(1)\n```\n* Fast";
        let cleaned = sanitize_markdown(raw);
        assert_eq!(cleaned, "Key Insights\n\n* Popular with react users\n\n* Fast");
        assert_eq!(
            clean(&cleaned),
            vec!["Popular with react users.", "Fast."]
        );
    }
}
