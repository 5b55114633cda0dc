//! Query intent classification.
//!
//! Maps free chat text onto one of four request shapes. Matchers run in
//! priority order and the first one that produces an intent wins; the
//! categories overlap, so the order is part of the contract. Search is the
//! explicit catch-all, which makes [`classify`] total.

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

// Pattern syntax is fixed at compile time, a failure here is a programming error.
// Case folding is ASCII only so that look-alike letters never reach a query.
static USER_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i-u)user\s+").expect("Invalid regex: user token"));
static TRENDING_LANGUAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i-u)trending\s+([0-9A-Za-z_]+)").expect("Invalid regex: trending language")
});

/// The classified purpose of a user query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Intent {
    /// A single repository, written as `owner/repo`
    Repository {
        /// Account or organization owning the repository
        owner: String,
        /// Repository name (everything after the first `/`)
        repo: String,
    },
    /// A GitHub account, written as `@name` or `user name`
    User {
        /// Login of the account
        username: String,
    },
    /// Recently created repositories ranked by stars
    Trending {
        /// Language filter taken from `trending <word>`
        language: Option<String>,
    },
    /// Free-text repository search
    Search {
        /// The original query text
        query: String,
    },
}

/// Payload-free tag of an [`Intent`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    /// See [`Intent::Repository`]
    Repository,
    /// See [`Intent::User`]
    User,
    /// See [`Intent::Trending`]
    Trending,
    /// See [`Intent::Search`]
    Search,
}

impl IntentKind {
    /// Returns the lowercase label used in logs and JSON
    pub fn label(&self) -> &'static str {
        match self {
            IntentKind::Repository => "repository",
            IntentKind::User => "user",
            IntentKind::Trending => "trending",
            IntentKind::Search => "search",
        }
    }
}

impl fmt::Display for IntentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Intent {
    /// Returns the tag of this intent
    pub fn kind(&self) -> IntentKind {
        match self {
            Intent::Repository { .. } => IntentKind::Repository,
            Intent::User { .. } => IntentKind::User,
            Intent::Trending { .. } => IntentKind::Trending,
            Intent::Search { .. } => IntentKind::Search,
        }
    }

    /// Describes the fetch this intent triggers, for the workflow log
    pub fn describe(&self) -> String {
        match self {
            Intent::Repository { owner, repo } => {
                format!("Fetching data for repository: {}/{}", owner, repo)
            }
            Intent::User { username } => format!("Fetching profile for user: @{}", username),
            Intent::Trending { language: Some(language) } => {
                format!("Fetching trending repositories for language: {}", language)
            }
            Intent::Trending { language: None } => "Fetching trending repositories".to_string(),
            Intent::Search { query } => format!("Searching repositories for: \"{}\"", query),
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Intent::Repository { owner, repo } => write!(f, "repository {}/{}", owner, repo),
            Intent::User { username } => write!(f, "user @{}", username),
            Intent::Trending { language: Some(language) } => write!(f, "trending {}", language),
            Intent::Trending { language: None } => f.write_str("trending (all languages)"),
            Intent::Search { query } => write!(f, "search \"{}\"", query),
        }
    }
}

/// A single classification rule. Returns `None` when the rule does not apply,
/// which hands the text to the next rule.
pub type Matcher = fn(&str) -> Option<Intent>;

/// `owner/repo` with no whitespace anywhere in the text
pub fn match_repository(text: &str) -> Option<Intent> {
    if !text.contains('/') || text.chars().any(char::is_whitespace) {
        return None;
    }
    let (owner, repo) = text.split_once('/')?;
    let (owner, repo) = (owner.trim(), repo.trim());
    if owner.is_empty() || repo.is_empty() {
        return None;
    }
    Some(Intent::Repository {
        owner: owner.to_string(),
        repo: repo.to_string(),
    })
}

/// `@name`, or any text containing `user ` (case-insensitive)
pub fn match_user(text: &str) -> Option<Intent> {
    if !text.starts_with('@') && !text.to_lowercase().contains("user ") {
        return None;
    }
    let without_at = text.strip_prefix('@').unwrap_or(text);
    let username = USER_TOKEN.replace(without_at, "");
    let username = username.trim();
    if username.is_empty() {
        return None;
    }
    Some(Intent::User {
        username: username.to_string(),
    })
}

/// Any text mentioning `trending`; the following word becomes the language
pub fn match_trending(text: &str) -> Option<Intent> {
    if !text.to_lowercase().contains("trending") {
        return None;
    }
    let language = TRENDING_LANGUAGE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string());
    Some(Intent::Trending { language })
}

/// Ordered list of matchers with an explicit search fallback
#[derive(Clone)]
pub struct QueryClassifier {
    matchers: Vec<(&'static str, Matcher)>,
}

impl QueryClassifier {
    /// Creates a classifier with the standard precedence:
    /// repository, then user, then trending
    pub fn new() -> Self {
        Self {
            matchers: vec![
                ("repository", match_repository as Matcher),
                ("user", match_user as Matcher),
                ("trending", match_trending as Matcher),
            ],
        }
    }

    /// Creates a classifier from a custom matcher list, evaluated in order
    pub fn with_matchers(matchers: Vec<(&'static str, Matcher)>) -> Self {
        Self { matchers }
    }

    /// Classifies the text. Identical input always yields an identical intent.
    pub fn classify(&self, text: &str) -> Intent {
        self.matchers
            .iter()
            .find_map(|(name, matcher)| {
                let intent = matcher(text)?;
                debug!("query {:?} matched rule '{}'", text, name);
                Some(intent)
            })
            .unwrap_or_else(|| Intent::Search {
                query: text.to_string(),
            })
    }
}

impl Default for QueryClassifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Classifies the text with the standard rule order
pub fn classify(text: &str) -> Intent {
    QueryClassifier::new().classify(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn repo(owner: &str, repo: &str) -> Intent {
        Intent::Repository {
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    fn user(name: &str) -> Intent {
        Intent::User {
            username: name.into(),
        }
    }

    fn search(query: &str) -> Intent {
        Intent::Search {
            query: query.into(),
        }
    }

    #[test_case("microsoft/vscode", "microsoft", "vscode")]
    #[test_case("rust-lang/rust", "rust-lang", "rust")]
    #[test_case("a/b/c", "a", "b/c" ; "only the first slash splits")]
    fn test_repository(text: &str, owner: &str, name: &str) {
        assert_eq!(classify(text), repo(owner, name));
    }

    #[test_case("/vscode" ; "missing owner")]
    #[test_case("microsoft/" ; "missing repo")]
    #[test_case("/" ; "bare slash")]
    fn test_empty_repository_halves_fall_through(text: &str) {
        assert_eq!(classify(text), search(text));
    }

    #[test]
    fn test_slash_with_space_is_not_repository() {
        assert_eq!(classify("ci/cd pipelines"), search("ci/cd pipelines"));
    }

    #[test_case("@torvalds", "torvalds")]
    #[test_case("user jaka", "jaka")]
    #[test_case("USER   gaearon", "gaearon" ; "case and extra spaces")]
    #[test_case("@ octocat ", "octocat" ; "trimmed")]
    fn test_user(text: &str, name: &str) {
        assert_eq!(classify(text), user(name));
    }

    #[test]
    fn test_empty_username_falls_through() {
        assert_eq!(classify("@"), search("@"));
        assert_eq!(classify("user "), search("user "));
        assert_eq!(classify("user trending rust"), user("trending rust"));
    }

    #[test]
    fn test_trending() {
        assert_eq!(
            classify("trending typescript"),
            Intent::Trending {
                language: Some("typescript".into())
            }
        );
        assert_eq!(classify("trending"), Intent::Trending { language: None });
        assert_eq!(
            classify("show me TRENDING Go projects"),
            Intent::Trending {
                language: Some("Go".into())
            }
        );
    }

    #[test_case("trending \u{212A}otlin" ; "kelvin sign")]
    #[test_case("trending \u{17F}wift" ; "long s")]
    fn test_trending_language_is_ascii(text: &str) {
        assert_eq!(classify(text), Intent::Trending { language: None });
    }

    #[test]
    fn test_user_token_is_ascii() {
        assert_eq!(classify("u\u{17F}er user jaka"), user("u\u{17F}er jaka"));
    }

    #[test]
    fn test_search_fallback() {
        assert_eq!(
            classify("data visualization react"),
            search("data visualization react")
        );
        assert_eq!(classify(""), search(""));
    }

    #[test]
    fn test_precedence_repository_before_user() {
        assert_eq!(classify("@octo/cat"), repo("@octo", "cat"));
    }

    #[test]
    fn test_classification_is_deterministic() {
        let classifier = QueryClassifier::new();
        for text in ["microsoft/vscode", "@gaearon", "trending go", "async runtime"] {
            assert_eq!(classifier.classify(text), classifier.classify(text));
        }
    }

    #[test]
    fn test_custom_matcher_order() {
        let classifier = QueryClassifier::with_matchers(vec![("trending", match_trending as Matcher)]);
        assert_eq!(classifier.classify("microsoft/vscode"), search("microsoft/vscode"));
    }

    #[test]
    fn test_kind_and_describe() {
        let intent = classify("trending rust");
        assert_eq!(intent.kind(), IntentKind::Trending);
        assert_eq!(
            intent.describe(),
            "Fetching trending repositories for language: rust"
        );
        assert_eq!(classify("@gaearon").to_string(), "user @gaearon");
    }

    #[test]
    fn test_intent_serialization() {
        let json = serde_json::to_value(classify("microsoft/vscode")).unwrap();
        assert_eq!(json["kind"], "repository");
        assert_eq!(json["owner"], "microsoft");
    }
}
