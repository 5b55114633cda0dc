//! Per-request analysis payloads.
//!
//! An [`AnalysisResult`] is built fresh for every query and dropped once it has
//! been formatted. The payload is a tagged union with one variant per intent
//! kind; fields that may legitimately be missing are `Option`s so the
//! formatter can match on them exhaustively.

use crate::classifier::IntentKind;
use crate::github::{Contributor, Release, RepoSummary, Repository, TimeRange, UserProfile};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Number of contributors listed by name in the activity section
const TOP_CONTRIBUTORS: usize = 5;

/// Result of one analysis, before formatting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Text identifying what was analyzed, e.g. `owner/repo` or `trending_rust`
    pub query: String,
    /// Structured data; `None` when the data source returned nothing usable
    pub data: Option<AnalysisData>,
    /// AI commentary, raw or sanitized, fed to insight cleanup
    pub analysis: String,
    /// When the result was produced
    pub timestamp: DateTime<Utc>,
}

impl AnalysisResult {
    /// Creates a result stamped with the current time
    pub fn new(query: impl Into<String>, data: AnalysisData, analysis: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            data: Some(data),
            analysis: analysis.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Structured payload, one variant per intent kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalysisData {
    /// A single repository
    Repository {
        /// Headline facts; required for a report
        overview: Option<RepoOverview>,
        /// Secondary facts from auxiliary endpoints
        activity: Option<RepoActivity>,
    },
    /// A GitHub account
    User {
        /// Account profile; required for a report
        profile: Option<UserProfile>,
        /// Aggregates over the account's repositories
        statistics: Option<UserStatistics>,
        /// The account's public repositories
        #[serde(default)]
        repositories: Vec<RepoSummary>,
    },
    /// Recently created repositories
    Trending {
        /// Repositories in API order
        repositories: Vec<RepoSummary>,
        /// Language filter, if any
        language: Option<String>,
        /// Creation window
        time_range: TimeRange,
    },
    /// Free-text search results
    Search {
        /// Repositories in API order
        repositories: Vec<RepoSummary>,
        /// Query as sent to the API
        query: String,
        /// Total number of matches reported by the API
        total_count: u64,
    },
}

impl AnalysisData {
    /// Returns the intent kind this payload answers
    pub fn kind(&self) -> IntentKind {
        match self {
            AnalysisData::Repository { .. } => IntentKind::Repository,
            AnalysisData::User { .. } => IntentKind::User,
            AnalysisData::Trending { .. } => IntentKind::Trending,
            AnalysisData::Search { .. } => IntentKind::Search,
        }
    }
}

/// Headline facts about a repository
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepoOverview {
    pub name: String,
    pub full_name: String,
    pub html_url: String,
    pub description: Option<String>,
    pub owner: String,
    pub stars: u64,
    pub forks: u64,
    pub watchers: u64,
    pub open_issues: u64,
    pub size_kb: u64,
    pub primary_language: Option<String>,
    pub topics: Vec<String>,
    pub license: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<&Repository> for RepoOverview {
    fn from(repo: &Repository) -> Self {
        Self {
            name: repo.name.clone(),
            full_name: repo.full_name.clone(),
            html_url: repo.html_url.clone(),
            description: repo.description.clone(),
            owner: repo.owner.login.clone(),
            stars: repo.stargazers_count,
            forks: repo.forks_count,
            watchers: repo.watchers_count,
            open_issues: repo.open_issues_count,
            size_kb: repo.size,
            primary_language: repo.language.clone(),
            topics: repo.topics.clone(),
            license: repo
                .license
                .as_ref()
                .and_then(|l| l.spdx_id.clone().or_else(|| l.name.clone())),
            created_at: repo.created_at,
            updated_at: repo.updated_at,
        }
    }
}

/// Share of the code base written in one language
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageShare {
    pub language: String,
    pub bytes: u64,
    pub percentage: f64,
}

impl LanguageShare {
    /// Converts the languages endpoint map into shares, largest first
    pub fn breakdown(languages: HashMap<String, u64>) -> Vec<LanguageShare> {
        let total: u64 = languages.values().sum();
        let mut shares: Vec<LanguageShare> = languages
            .into_iter()
            .map(|(language, bytes)| LanguageShare {
                percentage: if total > 0 {
                    bytes as f64 * 100.0 / total as f64
                } else {
                    0.0
                },
                language,
                bytes,
            })
            .collect();
        shares.sort_by(|a, b| b.bytes.cmp(&a.bytes).then_with(|| a.language.cmp(&b.language)));
        shares
    }
}

/// Secondary repository facts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepoActivity {
    /// Commits on the first page of history
    pub recent_commits: usize,
    pub contributors: usize,
    pub top_contributors: Vec<String>,
    pub releases: usize,
    pub latest_release: Option<String>,
    pub languages: Vec<LanguageShare>,
    /// 0 to 100
    pub health_score: u8,
}

impl RepoActivity {
    /// Assembles activity facts and scores repository health
    pub fn collect(
        repository: &Repository,
        languages: Vec<LanguageShare>,
        contributors: &[Contributor],
        releases: &[Release],
        recent_commits: usize,
    ) -> Self {
        let recently_updated = repository
            .updated_at
            .map_or(false, |updated| updated > Utc::now() - Duration::days(30));

        let health_score = health_score(&HealthInputs {
            stars: repository.stargazers_count,
            forks: repository.forks_count,
            commits: recent_commits as u64,
            contributors: contributors.len() as u64,
            open_issues: repository.open_issues_count,
            has_license: repository.license.is_some(),
            recently_updated,
        });

        Self {
            recent_commits,
            contributors: contributors.len(),
            top_contributors: contributors
                .iter()
                .take(TOP_CONTRIBUTORS)
                .map(|c| c.login.clone())
                .collect(),
            releases: releases.len(),
            latest_release: releases.first().map(|r| r.tag_name.clone()),
            languages,
            health_score,
        }
    }
}

/// Signals that feed the health score
#[derive(Debug, Clone, Copy, Default)]
pub struct HealthInputs {
    pub stars: u64,
    pub forks: u64,
    pub commits: u64,
    pub contributors: u64,
    pub open_issues: u64,
    pub has_license: bool,
    pub recently_updated: bool,
}

/// Scores repository health from 0 to 100.
///
/// Stars, forks, commits and contributors each earn points up to a cap, few
/// open issues earn up to 10, a readme is assumed (5), a license adds 5 and an
/// update within 30 days adds 10.
pub fn health_score(inputs: &HealthInputs) -> u8 {
    let mut score = 0.0_f64;
    score += (inputs.stars as f64 / 100.0).min(25.0);
    score += (inputs.forks as f64 / 50.0).min(20.0);
    score += (inputs.commits as f64 / 100.0).min(20.0);
    score += (inputs.contributors as f64 * 3.0).min(15.0);
    score += (10.0 - inputs.open_issues as f64 / 10.0).max(0.0);
    score += 5.0;
    if inputs.has_license {
        score += 5.0;
    }
    if inputs.recently_updated {
        score += 10.0;
    }
    score.min(100.0).round() as u8
}

/// Aggregates over a user's repositories
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserStatistics {
    pub total_stars: u64,
    pub top_language: String,
    pub repository_count: usize,
}

impl UserStatistics {
    /// Sums stars and picks the most common language.
    /// Ties go to the language seen first; `Unknown` when no repository has one.
    pub fn from_repositories(repos: &[RepoSummary]) -> Self {
        let total_stars = repos.iter().filter_map(|r| r.stargazers_count).sum();

        let mut counts: Vec<(&str, usize)> = Vec::new();
        for language in repos.iter().filter_map(|r| r.language.as_deref()) {
            match counts.iter_mut().find(|(name, _)| *name == language) {
                Some((_, count)) => *count += 1,
                None => counts.push((language, 1)),
            }
        }
        let top_language = counts
            .iter()
            .fold(None, |best: Option<(&str, usize)>, &(name, count)| match best {
                Some((_, best_count)) if best_count >= count => best,
                _ => Some((name, count)),
            })
            .map_or_else(|| "Unknown".to_string(), |(name, _)| name.to_string());

        Self {
            total_stars,
            top_language,
            repository_count: repos.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn repo(language: Option<&str>, stars: u64) -> RepoSummary {
        RepoSummary {
            full_name: Some("x/y".into()),
            language: language.map(str::to_string),
            stargazers_count: Some(stars),
            ..Default::default()
        }
    }

    #[test]
    fn test_user_statistics() {
        let repos = vec![
            repo(Some("Rust"), 10),
            repo(Some("Go"), 5),
            repo(Some("Go"), 1),
            repo(None, 4),
            repo(Some("Rust"), 0),
        ];
        let stats = UserStatistics::from_repositories(&repos);
        assert_eq!(stats.total_stars, 20);
        assert_eq!(stats.top_language, "Rust");
        assert_eq!(stats.repository_count, 5);
    }

    #[test]
    fn test_user_statistics_empty() {
        let stats = UserStatistics::from_repositories(&[]);
        assert_eq!(stats.total_stars, 0);
        assert_eq!(stats.top_language, "Unknown");
    }

    #[test]
    fn test_health_score_bounds() {
        assert_eq!(health_score(&HealthInputs::default()), 15);

        let popular = HealthInputs {
            stars: 1_000_000,
            forks: 1_000_000,
            commits: 10_000,
            contributors: 100,
            open_issues: 0,
            has_license: true,
            recently_updated: true,
        };
        assert_eq!(health_score(&popular), 100);

        let issues = HealthInputs {
            open_issues: 500,
            ..Default::default()
        };
        assert_eq!(health_score(&issues), 5);
    }

    #[test]
    fn test_language_breakdown_sorted() {
        let mut languages = HashMap::new();
        languages.insert("JavaScript".to_string(), 250);
        languages.insert("TypeScript".to_string(), 750);
        let shares = LanguageShare::breakdown(languages);
        assert_eq!(shares[0].language, "TypeScript");
        assert!((shares[0].percentage - 75.0).abs() < f64::EPSILON);
        assert!(LanguageShare::breakdown(HashMap::new()).is_empty());
    }

    #[test]
    fn test_data_kind() {
        let data = AnalysisData::Search {
            repositories: vec![],
            query: "q".into(),
            total_count: 0,
        };
        assert_eq!(data.kind(), IntentKind::Search);
    }
}
