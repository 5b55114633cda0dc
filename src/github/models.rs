use crate::error::ScopeError;
use chrono::{DateTime, Days, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A repository as returned by `GET /repos/{owner}/{repo}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    #[serde(default)]
    pub id: u64,
    pub name: String,
    pub full_name: String,
    #[serde(default)]
    pub html_url: String,
    pub description: Option<String>,
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub forks_count: u64,
    #[serde(default)]
    pub watchers_count: u64,
    #[serde(default)]
    pub open_issues_count: u64,
    /// Size in kilobytes
    #[serde(default)]
    pub size: u64,
    pub language: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    pub owner: Owner,
    pub license: Option<License>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Owner {
    pub login: String,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct License {
    pub key: Option<String>,
    pub name: Option<String>,
    pub spdx_id: Option<String>,
}

/// Lenient view of a repository inside list and search payloads.
///
/// Every field may be missing; rendering falls back per field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepoSummary {
    pub full_name: Option<String>,
    pub html_url: Option<String>,
    pub description: Option<String>,
    pub stargazers_count: Option<u64>,
    pub forks_count: Option<u64>,
    pub language: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A user as returned by `GET /users/{username}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub login: String,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub html_url: Option<String>,
    pub bio: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    #[serde(default)]
    pub public_repos: u64,
    #[serde(default)]
    pub followers: u64,
    #[serde(default)]
    pub following: u64,
    pub created_at: Option<DateTime<Utc>>,
}

/// Response of `GET /search/repositories`
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub items: Vec<RepoSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contributor {
    pub login: String,
    #[serde(default)]
    pub contributions: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Release {
    pub tag_name: String,
    pub name: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitSummary {
    pub sha: String,
}

/// How far back "trending" looks for newly created repositories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeRange {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl TimeRange {
    /// First creation date that still counts, relative to `today`
    pub fn since(&self, today: NaiveDate) -> NaiveDate {
        let since = match self {
            TimeRange::Daily => today.checked_sub_days(Days::new(1)),
            TimeRange::Weekly => today.checked_sub_days(Days::new(7)),
            TimeRange::Monthly => today.checked_sub_months(Months::new(1)),
        };
        since.unwrap_or(today)
    }

    /// Human-readable window, e.g. "the last week"
    pub fn window(&self) -> &'static str {
        match self {
            TimeRange::Daily => "the last day",
            TimeRange::Weekly => "the last week",
            TimeRange::Monthly => "the last month",
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TimeRange::Daily => "daily",
            TimeRange::Weekly => "weekly",
            TimeRange::Monthly => "monthly",
        };
        f.write_str(label)
    }
}

impl FromStr for TimeRange {
    type Err = ScopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" | "day" | "today" => Ok(TimeRange::Daily),
            "weekly" | "week" => Ok(TimeRange::Weekly),
            "monthly" | "month" => Ok(TimeRange::Monthly),
            other => Err(ScopeError::Validation(format!(
                "unknown time range '{}', expected daily, weekly or monthly",
                other
            ))),
        }
    }
}

/// Builds the search query used for trending repositories
pub fn trending_query(language: Option<&str>, range: TimeRange, today: NaiveDate) -> String {
    let mut query = format!("created:>{}", range.since(today).format("%Y-%m-%d"));
    if let Some(language) = language {
        query.push_str(&format!(" language:{}", language));
    }
    query
}
