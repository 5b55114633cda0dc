//! Markdown rendering of analysis results.
//!
//! Every path returns a displayable string. Missing structured data turns into
//! an "Analysis Failed" message instead of an error, and list reports push
//! configuration-like repositories to the end with a stable partition.

use crate::analysis::{AnalysisData, AnalysisResult, RepoActivity, RepoOverview, UserStatistics};
use crate::classifier::IntentKind;
use crate::config::ReportSettings;
use crate::github::{RepoSummary, TimeRange, UserProfile};
use crate::insights::{clean_insights, InsightRules, DEFAULT_MAX_POINTS};
use chrono::{Local, NaiveTime};
use log::warn;

/// Keywords marking a repository as configuration or scripting only
pub const CONFIG_KEYWORDS: &[&str] = &[
    "config", "setup", "dotfiles", "init", "install", "build", "script",
];

/// Characters of a repository description kept in list entries
pub const DESCRIPTION_LIMIT: usize = 120;

const FAILED_HEADING: &str = "❌ **Analysis Failed**";
const NO_DATA: &str = "No data was returned from the GitHub API. Please try again or check your query.";
const NO_REPOSITORY: &str = "Repository data is missing or incomplete.";
const NO_PROFILE: &str = "User profile data is missing or incomplete.";
const NO_TRENDING: &str =
    "## Trending Repositories\n\nNo trending repositories found for your query. Try a different language or time range.";
const NO_SEARCH_RESULTS: &str = "## Search Results\n\nNo repositories found for your search query.";
const NOT_SPECIFIED: &str = "Not specified";

/// Keyword table deciding which repositories get demoted
#[derive(Debug, Clone, PartialEq)]
pub struct DemotionRules {
    keywords: Vec<String>,
}

impl DemotionRules {
    /// Creates rules from keywords, matched as case-insensitive substrings
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    /// True when the full name or the description contains a keyword
    pub fn matches(&self, repo: &RepoSummary) -> bool {
        let name = repo.full_name.as_deref().unwrap_or("").to_lowercase();
        let description = repo.description.as_deref().unwrap_or("").to_lowercase();
        self.keywords
            .iter()
            .any(|k| name.contains(k.as_str()) || description.contains(k.as_str()))
    }
}

impl Default for DemotionRules {
    fn default() -> Self {
        Self::new(CONFIG_KEYWORDS)
    }
}

/// Moves matching repositories after all others, keeping relative order in both groups
pub fn demote_config_repos<'a>(repos: &'a [RepoSummary], rules: &DemotionRules) -> Vec<&'a RepoSummary> {
    let (regular, demoted): (Vec<&RepoSummary>, Vec<&RepoSummary>) =
        repos.iter().partition(|repo| !rules.matches(repo));
    regular.into_iter().chain(demoted).collect()
}

/// Renders one list entry. `index` is zero-based and only shows up in the
/// placeholder for incomplete entries.
pub fn format_repo(repo: &RepoSummary, index: usize) -> String {
    let (full_name, html_url) = match (non_empty(&repo.full_name), non_empty(&repo.html_url)) {
        (Some(name), Some(url)) => (name, url),
        _ => return format!("{}. (Missing repository data)", index + 1),
    };

    let stats = format!(
        "⭐ {} | 🍴 {} | {}",
        group_thousands(repo.stargazers_count.unwrap_or(0)),
        group_thousands(repo.forks_count.unwrap_or(0)),
        non_empty(&repo.language).unwrap_or("Multiple")
    );
    let description = match non_empty(&repo.description) {
        Some(text) => truncate(text, DESCRIPTION_LIMIT),
        None => "No description available".to_string(),
    };

    format!("**[{}]({})**  \n{}  \n{}", full_name, html_url, stats, description)
}

/// Formats an integer with comma thousands separators
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn truncate(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

fn failed(reason: &str) -> String {
    format!("{}\n\n{}", FAILED_HEADING, reason)
}

/// Tables and limits used by [`Formatter`]
#[derive(Debug, Clone)]
pub struct FormatRules {
    pub insights: InsightRules,
    pub demotion: DemotionRules,
    pub max_insights: usize,
    pub trending_limit: usize,
    pub search_limit: usize,
    pub top_user_repos: usize,
}

impl Default for FormatRules {
    fn default() -> Self {
        Self {
            insights: InsightRules::default(),
            demotion: DemotionRules::default(),
            max_insights: DEFAULT_MAX_POINTS,
            trending_limit: 10,
            search_limit: 8,
            top_user_repos: 3,
        }
    }
}

impl FormatRules {
    /// Builds rules from the `[report]` config section
    pub fn from_settings(settings: &ReportSettings) -> Self {
        Self {
            insights: InsightRules::default().with_dedup(settings.dedup),
            demotion: DemotionRules::new(&settings.demote_keywords),
            max_insights: settings.max_insights,
            trending_limit: settings.trending_limit,
            search_limit: settings.search_limit,
            top_user_repos: settings.top_user_repos,
        }
    }
}

/// Turns analysis results into chat-ready Markdown
#[derive(Debug, Clone, Default)]
pub struct Formatter {
    rules: FormatRules,
}

impl Formatter {
    pub fn new(rules: FormatRules) -> Self {
        Self { rules }
    }

    /// Formats with the current local time in the footer
    pub fn format(&self, result: &AnalysisResult, kind: IntentKind) -> String {
        self.format_at(result, kind, Local::now().time())
    }

    /// Formats with a fixed footer time; identical inputs give identical output
    pub fn format_at(&self, result: &AnalysisResult, kind: IntentKind, at: NaiveTime) -> String {
        let data = match &result.data {
            Some(data) => data,
            None => return failed(NO_DATA),
        };

        let body = match (kind, data) {
            (IntentKind::Repository, AnalysisData::Repository { overview, activity }) => {
                match overview {
                    Some(overview) => self.repository_report(overview, activity.as_ref()),
                    None => return failed(NO_REPOSITORY),
                }
            }
            (
                IntentKind::User,
                AnalysisData::User {
                    profile,
                    statistics,
                    repositories,
                },
            ) => match profile {
                Some(profile) => self.user_report(profile, statistics.as_ref(), repositories),
                None => return failed(NO_PROFILE),
            },
            (
                IntentKind::Trending,
                AnalysisData::Trending {
                    repositories,
                    language,
                    time_range,
                },
            ) => match self.trending_report(repositories, language.as_deref(), *time_range) {
                Some(report) => report,
                None => return NO_TRENDING.to_string(),
            },
            (
                IntentKind::Search,
                AnalysisData::Search {
                    repositories,
                    query,
                    total_count,
                },
            ) => {
                let query = if query.trim().is_empty() { &result.query } else { query };
                match self.search_report(repositories, query, *total_count) {
                    Some(report) => report,
                    None => return NO_SEARCH_RESULTS.to_string(),
                }
            }
            (kind, data) => {
                warn!("{} payload formatted as {}", data.kind(), kind);
                return raw_report(data);
            }
        };

        format!(
            "{}\n\n---\n\n{}\n\nAnalysis completed at {}",
            body,
            self.insights_section(&result.analysis),
            at.format("%H:%M:%S")
        )
    }

    fn insights_section(&self, analysis: &str) -> String {
        let bullets: Vec<String> = clean_insights(analysis, self.rules.max_insights, &self.rules.insights)
            .into_iter()
            .map(|line| format!("- {}", line))
            .collect();
        format!("**Key Insights**\n{}", bullets.join("\n"))
    }

    fn repository_report(&self, overview: &RepoOverview, activity: Option<&RepoActivity>) -> String {
        let name = if overview.name.is_empty() { "Unknown" } else { overview.name.as_str() };
        let mut lines = vec![
            format!("## Repository Analysis: {}", name),
            String::new(),
            "### Overview".to_string(),
            format!(
                "- **Description:** {}",
                non_empty(&overview.description).unwrap_or("No description available")
            ),
            format!("- **Owner:** @{}", overview.owner),
            format!(
                "- **Primary Language:** {}",
                non_empty(&overview.primary_language).unwrap_or("Unknown")
            ),
        ];
        if !overview.topics.is_empty() {
            lines.push(format!("- **Topics:** {}", overview.topics.join(", ")));
        }
        if let Some(license) = non_empty(&overview.license) {
            lines.push(format!("- **License:** {}", license));
        }

        lines.push(String::new());
        lines.push("### Metrics".to_string());
        lines.push(format!(
            "⭐ {} stars | 🍴 {} forks | 👀 {} watchers | 🐛 {} open issues",
            group_thousands(overview.stars),
            group_thousands(overview.forks),
            group_thousands(overview.watchers),
            group_thousands(overview.open_issues)
        ));

        lines.push(String::new());
        lines.push("### Activity".to_string());
        match activity {
            Some(activity) => lines.extend(activity_lines(activity)),
            None => lines.push("Activity data not available.".to_string()),
        }

        lines.join("\n")
    }

    fn user_report(
        &self,
        profile: &UserProfile,
        statistics: Option<&UserStatistics>,
        repositories: &[RepoSummary],
    ) -> String {
        let mut lines = vec![
            format!("## User Analysis: @{}", profile.login),
            String::new(),
            "### Profile".to_string(),
            format!("- **Name:** {}", non_empty(&profile.name).unwrap_or(NOT_SPECIFIED)),
            format!("- **Company:** {}", non_empty(&profile.company).unwrap_or(NOT_SPECIFIED)),
            format!("- **Location:** {}", non_empty(&profile.location).unwrap_or(NOT_SPECIFIED)),
            format!("- **Bio:** {}", non_empty(&profile.bio).unwrap_or("No bio available")),
            String::new(),
            "### Statistics".to_string(),
            format!(
                "Public Repos: {} | Followers: {} | Following: {} | Total Stars: {}",
                group_thousands(profile.public_repos),
                group_thousands(profile.followers),
                group_thousands(profile.following),
                group_thousands(statistics.map_or(0, |s| s.total_stars))
            ),
            format!(
                "Most Used Language: {}",
                statistics
                    .map(|s| s.top_language.as_str())
                    .filter(|l| !l.is_empty())
                    .unwrap_or("Unknown")
            ),
        ];

        let mut top: Vec<&RepoSummary> = repositories.iter().collect();
        // sort_by is stable, ties keep API order
        top.sort_by(|a, b| b.stargazers_count.unwrap_or(0).cmp(&a.stargazers_count.unwrap_or(0)));
        top.truncate(self.rules.top_user_repos);
        if !top.is_empty() {
            lines.push(String::new());
            lines.push("### Top Repositories".to_string());
            lines.push(render_list(&top));
        }

        lines.join("\n")
    }

    fn trending_report(
        &self,
        repositories: &[RepoSummary],
        language: Option<&str>,
        time_range: TimeRange,
    ) -> Option<String> {
        let shown = &repositories[..repositories.len().min(self.rules.trending_limit)];
        let ordered = demote_config_repos(shown, &self.rules.demotion);
        if ordered.is_empty() {
            return None;
        }

        let heading = match language.map(str::trim).filter(|l| !l.is_empty()) {
            Some(language) => format!("## Trending Repositories for: {}", language),
            None => "## Trending Repositories".to_string(),
        };
        Some(format!(
            "{}\n### Top {} Trending Projects\n_Created in {}_\n\n{}",
            heading,
            ordered.len(),
            time_range.window(),
            render_list(&ordered)
        ))
    }

    fn search_report(&self, repositories: &[RepoSummary], query: &str, total_count: u64) -> Option<String> {
        let shown = &repositories[..repositories.len().min(self.rules.search_limit)];
        let ordered = demote_config_repos(shown, &self.rules.demotion);
        if ordered.is_empty() {
            return None;
        }

        Some(format!(
            "## Search Results for: \"{}\"\nFound {} repositories\n\n{}",
            query,
            group_thousands(total_count),
            render_list(&ordered)
        ))
    }
}

fn activity_lines(activity: &RepoActivity) -> Vec<String> {
    let mut contributors = format!("- **Contributors:** {}", activity.contributors);
    if !activity.top_contributors.is_empty() {
        contributors.push_str(&format!(" (top: {})", activity.top_contributors.join(", ")));
    }
    let mut releases = format!("- **Releases:** {}", activity.releases);
    if let Some(tag) = &activity.latest_release {
        releases.push_str(&format!(" (latest: {})", tag));
    }

    let mut lines = vec![
        contributors,
        releases,
        format!("- **Recent Commits:** {}", activity.recent_commits),
    ];
    if !activity.languages.is_empty() {
        let breakdown: Vec<String> = activity
            .languages
            .iter()
            .map(|share| format!("{} {:.1}%", share.language, share.percentage))
            .collect();
        lines.push(format!("- **Languages:** {}", breakdown.join(", ")));
    }
    lines.push(format!("- **Health Score:** {}/100", activity.health_score));
    lines
}

fn render_list(repos: &[&RepoSummary]) -> String {
    repos
        .iter()
        .enumerate()
        .map(|(i, repo)| format_repo(repo, i))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn raw_report(data: &AnalysisData) -> String {
    let json = serde_json::to_string_pretty(data).unwrap_or_else(|_| format!("{:?}", data));
    format!("## GitHub Analysis Complete\n\n```json\n{}\n```", json)
}
