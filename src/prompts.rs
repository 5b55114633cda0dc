use crate::github::{RepoSummary, Repository, TimeRange, UserProfile};
use crate::analysis::UserStatistics;

/// Instruction shared by every prompt
pub const INSIGHT_REQUEST: &str = "provide 3-4 key insights";

/// Number of trending repositories described to the model
pub const TRENDING_SAMPLE: usize = 5;
/// Number of search results described to the model
pub const SEARCH_SAMPLE: usize = 3;

fn or_unknown(value: Option<&str>) -> &str {
    value.unwrap_or("Unknown")
}

fn repo_line(repo: &RepoSummary) -> String {
    format!(
        "{}: {} stars, {}",
        or_unknown(repo.full_name.as_deref()),
        repo.stargazers_count.unwrap_or(0),
        or_unknown(repo.language.as_deref())
    )
}

fn repo_lines(repos: &[RepoSummary], limit: usize) -> String {
    repos
        .iter()
        .take(limit)
        .map(repo_line)
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn repository_prompt(repo: &Repository) -> String {
    format!(
        "Analyze this GitHub repository and {}.\n\n\
         Repository: {}\n\
         Stars: {}\n\
         Forks: {}\n\
         Language: {}\n\
         Description: {}\n\
         Last updated: {}",
        INSIGHT_REQUEST,
        repo.full_name,
        repo.stargazers_count,
        repo.forks_count,
        or_unknown(repo.language.as_deref()),
        repo.description.as_deref().unwrap_or("None"),
        repo.updated_at
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "Unknown".to_string()),
    )
}

pub fn user_prompt(profile: &UserProfile, repository_count: usize, stats: &UserStatistics) -> String {
    format!(
        "Analyze this GitHub user and {}.\n\n\
         User: {}\n\
         Repositories: {}\n\
         Followers: {}\n\
         Following: {}\n\
         Account created: {}\n\
         Most used language: {}\n\
         Total stars: {}",
        INSIGHT_REQUEST,
        profile.login,
        repository_count,
        profile.followers,
        profile.following,
        profile
            .created_at
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "Unknown".to_string()),
        stats.top_language,
        stats.total_stars,
    )
}

pub fn trending_prompt(repos: &[RepoSummary], language: Option<&str>, range: TimeRange) -> String {
    format!(
        "Analyze these trending GitHub repositories and {}.\n\n\
         Top {} trending repositories:\n{}\n\
         Time range: {}\n\
         Language: {}",
        INSIGHT_REQUEST,
        TRENDING_SAMPLE,
        repo_lines(repos, TRENDING_SAMPLE),
        range,
        language.unwrap_or("all"),
    )
}

pub fn search_prompt(repos: &[RepoSummary], total_count: u64, query: &str) -> String {
    format!(
        "Analyze these GitHub search results and {}.\n\n\
         Top {} results:\n{}\n\
         Total results: {}\n\
         Query: {}",
        INSIGHT_REQUEST,
        SEARCH_SAMPLE,
        repo_lines(repos, SEARCH_SAMPLE),
        total_count,
        query,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_prompt_lists_top_results() {
        let repos: Vec<RepoSummary> = (1..=5)
            .map(|i| RepoSummary {
                full_name: Some(format!("org/repo{}", i)),
                stargazers_count: Some(i * 10),
                language: None,
                ..Default::default()
            })
            .collect();
        let prompt = search_prompt(&repos, 42, "graph database");

        assert!(prompt.contains(INSIGHT_REQUEST));
        assert!(prompt.contains("org/repo1: 10 stars, Unknown"));
        assert!(prompt.contains("org/repo3"));
        assert!(!prompt.contains("org/repo4"));
        assert!(prompt.contains("Total results: 42"));
        assert!(prompt.ends_with("Query: graph database"));
    }

    #[test]
    fn test_trending_prompt_defaults_language() {
        let prompt = trending_prompt(&[], None, TimeRange::Weekly);
        assert!(prompt.contains("Language: all"));
        assert!(prompt.contains("Time range: weekly"));
    }
}
