//! GitHub analysis agent.
//!
//! Fetches structured data for an [`Intent`], asks the text generator for a
//! short commentary and packs both into an [`AnalysisResult`]. GitHub failures
//! propagate; generation failures degrade to a fixed notice.

use crate::analysis::{AnalysisData, AnalysisResult, RepoOverview, UserStatistics};
use crate::classifier::Intent;
use crate::error::Result;
use crate::github::{GitHubClient, TimeRange};
use crate::insights::sanitize_markdown;
use crate::llm::TextGenerator;
use crate::prompts;
use log::{info, warn};

/// Analysis text used when the text generator fails
pub const AI_UNAVAILABLE: &str = "AI insights unavailable (text generation error).";

/// Combines the GitHub client with a text generator
pub struct GitHubAgent<G> {
    github: GitHubClient,
    generator: G,
    time_range: TimeRange,
}

impl<G: TextGenerator> GitHubAgent<G> {
    pub fn new(github: GitHubClient, generator: G) -> Self {
        Self {
            github,
            generator,
            time_range: TimeRange::default(),
        }
    }

    /// Sets the creation window used for trending queries
    pub fn with_time_range(mut self, time_range: TimeRange) -> Self {
        self.time_range = time_range;
        self
    }

    pub fn time_range(&self) -> TimeRange {
        self.time_range
    }

    /// Runs the analysis matching the intent
    pub async fn analyze(&self, intent: &Intent) -> Result<AnalysisResult> {
        info!("Analyzing {}", intent);
        match intent {
            Intent::Repository { owner, repo } => self.analyze_repository(owner, repo).await,
            Intent::User { username } => self.analyze_user(username).await,
            Intent::Trending { language } => self.analyze_trending(language.as_deref()).await,
            Intent::Search { query } => self.search_repositories(query).await,
        }
    }

    pub async fn analyze_repository(&self, owner: &str, repo: &str) -> Result<AnalysisResult> {
        let repository = self.github.get_repository(owner, repo).await?;
        let activity = self.github.repository_activity(&repository).await;
        let analysis = self
            .commentary(&prompts::repository_prompt(&repository), "this repository")
            .await;

        Ok(AnalysisResult::new(
            format!("{}/{}", owner, repo),
            AnalysisData::Repository {
                overview: Some(RepoOverview::from(&repository)),
                activity: Some(activity),
            },
            analysis,
        ))
    }

    pub async fn analyze_user(&self, username: &str) -> Result<AnalysisResult> {
        let (profile, repositories) = tokio::try_join!(
            self.github.get_user(username),
            self.github.list_user_repositories(username),
        )?;
        let statistics = UserStatistics::from_repositories(&repositories);
        let analysis = self
            .commentary(
                &prompts::user_prompt(&profile, repositories.len(), &statistics),
                "this user",
            )
            .await;

        Ok(AnalysisResult::new(
            username,
            AnalysisData::User {
                profile: Some(profile),
                statistics: Some(statistics),
                repositories,
            },
            analysis,
        ))
    }

    pub async fn analyze_trending(&self, language: Option<&str>) -> Result<AnalysisResult> {
        let response = self
            .github
            .trending_repositories(language, self.time_range)
            .await?;
        let analysis = self
            .commentary(
                &prompts::trending_prompt(&response.items, language, self.time_range),
                "trending repositories",
            )
            .await;

        Ok(AnalysisResult::new(
            format!("trending_{}", language.unwrap_or("all")),
            AnalysisData::Trending {
                repositories: response.items,
                language: language.map(str::to_string),
                time_range: self.time_range,
            },
            analysis,
        ))
    }

    pub async fn search_repositories(&self, query: &str) -> Result<AnalysisResult> {
        let response = self.github.search_repositories(query).await?;
        let analysis = self
            .commentary(
                &prompts::search_prompt(&response.items, response.total_count, query),
                "these search results",
            )
            .await;

        Ok(AnalysisResult::new(
            query,
            AnalysisData::Search {
                repositories: response.items,
                query: query.to_string(),
                total_count: response.total_count,
            },
            analysis,
        ))
    }

    async fn commentary(&self, prompt: &str, subject: &str) -> String {
        match self.generator.generate(prompt).await {
            Ok(text) if text.trim().is_empty() => format!("No AI insights available for {}.", subject),
            Ok(text) => sanitize_markdown(&text),
            Err(e) => {
                warn!("Text generation failed for {}: {}", subject, e);
                AI_UNAVAILABLE.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GitHubSettings;
    use crate::error::ScopeError;
    use async_trait::async_trait;

    struct Canned(Option<&'static str>);

    #[async_trait]
    impl TextGenerator for Canned {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            self.0
                .map(str::to_string)
                .ok_or_else(|| ScopeError::Llm("boom".into()))
        }
    }

    fn agent(reply: Option<&'static str>) -> GitHubAgent<Canned> {
        let github = GitHubClient::new(&GitHubSettings::default()).unwrap();
        GitHubAgent::new(github, Canned(reply))
    }

    #[tokio::test]
    async fn test_generation_failure_degrades() {
        assert_eq!(agent(None).commentary("p", "this user").await, AI_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_empty_generation() {
        assert_eq!(
            agent(Some("  \n")).commentary("p", "this repository").await,
            "No AI insights available for this repository."
        );
    }

    #[tokio::test]
    async fn test_generation_is_sanitized() {
        let text = agent(Some("## Insights\n- **Fast** builds")).commentary("p", "x").await;
        assert_eq!(text, "Insights\n- Fast builds");
    }

    #[test]
    fn test_time_range_builder() {
        let agent = agent(None).with_time_range(TimeRange::Monthly);
        assert_eq!(agent.time_range(), TimeRange::Monthly);
    }
}
