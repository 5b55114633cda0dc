//! GitHub REST API client.
//!
//! Thin typed wrapper over `reqwest` for the handful of endpoints the chat
//! needs. Non-2xx responses are mapped onto [`ScopeError`] variants; nothing
//! is retried.

use crate::analysis::{LanguageShare, RepoActivity};
use crate::config::GitHubSettings;
use crate::error::{Result, ScopeError};
use chrono::Utc;
use log::{debug, info, warn};
use reqwest::{header, Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::time::Duration;

mod models;

pub use models::{
    trending_query, CommitSummary, Contributor, License, Owner, Release, RepoSummary, Repository,
    SearchResponse, TimeRange, UserProfile,
};

const ACCEPT: &str = "application/vnd.github.v3+json";
const SEARCH_PAGE_SIZE: u32 = 30;
const RELEASE_PAGE_SIZE: u32 = 10;

#[derive(Clone)]
pub struct GitHubClient {
    client: Client,
    base_url: String,
    token: Option<String>,
    per_page: u32,
}

impl GitHubClient {
    pub fn new(settings: &GitHubSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .user_agent(settings.user_agent.clone())
            .build()
            .map_err(|e| ScopeError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: settings.api_base_url.trim_end_matches('/').to_string(),
            token: settings.token.clone().filter(|t| !t.trim().is_empty()),
            per_page: settings.per_page,
        })
    }

    pub async fn get_repository(&self, owner: &str, repo: &str) -> Result<Repository> {
        self.get_json(&format!("repos/{}/{}", owner, repo), &[]).await
    }

    pub async fn get_user(&self, username: &str) -> Result<UserProfile> {
        self.get_json(&format!("users/{}", username), &[]).await
    }

    /// Public repositories of a user, most recently updated first
    pub async fn list_user_repositories(&self, username: &str) -> Result<Vec<RepoSummary>> {
        self.get_json(
            &format!("users/{}/repos", username),
            &[("sort", "updated".to_string()), ("per_page", self.per_page.to_string())],
        )
        .await
    }

    /// Repositories matching a free-text query, most starred first
    pub async fn search_repositories(&self, query: &str) -> Result<SearchResponse> {
        self.get_json(
            "search/repositories",
            &[
                ("q", query.to_string()),
                ("sort", "stars".to_string()),
                ("order", "desc".to_string()),
                ("per_page", SEARCH_PAGE_SIZE.to_string()),
            ],
        )
        .await
    }

    /// Recently created repositories ranked by stars
    pub async fn trending_repositories(
        &self,
        language: Option<&str>,
        range: TimeRange,
    ) -> Result<SearchResponse> {
        let query = trending_query(language, range, Utc::now().date_naive());
        debug!("trending query: {}", query);
        self.search_repositories(&query).await
    }

    /// Bytes of code per language
    pub async fn repository_languages(&self, owner: &str, repo: &str) -> Result<HashMap<String, u64>> {
        self.get_json(&format!("repos/{}/{}/languages", owner, repo), &[])
            .await
    }

    pub async fn repository_contributors(&self, owner: &str, repo: &str) -> Result<Vec<Contributor>> {
        self.get_json(
            &format!("repos/{}/{}/contributors", owner, repo),
            &[("per_page", self.per_page.to_string())],
        )
        .await
    }

    pub async fn repository_releases(&self, owner: &str, repo: &str) -> Result<Vec<Release>> {
        self.get_json(
            &format!("repos/{}/{}/releases", owner, repo),
            &[("per_page", RELEASE_PAGE_SIZE.to_string())],
        )
        .await
    }

    pub async fn repository_commits(&self, owner: &str, repo: &str) -> Result<Vec<CommitSummary>> {
        self.get_json(
            &format!("repos/{}/{}/commits", owner, repo),
            &[("per_page", self.per_page.to_string())],
        )
        .await
    }

    /// Fetches the secondary repository endpoints concurrently.
    ///
    /// Each endpoint is optional: a failure is logged and counts as empty.
    pub async fn repository_activity(&self, repository: &Repository) -> RepoActivity {
        let owner = repository.owner.login.as_str();
        let repo = repository.name.as_str();

        let (languages, contributors, releases, commits) = tokio::join!(
            self.repository_languages(owner, repo),
            self.repository_contributors(owner, repo),
            self.repository_releases(owner, repo),
            self.repository_commits(owner, repo),
        );

        let languages = settle(languages, "languages", &repository.full_name);
        let contributors = settle(contributors, "contributors", &repository.full_name);
        let releases = settle(releases, "releases", &repository.full_name);
        let commits = settle(commits, "commits", &repository.full_name);

        RepoActivity::collect(
            repository,
            LanguageShare::breakdown(languages),
            &contributors,
            &releases,
            commits.len(),
        )
    }

    fn request(&self, url: &str) -> RequestBuilder {
        let mut request = self.client.get(url).header(header::ACCEPT, ACCEPT);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        request
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = format!("{}/{}", self.base_url, path);
        info!("GET {}", url);

        let response = self
            .request(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| ScopeError::Network(e.to_string()))?;

        let response = check_status(response, path).await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

async fn check_status(response: Response, resource: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let quota_exhausted = response
        .headers()
        .get("x-ratelimit-remaining")
        .and_then(|value| value.to_str().ok())
        .map_or(false, |remaining| remaining.trim() == "0");
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|json| json["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| status.to_string());

    match status {
        StatusCode::NOT_FOUND => Err(ScopeError::NotFound(resource.to_string())),
        StatusCode::TOO_MANY_REQUESTS => Err(ScopeError::RateLimitExceeded(message)),
        StatusCode::FORBIDDEN
            if quota_exhausted || message.to_lowercase().contains("rate limit") =>
        {
            Err(ScopeError::RateLimitExceeded(message))
        }
        _ => Err(ScopeError::GitHubApi(format!(
            "{} returned {}: {}",
            resource, status, message
        ))),
    }
}

fn settle<T: Default>(result: Result<T>, what: &str, repository: &str) -> T {
    result.unwrap_or_else(|e| {
        warn!("could not fetch {} for {}: {}", what, repository, e);
        T::default()
    })
}
