#![allow(dead_code)]

use async_trait::async_trait;
use gitscope::analysis::{AnalysisData, AnalysisResult};
use gitscope::config::{GitHubSettings, LlmSettings};
use gitscope::error::{Result, ScopeError};
use gitscope::github::RepoSummary;
use gitscope::{Analyst, Intent};
use mockito::{Matcher, Mock, ServerGuard};
use serde_json::json;
use std::path::PathBuf;

pub mod test_helpers {
    use super::*;

    pub fn get_test_data_path(file: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_data").join(file)
    }

    pub fn read_test_json(file: &str) -> String {
        std::fs::read_to_string(get_test_data_path(file)).expect("Failed to read test data")
    }

    pub fn setup_test_logger() {
        let _ = env_logger::builder()
            .filter_level(log::LevelFilter::Debug)
            .is_test(true)
            .try_init();
    }

    /// GitHub settings pointing at the mock server
    pub fn github_settings(server: &ServerGuard) -> GitHubSettings {
        GitHubSettings {
            api_base_url: server.url(),
            token: Some("ghp_test".to_string()),
            timeout_seconds: 5,
            ..Default::default()
        }
    }

    /// Text-generation settings pointing at `/generate` on the mock server
    pub fn llm_settings(server: &ServerGuard) -> LlmSettings {
        LlmSettings {
            endpoint: format!("{}/generate", server.url()),
            api_key: Some("test-key".to_string()),
            timeout_seconds: 5,
        }
    }

    /// Mocks a GET endpoint with a JSON body, ignoring the query string
    pub async fn mock_json(server: &mut ServerGuard, path: &str, status: usize, body: &str) -> Mock {
        server
            .mock("GET", path)
            .match_query(Matcher::Any)
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }

    /// Mocks the text-generation endpoint with a single candidate
    pub async fn mock_generation(server: &mut ServerGuard, text: &str) -> Mock {
        let body = json!({
            "candidates": [{ "content": { "parts": [{ "text": text }] } }]
        });
        server
            .mock("POST", "/generate")
            .match_query(Matcher::UrlEncoded("key".into(), "test-key".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create_async()
            .await
    }
}

/// Answers search intents with a fixed result and fails everything else
pub struct StubAnalyst;

#[async_trait]
impl Analyst for StubAnalyst {
    async fn analyze(&self, intent: &Intent) -> Result<AnalysisResult> {
        match intent {
            Intent::Search { query } => Ok(AnalysisResult::new(
                query.as_str(),
                AnalysisData::Search {
                    repositories: vec![RepoSummary {
                        full_name: Some("acme/graph".into()),
                        html_url: Some("https://github.com/acme/graph".into()),
                        stargazers_count: Some(42),
                        ..Default::default()
                    }],
                    query: query.clone(),
                    total_count: 1,
                },
                "- stores graphs\n- stores graphs",
            )),
            _ => Err(ScopeError::NotFound(intent.to_string())),
        }
    }
}
