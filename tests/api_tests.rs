use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use gitscope::api::{self, AppState};
use gitscope::session::ANALYSIS_ERROR_MESSAGE;
use gitscope::{AnalysisData, AnalysisResult, Analyst, ChatSession, Formatter, Intent, Result};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tower::ServiceExt;

mod common;
use common::StubAnalyst;

fn app() -> Router {
    api::router(AppState::new(ChatSession::new(StubAnalyst, Formatter::default())))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health() {
    let (status, body) = send(&app(), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_suggestions() {
    let (status, body) = send(&app(), get("/api/suggestions")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0], "microsoft/vscode");
}

#[tokio::test]
async fn test_classify() {
    let (status, body) = send(&app(), post("/api/classify", json!({ "query": "trending rust" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["intent"]["kind"], "trending");
    assert_eq!(body["intent"]["language"], "rust");
    assert_eq!(
        body["description"],
        "Fetching trending repositories for language: rust"
    );
}

#[tokio::test]
async fn test_chat_round_trip() {
    let app = app();
    let (status, body) = send(&app, post("/api/chat", json!({ "message": "graph storage" }))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"]["role"], "assistant");
    let content = body["message"]["content"].as_str().unwrap();
    assert!(content.contains("## Search Results for: \"graph storage\""));
    assert!(content.contains("**Key Insights**\n- Stores graphs.\n\n"));
    assert_eq!(body["workflow"].as_array().unwrap().len(), 5);
    assert_eq!(body["workflow"][1]["process"], "Searching Repositories");

    let (_, messages) = send(&app, get("/api/messages")).await;
    let messages = messages.as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["role"], "user");
    assert_eq!(messages[0]["content"], "graph storage");
}

#[tokio::test]
async fn test_chat_failure_is_generic_reply() {
    let app = app();
    let (status, body) = send(&app, post("/api/chat", json!({ "message": "@ghost" }))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"]["content"], ANALYSIS_ERROR_MESSAGE);

    let (_, workflow) = send(&app, get("/api/workflow")).await;
    let stages: Vec<&str> = workflow
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|step| step["process"].as_str())
        .collect();
    assert_eq!(stages, vec!["Query Analysis", "Fetching User Profile", "Error"]);
}

#[tokio::test]
async fn test_blank_chat_message_rejected() {
    let app = app();
    let (status, body) = send(&app, post("/api/chat", json!({ "message": "   " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("must not be empty"));

    let (_, messages) = send(&app, get("/api/messages")).await;
    assert!(messages.as_array().unwrap().is_empty());
}

/// Holds every analysis until the test releases it
struct Gated {
    release: Arc<Notify>,
}

#[async_trait::async_trait]
impl Analyst for Gated {
    async fn analyze(&self, intent: &Intent) -> Result<AnalysisResult> {
        self.release.notified().await;
        Ok(AnalysisResult::new(
            intent.to_string(),
            AnalysisData::Search {
                repositories: vec![],
                query: intent.to_string(),
                total_count: 0,
            },
            "",
        ))
    }
}

#[tokio::test]
async fn test_workflow_readable_while_chat_in_flight() {
    let release = Arc::new(Notify::new());
    let app = api::router(AppState::new(ChatSession::new(
        Gated {
            release: Arc::clone(&release),
        },
        Formatter::default(),
    )));

    let pending = tokio::spawn({
        let app = app.clone();
        async move { send(&app, post("/api/chat", json!({ "message": "graph storage" }))).await }
    });

    let in_flight = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let (_, workflow) = send(&app, get("/api/workflow")).await;
            if workflow.as_array().map_or(0, Vec::len) == 2 {
                return workflow;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("workflow route blocked by the running chat");

    assert_eq!(in_flight[0]["process"], "Query Analysis");
    assert_eq!(in_flight[1]["process"], "Searching Repositories");

    let (_, messages) = send(&app, get("/api/messages")).await;
    assert_eq!(messages.as_array().unwrap().len(), 1);

    release.notify_one();
    let (status, body) = pending.await.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["workflow"].as_array().unwrap().len(), 5);
}
