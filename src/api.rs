//! HTTP surface for the chat backend.
//!
//! One [`ChatSession`] is shared by all requests. Chat requests are answered
//! one at a time, while the message and workflow routes read the logs
//! without waiting for the analysis in flight.

use crate::classifier::{classify, Intent};
use crate::error::ScopeError;
use crate::session::{Analyst, ChatMessage, ChatSession, Reply, WorkflowStep, SUGGESTIONS};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

/// Application state shared across handlers
pub struct AppState<A> {
    session: Arc<ChatSession<A>>,
}

impl<A> Clone for AppState<A> {
    fn clone(&self) -> Self {
        Self {
            session: Arc::clone(&self.session),
        }
    }
}

impl<A: Analyst> AppState<A> {
    pub fn new(session: ChatSession<A>) -> Self {
        Self {
            session: Arc::new(session),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClassifyRequest {
    pub query: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClassifyResponse {
    pub intent: Intent,
    /// Fetch the intent would trigger
    pub description: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

/// Error body returned as `{"error": "..."}`
#[derive(Debug)]
pub struct ApiError(ScopeError);

impl From<ScopeError> for ApiError {
    fn from(err: ScopeError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            ScopeError::Validation(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

/// Builds the router with all routes and middleware
pub fn router<A: Analyst + 'static>(state: AppState<A>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/suggestions", get(suggestions))
        .route("/api/classify", post(classify_query))
        .route("/api/chat", post(chat::<A>))
        .route("/api/messages", get(messages::<A>))
        .route("/api/workflow", get(workflow::<A>))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "gitscope",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn suggestions() -> Json<Vec<&'static str>> {
    Json(SUGGESTIONS.to_vec())
}

/// Classifies without touching the session
async fn classify_query(Json(request): Json<ClassifyRequest>) -> Json<ClassifyResponse> {
    let intent = classify(request.query.trim());
    Json(ClassifyResponse {
        description: intent.describe(),
        intent,
    })
}

async fn chat<A: Analyst + 'static>(
    State(state): State<AppState<A>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<Reply>, ApiError> {
    info!("Chat message received ({} chars)", request.message.len());
    Ok(Json(state.session.send(&request.message).await?))
}

async fn messages<A: Analyst + 'static>(State(state): State<AppState<A>>) -> Json<Vec<ChatMessage>> {
    Json(state.session.messages())
}

async fn workflow<A: Analyst + 'static>(State(state): State<AppState<A>>) -> Json<Vec<WorkflowStep>> {
    Json(state.session.workflow())
}
