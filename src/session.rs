//! Chat session state: the message log and the workflow log.
//!
//! A session owns both sequences exclusively. Messages are append-only for
//! the lifetime of the session; the workflow log is reset by every query.

use crate::agent::GitHubAgent;
use crate::analysis::AnalysisResult;
use crate::classifier::{Intent, IntentKind, QueryClassifier};
use crate::error::{Result, ScopeError};
use crate::formatter::Formatter;
use crate::llm::TextGenerator;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, error, warn};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::Mutex as AsyncMutex;
use uuid::Uuid;

/// Reply sent when the analysis fails; the underlying error is only logged
pub const ANALYSIS_ERROR_MESSAGE: &str = "❌ **GitHub Analysis Error**\n\n\
Sorry, something went wrong while analyzing the GitHub data.\n\n\
This may be due to an invalid repository/user name, API rate limits, or network issues. \
Please check your input and try again.";

/// Example queries offered to new users
pub const SUGGESTIONS: &[&str] = &[
    "microsoft/vscode",
    "@gaearon",
    "trending typescript",
    "data visualization react",
];

const STEP_INPUT: &str = "GitHub Query";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One entry of the chat log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Named stages shown in the progress display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStage {
    QueryAnalysis,
    FetchingRepository,
    FetchingUser,
    FetchingTrending,
    SearchingRepositories,
    ProcessingData,
    GeneratingInsights,
    FormattingResults,
    Error,
}

impl WorkflowStage {
    /// Fetch stage for an intent kind
    pub fn fetching(kind: IntentKind) -> Self {
        match kind {
            IntentKind::Repository => WorkflowStage::FetchingRepository,
            IntentKind::User => WorkflowStage::FetchingUser,
            IntentKind::Trending => WorkflowStage::FetchingTrending,
            IntentKind::Search => WorkflowStage::SearchingRepositories,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            WorkflowStage::QueryAnalysis => "Query Analysis",
            WorkflowStage::FetchingRepository => "Fetching Repository Data",
            WorkflowStage::FetchingUser => "Fetching User Profile",
            WorkflowStage::FetchingTrending => "Fetching Trending Repositories",
            WorkflowStage::SearchingRepositories => "Searching Repositories",
            WorkflowStage::ProcessingData => "Processing Data",
            WorkflowStage::GeneratingInsights => "Generating AI Insights",
            WorkflowStage::FormattingResults => "Formatting Results",
            WorkflowStage::Error => "Error",
        }
    }

    /// Output text used when the step carries no specific detail
    pub fn default_output(&self) -> &'static str {
        match self {
            WorkflowStage::QueryAnalysis => {
                "Analyzing your query to determine intent (repository, user, trending, or search)..."
            }
            WorkflowStage::FetchingRepository => "Fetching repository data from GitHub...",
            WorkflowStage::FetchingUser => "Fetching user profile and statistics from GitHub...",
            WorkflowStage::FetchingTrending => "Fetching trending repositories from GitHub...",
            WorkflowStage::SearchingRepositories => "Searching repositories on GitHub...",
            WorkflowStage::ProcessingData => "Processing and structuring the data...",
            WorkflowStage::GeneratingInsights => "Generating insights using the language model...",
            WorkflowStage::FormattingResults => "Formatting the results for display...",
            WorkflowStage::Error => "An error occurred during analysis.",
        }
    }
}

/// One entry of the workflow log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowStep {
    pub id: String,
    pub stage: WorkflowStage,
    pub process: String,
    pub input: String,
    pub output: String,
    pub timestamp: DateTime<Utc>,
}

impl WorkflowStep {
    pub fn new(stage: WorkflowStage, output: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            stage,
            process: stage.label().to_string(),
            input: STEP_INPUT.to_string(),
            output: output.unwrap_or_else(|| stage.default_output().to_string()),
            timestamp: Utc::now(),
        }
    }
}

/// Produces analysis results for classified intents
#[async_trait]
pub trait Analyst: Send + Sync {
    async fn analyze(&self, intent: &Intent) -> Result<AnalysisResult>;
}

#[async_trait]
impl<G: TextGenerator> Analyst for GitHubAgent<G> {
    async fn analyze(&self, intent: &Intent) -> Result<AnalysisResult> {
        GitHubAgent::analyze(self, intent).await
    }
}

/// Assistant reply plus the workflow recorded while producing it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    pub message: ChatMessage,
    pub workflow: Vec<WorkflowStep>,
}

#[derive(Debug, Default)]
struct Transcript {
    messages: Vec<ChatMessage>,
    workflow: Vec<WorkflowStep>,
}

/// A single chat conversation.
///
/// Queries are answered one at a time. The logs sit behind their own lock,
/// which is never held across an analysis, so readers see each workflow step
/// as soon as it is recorded.
pub struct ChatSession<A> {
    analyst: A,
    classifier: QueryClassifier,
    formatter: Formatter,
    transcript: Mutex<Transcript>,
    turn: AsyncMutex<()>,
}

impl<A: Analyst> ChatSession<A> {
    pub fn new(analyst: A, formatter: Formatter) -> Self {
        Self {
            analyst,
            classifier: QueryClassifier::new(),
            formatter,
            transcript: Mutex::new(Transcript::default()),
            turn: AsyncMutex::new(()),
        }
    }

    /// Snapshot of the chat log
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.transcript().messages.clone()
    }

    /// Steps recorded so far for the most recent query
    pub fn workflow(&self) -> Vec<WorkflowStep> {
        self.transcript().workflow.clone()
    }

    /// Answers one user message.
    ///
    /// Analysis failures never surface as errors here: they produce the
    /// generic error reply and an `Error` workflow step. Only blank input is
    /// rejected, before anything is recorded.
    pub async fn send(&self, text: &str) -> Result<Reply> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ScopeError::Validation("message must not be empty".into()));
        }

        let _turn = self.turn.lock().await;
        {
            let mut transcript = self.transcript();
            transcript.messages.push(ChatMessage::user(text));
            transcript.workflow.clear();
        }
        self.record(WorkflowStage::QueryAnalysis, None);

        let intent = self.classifier.classify(text);
        debug!("classified {:?} as {}", text, intent.kind());
        self.record(WorkflowStage::fetching(intent.kind()), Some(intent.describe()));

        let content = match self.analyst.analyze(&intent).await {
            Ok(result) => {
                self.record(WorkflowStage::ProcessingData, None);
                self.record(WorkflowStage::GeneratingInsights, None);
                self.record(WorkflowStage::FormattingResults, None);
                self.formatter.format(&result, intent.kind())
            }
            Err(e) => {
                if e.is_github() || e.is_transient() {
                    warn!("GitHub query {:?} failed: {}", text, e);
                } else {
                    error!("Error processing GitHub query {:?}: {}", text, e);
                }
                self.record(WorkflowStage::Error, None);
                ANALYSIS_ERROR_MESSAGE.to_string()
            }
        };

        let message = ChatMessage::assistant(content);
        let mut transcript = self.transcript();
        transcript.messages.push(message.clone());
        Ok(Reply {
            message,
            workflow: transcript.workflow.clone(),
        })
    }

    fn record(&self, stage: WorkflowStage, output: Option<String>) {
        self.transcript().workflow.push(WorkflowStep::new(stage, output));
    }

    fn transcript(&self) -> MutexGuard<'_, Transcript> {
        self.transcript.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
