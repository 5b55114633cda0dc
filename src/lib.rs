//! gitscope - chat with GitHub
//!
//! Turns free-text queries such as `owner/repo`, `@username`,
//! `trending rust` or plain search terms into GitHub REST API calls, asks a
//! text-generation service for a short commentary and renders a Markdown
//! report.
//!
//! The pure core is three functions:
//! - [`classify`] maps text onto an [`Intent`]
//! - [`clean_insights`] reduces model output to a few closed sentences
//! - [`Formatter::format`] renders an [`AnalysisResult`]
//!
//! ## Usage
//! ```rust,ignore
//! use gitscope::{build_session, Config};
//!
//! async fn example() -> gitscope::Result<()> {
//!     let config = Config::load()?.with_env_overrides();
//!     let session = build_session(&config)?;
//!     let reply = session.send("rust-lang/rust").await?;
//!     println!("{}", reply.message.content);
//!     Ok(())
//! }
//! ```

/// Agent combining GitHub data with generated commentary
pub mod agent;
/// Per-request analysis payloads
pub mod analysis;
/// HTTP routes for the chat backend
pub mod api;
/// Query intent classification
pub mod classifier;
/// Configuration loading and validation
pub mod config;
/// Error handling types and utilities
pub mod error;
/// Markdown report rendering
pub mod formatter;
/// GitHub REST API client
pub mod github;
/// Cleanup of model output
pub mod insights;
/// Text-generation client
pub mod llm;
/// Logging configuration and utilities
pub mod logging;
/// Prompt templates
pub mod prompts;
/// Chat session and workflow log
pub mod session;

pub use agent::GitHubAgent;
pub use analysis::{AnalysisData, AnalysisResult};
pub use classifier::{classify, Intent, IntentKind, QueryClassifier};
pub use config::Config;
pub use error::{Result, ScopeError};
pub use formatter::{FormatRules, Formatter};
pub use github::GitHubClient;
pub use insights::{clean_insights, InsightRules};
pub use llm::{GeminiClient, TextGenerator};
pub use session::{Analyst, ChatMessage, ChatSession, Reply, WorkflowStep};

/// Session type used by the binaries
pub type GitHubSession = ChatSession<GitHubAgent<GeminiClient>>;

/// Wires a validated configuration into a ready chat session
pub fn build_session(config: &Config) -> Result<GitHubSession> {
    config.validate()?;

    let github = GitHubClient::new(&config.github)?;
    let generator = GeminiClient::new(&config.llm)?;
    let agent = GitHubAgent::new(github, generator).with_time_range(config.report.time_range);
    let formatter = Formatter::new(FormatRules::from_settings(&config.report));

    Ok(ChatSession::new(agent, formatter))
}
