use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use colored::*;
use gitscope::{
    build_session, classify,
    config::Config,
    github::TimeRange,
    logging,
    session::{Reply, WorkflowStage, WorkflowStep, SUGGESTIONS},
    GitHubSession,
};
use indicatif::{ProgressBar, ProgressStyle};
use log::debug;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a TOML config file (defaults to the user config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level: error, warn, info, debug or trace
    #[arg(short, long, global = true, value_parser = parse_level)]
    log_level: Option<String>,

    /// Creation window for trending queries: daily, weekly or monthly
    #[arg(long, global = true)]
    since: Option<TimeRange>,

    /// Maximum number of insight bullets per report
    #[arg(long, global = true)]
    max_insights: Option<usize>,

    /// Print the workflow steps after each answer
    #[arg(short, long, global = true)]
    workflow: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Answer a single query and exit
    Ask {
        #[arg(required = true)]
        query: Vec<String>,
    },
    /// Start an interactive chat (default)
    Chat,
    /// Show how a query would be interpreted, without any network access
    Classify {
        #[arg(required = true)]
        query: Vec<String>,
    },
}

fn parse_level(value: &str) -> Result<String, String> {
    logging::parse_log_level(value)
        .map(|_| value.trim().to_lowercase())
        .ok_or_else(|| format!("unknown log level '{}'", value))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Some(Command::Classify { query }) = &cli.command {
        print_intent(&query.join(" "));
        return Ok(());
    }

    let config = load_config(&cli)?;
    logging::init(cli.log_level.as_deref().unwrap_or(config.log_level()))?;
    debug!("Loaded configuration: {:?}", config.report);

    let session = build_session(&config).context("Invalid configuration")?;

    match cli.command {
        Some(Command::Ask { query }) => {
            let reply = answer(&session, &query.join(" "), cli.workflow).await?;
            if reply.workflow.last().map(|step| step.stage) == Some(WorkflowStage::Error) {
                bail!("analysis failed");
            }
        }
        Some(Command::Classify { .. }) => {}
        Some(Command::Chat) | None => run_chat(&session, cli.workflow).await?,
    }

    Ok(())
}

/// Loads the config file, then applies environment and flag overrides
fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::load().context("Failed to load default config")?,
    };

    let mut config = config.with_env_overrides();
    if let Some(since) = cli.since {
        config.report.time_range = since;
    }
    if let Some(max) = cli.max_insights {
        config.report.max_insights = max;
    }
    Ok(config)
}

fn print_intent(query: &str) {
    let intent = classify(query.trim());
    println!("{} {}", "Intent:".bright_green().bold(), intent.to_string().bright_white());
    println!("{} {}", "Action:".bright_green().bold(), intent.describe());
}

/// Interactive read-answer loop
async fn run_chat(session: &GitHubSession, show_workflow: bool) -> anyhow::Result<()> {
    println!("\n{}", "Welcome to gitscope".bright_green().bold());
    println!("{}", "Ask about repositories, users, trending projects or anything on GitHub".bright_blue());
    println!("{}\n", "=====================================================".bright_yellow());
    print_suggestions();

    loop {
        println!("\n{}", "Enter a query (or 'q' to quit, 'h' for help):".bright_cyan());
        print!("{} ", ">".bright_green());
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        match input.to_lowercase().as_str() {
            "q" | "quit" | "exit" => {
                println!("{}", "Goodbye!".bright_green());
                break;
            }
            "h" | "help" | "?" => {
                print_help();
                continue;
            }
            "workflow" => {
                print_workflow(&session.workflow());
                continue;
            }
            _ => {}
        }

        let query = suggestion(input).unwrap_or(input);
        answer(session, query, show_workflow).await?;
    }

    Ok(())
}

/// Resolves `1`..`4` to the numbered suggestion
fn suggestion(input: &str) -> Option<&'static str> {
    let index: usize = input.parse().ok()?;
    SUGGESTIONS.get(index.checked_sub(1)?).copied()
}

async fn answer(session: &GitHubSession, query: &str, show_workflow: bool) -> anyhow::Result<Reply> {
    let spinner = create_spinner(format!("Analyzing {}", query));
    let reply = session.send(query).await;
    spinner.finish_and_clear();

    let reply = reply?;
    println!("\n{}\n", reply.message.content);

    if show_workflow {
        print_workflow(&reply.workflow);
    }
    Ok(reply)
}

fn create_spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .template("{spinner:.green} [{elapsed_precise}] {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["-", "\\", "|", "/", "-", "\\", "|", "/"]);
    pb.set_style(style);
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

fn print_suggestions() {
    println!("{}", "Try one of these:".bright_yellow());
    for (i, example) in SUGGESTIONS.iter().enumerate() {
        println!("  {} {}", format!("{}.", i + 1).bright_green(), example.bright_white());
    }
}

fn print_workflow(steps: &[WorkflowStep]) {
    if steps.is_empty() {
        println!("{}", "No workflow recorded yet.".dimmed());
        return;
    }
    println!("{}", "Workflow:".bright_yellow());
    for (i, step) in steps.iter().enumerate() {
        let label = if step.stage == WorkflowStage::Error {
            step.process.bright_red()
        } else {
            step.process.bright_cyan()
        };
        println!(
            "  {} {} {} {}",
            format!("{}.", i + 1).bright_green(),
            label,
            step.timestamp.format("%H:%M:%S").to_string().dimmed(),
            step.output
        );
    }
}

fn print_help() {
    println!("\n{}", "Commands:".bright_yellow());
    println!("  {:<10} - {}", "q".bright_green(), "Quit");
    println!("  {:<10} - {}", "h".bright_green(), "Show this help");
    println!("  {:<10} - {}", "workflow".bright_green(), "Show the steps of the last query");
    println!("  {:<10} - {}", "1-4".bright_green(), "Run a suggested query");
    println!("\n{}", "Query forms:".bright_yellow());
    println!("  owner/repo            analyze a repository");
    println!("  @username             analyze a user");
    println!("  trending <language>   recently created, most starred repositories");
    println!("  anything else         repository search");
}
