use crate::error::{Result, ScopeError};
use chrono::Local;
use env_logger::{Builder, Env};
use log::{self, LevelFilter};
use std::io::Write;
use tracing_subscriber::EnvFilter;
use yansi::Paint;

/// Initializes `log` output for the CLI.
///
/// `RUST_LOG` wins over `log_level` when set. Valid levels are error, warn,
/// info, debug and trace.
pub fn init(log_level: &str) -> Result<()> {
    let env = Env::default()
        .filter_or("RUST_LOG", log_level)
        .write_style_or("RUST_LOG_STYLE", "auto");

    Builder::from_env(env)
        .format(|buf, record| writeln!(buf, "{}", format_log(record)))
        .try_init()
        .map_err(|e| ScopeError::Config(format!("logger already initialized: {}", e)))
}

/// Initializes `tracing` output for the HTTP server
pub fn init_tracing(log_level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .map_err(|e| ScopeError::Config(format!("invalid log filter: {}", e)))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .try_init()
        .map_err(|e| ScopeError::Config(format!("tracing already initialized: {}", e)))
}

/// Formats a record as `[timestamp] LEVEL [target] message`
pub fn format_log(record: &log::Record) -> String {
    let level = match record.level() {
        log::Level::Error => Paint::red("ERROR").bold(),
        log::Level::Warn => Paint::yellow("WARN ").bold(),
        log::Level::Info => Paint::cyan("INFO ").bold(),
        log::Level::Debug => Paint::blue("DEBUG").bold(),
        log::Level::Trace => Paint::new("TRACE"),
    };

    let target = match record.target() {
        "" => record.module_path().unwrap_or("gitscope"),
        target => target,
    };

    format!(
        "[{}] {} [{}] {}",
        Local::now().format("%H:%M:%S%.3f"),
        level,
        target,
        record.args()
    )
}

/// Parses a log level name, `None` for anything unknown
pub fn parse_log_level(level: &str) -> Option<LevelFilter> {
    match level.trim().to_lowercase().as_str() {
        "off" => Some(LevelFilter::Off),
        "error" => Some(LevelFilter::Error),
        "warn" | "warning" => Some(LevelFilter::Warn),
        "info" => Some(LevelFilter::Info),
        "debug" => Some(LevelFilter::Debug),
        "trace" => Some(LevelFilter::Trace),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("error", LevelFilter::Error)]
    #[test_case("Warning", LevelFilter::Warn)]
    #[test_case(" info ", LevelFilter::Info)]
    #[test_case("TRACE", LevelFilter::Trace)]
    fn test_parse_log_level(input: &str, expected: LevelFilter) {
        assert_eq!(parse_log_level(input), Some(expected));
    }

    #[test]
    fn test_unknown_level() {
        assert_eq!(parse_log_level("verbose"), None);
    }

    #[test]
    fn test_format_log_contains_target_and_message() {
        let line = format_log(
            &log::Record::builder()
                .args(format_args!("fetched {} repos", 3))
                .level(log::Level::Info)
                .target("gitscope::github")
                .build(),
        );
        assert!(line.contains("[gitscope::github]"));
        assert!(line.ends_with("fetched 3 repos"));
    }
}
