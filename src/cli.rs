use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use crate::analyzer::{Analyzer, DEFAULT_LEADING_ARGS, DEFAULT_PROGRAM};

const BUILD_INFO_HUMAN: &str = env!("BUILD_INFO_HUMAN");

#[derive(Parser, Debug)]
#[command(name = "pana-scores")]
#[command(
    about = "Run pana on a Dart package and post its health and maintenance scores as a pull request comment"
)]
#[command(long_version = BUILD_INFO_HUMAN)]
struct CliArgs {
    /// Path of the package to analyze
    #[arg(value_name = "PACKAGE")]
    package: PathBuf,

    /// JSON payload of the triggering GitHub event
    #[arg(long, env = "EVENT_PAYLOAD", hide_env_values = true)]
    event_payload: Option<String>,

    /// File holding the triggering GitHub event (used when no inline payload is given)
    #[arg(long, env = "GITHUB_EVENT_PATH", value_name = "FILE")]
    event_path: Option<PathBuf>,

    /// Token used to post the comment
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    github_token: Option<String>,

    /// Program that launches pana
    #[arg(long, value_name = "PROGRAM", default_value = DEFAULT_PROGRAM)]
    analyzer_program: String,

    /// Argument passed to the analyzer program before the pana flags (can specify multiple)
    #[arg(
        long = "analyzer-arg",
        value_name = "ARG",
        allow_hyphen_values = true,
        default_values = DEFAULT_LEADING_ARGS
    )]
    analyzer_args: Vec<String>,

    /// Print the comment instead of posting it
    #[arg(long)]
    dry_run: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

/// Where the triggering event payload comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum EventSource {
    Inline(String),
    File(PathBuf),
    Missing,
}

/// Everything a run needs, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub package: PathBuf,
    pub event: EventSource,
    pub github_token: Option<String>,
    pub analyzer: Analyzer,
    pub dry_run: bool,
    pub debug: bool,
}

impl From<CliArgs> for Config {
    fn from(cli: CliArgs) -> Self {
        // An inline payload wins; Actions always sets GITHUB_EVENT_PATH.
        let event = match (cli.event_payload, cli.event_path) {
            (Some(payload), _) if !payload.trim().is_empty() => EventSource::Inline(payload),
            (_, Some(path)) => EventSource::File(path),
            _ => EventSource::Missing,
        };

        Config {
            package: cli.package,
            event,
            github_token: cli.github_token.filter(|t| !t.trim().is_empty()),
            analyzer: Analyzer::new(cli.analyzer_program, cli.analyzer_args),
            dry_run: cli.dry_run,
            debug: cli.debug,
        }
    }
}

/// Parses command-line arguments (and their environment fallbacks) into a
/// run configuration.
pub fn parse_args<I, T>(args: I) -> Result<Config>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = CliArgs::try_parse_from(args)?;
    Ok(cli.into())
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn test_package_path_is_required() {
        let err = parse_args(["pana-scores"]).unwrap_err();
        let clap_err = err.downcast_ref::<clap::Error>().unwrap();
        assert_eq!(
            clap_err.kind(),
            clap::error::ErrorKind::MissingRequiredArgument
        );
    }

    #[test]
    fn test_inline_payload_preferred_over_path() {
        let config = parse_args([
            "pana-scores",
            "packages/core",
            "--event-payload",
            "{}",
            "--event-path",
            "/tmp/event.json",
        ])
        .unwrap();

        assert_eq!(config.package, Path::new("packages/core"));
        assert_eq!(config.event, EventSource::Inline("{}".to_string()));
    }

    #[test]
    fn test_blank_inline_payload_falls_back_to_path() {
        let config = parse_args([
            "pana-scores",
            ".",
            "--event-payload",
            "  ",
            "--event-path",
            "/tmp/event.json",
        ])
        .unwrap();

        assert_eq!(
            config.event,
            EventSource::File(PathBuf::from("/tmp/event.json"))
        );
    }

    #[test]
    fn test_analyzer_overrides() {
        let config = parse_args([
            "pana-scores",
            ".",
            "--event-payload",
            "{}",
            "--analyzer-program",
            "dart",
            "--analyzer-arg",
            "pub",
            "--analyzer-arg",
            "global",
            "--analyzer-arg",
            "run",
            "--analyzer-arg",
            "pana",
            "--dry-run",
            "--debug",
        ])
        .unwrap();

        assert_eq!(config.analyzer, Analyzer::new("dart", DEFAULT_LEADING_ARGS));
        assert!(config.dry_run);
        assert!(config.debug);
    }

    #[test]
    fn test_default_analyzer() {
        let config = parse_args(["pana-scores", ".", "--event-payload", "{}"]).unwrap();
        assert_eq!(config.analyzer, Analyzer::default());
        assert!(!config.dry_run);
    }

    #[test]
    fn test_explicit_token() {
        let config =
            parse_args(["pana-scores", ".", "--github-token", "ghp_test", "--event-payload", "{}"])
                .unwrap();
        assert_eq!(config.github_token.as_deref(), Some("ghp_test"));
    }
}
