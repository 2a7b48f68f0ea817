//! Playlist Check CLI Application
//!
//! A command-line interface for checking which stream URLs in M3U playlists
//! still answer. This CLI application provides a user-friendly interface to
//! the playlist-check-lib library.

mod ui;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::Parser;
use playlist_check_lib::{load_env_config, parse_timeout_string, ConfigManager, EnvConfig, FileConfig};
use playlist_check_lib::{read_playlist, targets_from_urls, BatchReport, PlaylistCheckError};
use playlist_check_lib::{CheckConfig, FailureKind, PlaylistChecker, ProbeOutcome, ProbeTarget};
use std::path::PathBuf;
use std::process;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// Default location of the text report.
const DEFAULT_REPORT_PATH: &str = "validation_report.txt";

/// Label given to targets passed with `--url`.
const AD_HOC_LABEL: &str = "Ad-hoc URL";

/// Exit code used by `--strict` when at least one stream is invalid.
const EXIT_INVALID_STREAMS: i32 = 2;

/// CLI arguments for playlist-check
#[derive(Parser, Debug)]
#[command(name = "playlist-check")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "Sai Dutt G.V <gvs46@protonmail.com>")]
#[command(about = "Check which stream URLs in M3U playlists are still alive")]
#[command(
    long_about = "Check which stream URLs in M3U playlists are still alive.\n\nEvery URL gets a single HEAD request. Results stream in as they complete and a full report is written at the end."
)]
#[command(styles = STYLES)]
pub struct Args {
    /// M3U playlist files to check
    #[arg(value_name = "PLAYLIST", help_heading = "Input")]
    pub playlists: Vec<String>,

    /// Stream URL to check directly (repeatable)
    #[arg(short = 'u', long = "url", value_name = "URL", action = clap::ArgAction::Append, help_heading = "Input")]
    pub urls: Vec<String>,

    /// Max concurrent probes (default: 10, max: 100)
    #[arg(short = 'c', long = "concurrency", help_heading = "Probing")]
    pub concurrency: Option<usize>,

    /// Per-request timeout, e.g. 500ms, 10s, 2m (default: 10s)
    #[arg(short = 't', long = "timeout", value_name = "DURATION", help_heading = "Probing")]
    pub timeout: Option<String>,

    /// User-Agent header sent with every probe
    #[arg(long = "user-agent", value_name = "UA", help_heading = "Probing")]
    pub user_agent: Option<String>,

    /// Accept invalid TLS certificates
    #[arg(short = 'k', long = "insecure", help_heading = "Probing")]
    pub insecure: bool,

    /// Where to write the text report (default: validation_report.txt)
    #[arg(short = 'o', long = "output", value_name = "FILE", help_heading = "Output")]
    pub output: Option<String>,

    /// Print the report as JSON instead of progress lines
    #[arg(short = 'j', long = "json", help_heading = "Output")]
    pub json: bool,

    /// Colored progress lines and a styled summary
    #[arg(short = 'p', long = "pretty", help_heading = "Output")]
    pub pretty: bool,

    /// Suppress progress lines and the summary
    #[arg(short = 'q', long = "quiet", help_heading = "Output")]
    pub quiet: bool,

    /// Exit with status 2 when any stream is invalid
    #[arg(long = "strict", help_heading = "Output")]
    pub strict: bool,

    /// Use specific config file instead of automatic discovery
    #[arg(long = "config", value_name = "FILE", help_heading = "Configuration")]
    pub config: Option<String>,

    /// Show debug logging on stderr
    #[arg(short = 'd', long = "debug", help_heading = "Configuration")]
    pub debug: bool,

    /// Verbose logging
    #[arg(short = 'v', long = "verbose", help_heading = "Configuration")]
    pub verbose: bool,
}

/// Output settings resolved from file, environment and CLI.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct OutputSettings {
    pub(crate) report_path: PathBuf,
    pub(crate) json_pretty: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            report_path: PathBuf::from(DEFAULT_REPORT_PATH),
            json_pretty: false,
        }
    }
}

/// Failed targets grouped by failure kind, for the end-of-run summary
#[derive(Debug, Default)]
pub(crate) struct ErrorStats {
    pub(crate) timeouts: Vec<String>,
    pub(crate) connection_errors: Vec<String>,
    pub(crate) http_errors: Vec<String>,
    pub(crate) invalid_urls: Vec<String>,
}

impl ErrorStats {
    fn from_outcomes(outcomes: &[ProbeOutcome]) -> Self {
        let mut stats = Self::default();
        for outcome in outcomes {
            stats.add_outcome(outcome);
        }
        stats
    }

    fn add_outcome(&mut self, outcome: &ProbeOutcome) {
        let bucket = match outcome.status.failure_kind() {
            Some(FailureKind::Timeout) => &mut self.timeouts,
            Some(FailureKind::ConnectionError) => &mut self.connection_errors,
            Some(FailureKind::HttpNonSuccess) => &mut self.http_errors,
            Some(FailureKind::InvalidUrl) => &mut self.invalid_urls,
            None => return,
        };
        bucket.push(outcome.label.clone());
    }

    fn has_errors(&self) -> bool {
        !self.categories().is_empty()
    }

    /// Non-empty categories in display order.
    pub(crate) fn categories(&self) -> Vec<(FailureKind, &[String])> {
        [
            (FailureKind::Timeout, self.timeouts.as_slice()),
            (FailureKind::ConnectionError, self.connection_errors.as_slice()),
            (FailureKind::HttpNonSuccess, self.http_errors.as_slice()),
            (FailureKind::InvalidUrl, self.invalid_urls.as_slice()),
        ]
        .into_iter()
        .filter(|(_, items)| !items.is_empty())
        .collect()
    }

    fn format_summary(&self) -> String {
        if !self.has_errors() {
            return String::new();
        }

        let mut summary = vec!["Some streams failed:".to_string()];
        for (kind, labels) in self.categories() {
            summary.push(format!(
                "- {} {}: {}",
                labels.len(),
                kind,
                format_label_list(labels, 5)
            ));
        }
        summary.join("\n")
    }
}

/// Join labels, collapsing everything past `max_show` into "... and N more".
pub(crate) fn format_label_list(labels: &[String], max_show: usize) -> String {
    if labels.len() <= max_show {
        labels.join(", ")
    } else {
        let shown = &labels[..max_show];
        let remaining = labels.len() - max_show;
        format!("{}, ... and {} more", shown.join(", "), remaining)
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Validate arguments
    if let Err(e) = validate_args(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    init_tracing(&args);
    tracing::info!("playlist-check v{} starting", env!("CARGO_PKG_VERSION"));

    match run_playlist_check(args).await {
        Ok(0) => {}
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

/// Validate command line arguments
fn validate_args(args: &Args) -> Result<(), String> {
    if args.playlists.is_empty() && args.urls.is_empty() {
        return Err("You must specify a playlist file or at least one --url".to_string());
    }

    if let Some(concurrency) = args.concurrency {
        if concurrency == 0 || concurrency > 100 {
            return Err("Concurrency must be between 1 and 100".to_string());
        }
    }

    if let Some(timeout) = &args.timeout {
        if parse_timeout_string(timeout).is_none() {
            return Err(format!(
                "Invalid timeout '{}'. Use format like '500ms', '10s', '2m'",
                timeout
            ));
        }
    }

    if let Some(user_agent) = &args.user_agent {
        if user_agent.trim().is_empty() {
            return Err("User agent cannot be empty".to_string());
        }
    }

    if args.quiet && args.pretty {
        return Err("Cannot specify both --quiet and --pretty".to_string());
    }

    Ok(())
}

/// Install the stderr log subscriber. `RUST_LOG` wins over the flags.
fn init_tracing(args: &Args) {
    let default_level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else {
        "warn"
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Main playlist checking logic. Returns the process exit code.
async fn run_playlist_check(args: Args) -> Result<i32, Box<dyn std::error::Error>> {
    let (config, output) = build_config(&args)?;
    let targets = collect_targets(&args).await?;

    if targets.is_empty() {
        if args.json {
            eprintln!("No stream URLs found to test");
        } else {
            println!("No stream URLs found to test");
        }
        return Ok(0);
    }

    let show_progress = !args.quiet && !args.json;
    if show_progress && args.pretty {
        ui::print_header(targets.len(), &config);
    }

    let checker = PlaylistChecker::with_config(config)?;
    let start = Instant::now();
    let outcomes = checker
        .check_targets_with_progress(targets, |progress, outcome| {
            if show_progress {
                ui::print_progress(progress, outcome, args.pretty);
            }
        })
        .await;
    let elapsed = start.elapsed();

    let error_stats = ErrorStats::from_outcomes(&outcomes);
    let report = BatchReport::from_outcomes(outcomes);
    write_report(&report, &output).await?;

    if args.json {
        let json = if output.json_pretty {
            serde_json::to_string_pretty(&report)?
        } else {
            serde_json::to_string(&report)?
        };
        println!("{}", json);
    } else if !args.quiet {
        if args.pretty {
            println!();
            ui::print_summary(&report, elapsed, &output.report_path);
            ui::print_error_summary(&error_stats);
        } else {
            println!();
            println!("Total: {}", report.total_count());
            println!("Valid: {}", report.valid_count());
            println!("Invalid: {}", report.invalid_count());
            println!("Success rate: {}", report.success_rate_display());
            let summary = error_stats.format_summary();
            if !summary.is_empty() {
                println!("{}", summary);
            }
            println!("Report written to {}", output.report_path.display());
        }
    }

    if args.strict && report.invalid_count() > 0 {
        return Ok(EXIT_INVALID_STREAMS);
    }

    Ok(0)
}

/// Read every playlist, then append `--url` targets, numbering the whole batch 1..=N.
async fn collect_targets(args: &Args) -> Result<Vec<ProbeTarget>, PlaylistCheckError> {
    let mut targets = Vec::new();

    for playlist in &args.playlists {
        targets.extend(read_playlist(playlist).await?);
    }

    targets.extend(targets_from_urls(&args.urls, AD_HOC_LABEL, 0));

    for (i, target) in targets.iter_mut().enumerate() {
        target.sequence_index = i + 1;
    }

    Ok(targets)
}

async fn write_report(report: &BatchReport, output: &OutputSettings) -> Result<(), PlaylistCheckError> {
    tokio::fs::write(&output.report_path, report.render_text())
        .await
        .map_err(|e| {
            PlaylistCheckError::file_error(output.report_path.display().to_string(), e.to_string())
        })?;

    tracing::info!(path = %output.report_path.display(), "report written");
    Ok(())
}

fn build_config(
    args: &Args,
) -> Result<(CheckConfig, OutputSettings), Box<dyn std::error::Error>> {
    let config_manager = ConfigManager::new();
    let env_config = load_env_config();

    // Step 1: Determine config file path and load config files
    let file_config = if let Some(explicit_config_path) = &args.config {
        tracing::info!("using explicit config file (CLI --config): {}", explicit_config_path);
        config_manager
            .load_file(explicit_config_path)
            .map_err(|e| format!("Failed to load config file '{}': {}", explicit_config_path, e))?
    } else if let Some(env_config_path) = &env_config.config {
        tracing::info!("using explicit config file (PC_CONFIG): {}", env_config_path);
        config_manager
            .load_file(env_config_path)
            .map_err(|e| format!("Failed to load config file '{}': {}", env_config_path, e))?
    } else {
        config_manager.discover_and_load()?
    };

    let (config, output) = merge_file_config_into_check_config(
        CheckConfig::default(),
        OutputSettings::default(),
        file_config,
    );

    // Step 2: Apply environment variables (PC_*)
    let (config, output) = apply_environment_config(config, output, &env_config);

    // Step 3: Apply CLI arguments (highest precedence)
    Ok(apply_cli_args_to_config(config, output, args))
}

/// Merge FileConfig into CheckConfig
fn merge_file_config_into_check_config(
    mut config: CheckConfig,
    mut output: OutputSettings,
    file_config: FileConfig,
) -> (CheckConfig, OutputSettings) {
    if let Some(defaults) = file_config.defaults {
        if let Some(concurrency) = defaults.concurrency {
            config = config.with_concurrency(concurrency);
        }
        // Already validated when the file was loaded
        if let Some(timeout) = defaults.timeout.as_deref().and_then(parse_timeout_string) {
            config = config.with_timeout(timeout);
        }
        if let Some(user_agent) = defaults.user_agent {
            config = config.with_user_agent(user_agent);
        }
        if let Some(insecure) = defaults.insecure {
            config = config.with_accept_invalid_certs(insecure);
        }
    }

    if let Some(file_output) = file_config.output {
        if let Some(report_path) = file_output.report_path {
            output.report_path = PathBuf::from(report_path);
        }
        if let Some(json_pretty) = file_output.json_pretty {
            output.json_pretty = json_pretty;
        }
    }

    (config, output)
}

/// Apply PC_* environment variables on top of file settings.
fn apply_environment_config(
    mut config: CheckConfig,
    mut output: OutputSettings,
    env_config: &EnvConfig,
) -> (CheckConfig, OutputSettings) {
    if let Some(concurrency) = env_config.concurrency {
        config = config.with_concurrency(concurrency);
    }
    if let Some(timeout) = env_config.timeout {
        config = config.with_timeout(timeout);
    }
    if let Some(user_agent) = &env_config.user_agent {
        config = config.with_user_agent(user_agent.clone());
    }
    if let Some(insecure) = env_config.insecure {
        config = config.with_accept_invalid_certs(insecure);
    }
    if let Some(report_path) = &env_config.output {
        output.report_path = PathBuf::from(report_path);
    }

    (config, output)
}

/// Apply CLI arguments to config (highest precedence).
///
/// Only flags the user actually passed override lower layers.
fn apply_cli_args_to_config(
    mut config: CheckConfig,
    mut output: OutputSettings,
    args: &Args,
) -> (CheckConfig, OutputSettings) {
    if let Some(concurrency) = args.concurrency {
        config = config.with_concurrency(concurrency);
    }
    if let Some(timeout) = args.timeout.as_deref().and_then(parse_timeout_string) {
        config = config.with_timeout(timeout);
    }
    if let Some(user_agent) = &args.user_agent {
        config = config.with_user_agent(user_agent.clone());
    }
    if args.insecure {
        config = config.with_accept_invalid_certs(true);
    }
    if let Some(report_path) = &args.output {
        output.report_path = PathBuf::from(report_path);
    }

    (config, output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use playlist_check_lib::{DefaultsConfig, OutputConfig, ProbeStatus};
    use std::time::Duration;

    fn create_test_args() -> Args {
        Args {
            playlists: vec!["channels.m3u".to_string()],
            urls: vec![],
            concurrency: None,
            timeout: None,
            user_agent: None,
            insecure: false,
            output: None,
            json: false,
            pretty: false,
            quiet: false,
            strict: false,
            config: None,
            debug: false,
            verbose: false,
        }
    }

    fn outcome(label: &str, status: ProbeStatus) -> ProbeOutcome {
        let target = ProbeTarget::new("http://x.test/", label, 1);
        match status {
            ProbeStatus::Valid => ProbeOutcome::responded(&target, 200, Duration::from_millis(10)),
            other => ProbeOutcome::failed(&target, other, "failed"),
        }
    }

    #[test]
    fn test_validate_args_requires_input() {
        let mut args = create_test_args();
        args.playlists.clear();

        let result = validate_args(&args);
        assert!(result.unwrap_err().contains("--url"));

        args.urls = vec!["http://a.test/".to_string()];
        assert!(validate_args(&args).is_ok());
    }

    #[test]
    fn test_validate_args_concurrency_range() {
        let mut args = create_test_args();
        args.concurrency = Some(0);
        assert!(validate_args(&args).is_err());

        args.concurrency = Some(101);
        assert!(validate_args(&args).is_err());

        args.concurrency = Some(100);
        assert!(validate_args(&args).is_ok());
    }

    #[test]
    fn test_validate_args_bad_timeout() {
        let mut args = create_test_args();
        args.timeout = Some("fast".to_string());
        assert!(validate_args(&args).unwrap_err().contains("Invalid timeout"));
    }

    #[test]
    fn test_validate_args_quiet_and_pretty_conflict() {
        let mut args = create_test_args();
        args.quiet = true;
        args.pretty = true;
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_config_precedence_file_env_cli() {
        let file_config = FileConfig {
            defaults: Some(DefaultsConfig {
                concurrency: Some(5),
                timeout: Some("3s".to_string()),
                user_agent: Some("File/1.0".to_string()),
                insecure: Some(true),
            }),
            output: Some(OutputConfig {
                report_path: Some("file.txt".to_string()),
                json_pretty: Some(true),
            }),
        };
        let (config, output) = merge_file_config_into_check_config(
            CheckConfig::default(),
            OutputSettings::default(),
            file_config,
        );
        assert_eq!(config.concurrency, 5);
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert!(config.accept_invalid_certs);
        assert!(output.json_pretty);

        let env_config = EnvConfig {
            concurrency: Some(7),
            output: Some("env.txt".to_string()),
            ..Default::default()
        };
        let (config, output) = apply_environment_config(config, output, &env_config);
        assert_eq!(config.concurrency, 7);
        assert_eq!(config.user_agent, "File/1.0");
        assert_eq!(output.report_path, PathBuf::from("env.txt"));

        let mut args = create_test_args();
        args.timeout = Some("250ms".to_string());
        args.output = Some("cli.txt".to_string());
        let (config, output) = apply_cli_args_to_config(config, output, &args);
        assert_eq!(config.concurrency, 7); // Not passed on CLI, env value kept
        assert_eq!(config.timeout, Duration::from_millis(250));
        assert_eq!(output.report_path, PathBuf::from("cli.txt"));
        assert!(output.json_pretty);
    }

    #[test]
    fn test_insecure_flag_only_enables() {
        let args = create_test_args();
        let config = CheckConfig::default().with_accept_invalid_certs(true);

        let (config, _) = apply_cli_args_to_config(config, OutputSettings::default(), &args);
        assert!(
            config.accept_invalid_certs,
            "Config insecure=true should be preserved when --insecure is not passed"
        );
    }

    #[test]
    fn test_defaults_without_any_layer() {
        let (config, output) = apply_cli_args_to_config(
            CheckConfig::default(),
            OutputSettings::default(),
            &create_test_args(),
        );
        assert_eq!(config.concurrency, 10);
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(output.report_path, PathBuf::from(DEFAULT_REPORT_PATH));
    }

    #[tokio::test]
    async fn test_collect_targets_numbers_whole_batch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("list.m3u");
        std::fs::write(&path, "#EXTM3U\n#EXTINF:-1,One\nhttp://a.test/\n").unwrap();

        let mut args = create_test_args();
        args.playlists = vec![path.to_string_lossy().to_string()];
        args.urls = vec!["http://b.test/".to_string()];

        let targets = collect_targets(&args).await.unwrap();
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].label, "One");
        assert_eq!(targets[1].label, AD_HOC_LABEL);
        assert_eq!(targets[1].sequence_index, 2);
    }

    #[test]
    fn test_error_stats_grouping() {
        let outcomes = vec![
            outcome("ok", ProbeStatus::Valid),
            outcome("slow", ProbeStatus::Timeout),
            outcome("gone", ProbeStatus::NotFound),
            outcome("boom", ProbeStatus::Http(500)),
            outcome("junk", ProbeStatus::InvalidUrl),
        ];

        let stats = ErrorStats::from_outcomes(&outcomes);
        assert!(stats.has_errors());
        assert_eq!(stats.timeouts, vec!["slow"]);
        assert_eq!(stats.http_errors, vec!["gone", "boom"]);
        assert_eq!(stats.invalid_urls, vec!["junk"]);
        assert!(stats.connection_errors.is_empty());

        let summary = stats.format_summary();
        assert!(summary.starts_with("Some streams failed:"));
        assert!(summary.contains("- 2 HTTP error: gone, boom"));
        assert!(summary.contains("- 1 timeout: slow"));
    }

    #[test]
    fn test_error_stats_truncation() {
        let mut stats = ErrorStats::default();
        for i in 0..8 {
            stats.add_outcome(&outcome(&format!("ch{}", i), ProbeStatus::ConnectionError));
        }

        let summary = stats.format_summary();
        assert!(summary.contains("8 connection error:"));
        assert!(summary.contains("... and 3 more"));
    }

    #[test]
    fn test_error_stats_empty_when_all_valid() {
        let stats = ErrorStats::from_outcomes(&[outcome("ok", ProbeStatus::Valid)]);
        assert!(!stats.has_errors());
        assert_eq!(stats.format_summary(), "");
    }
}
