//! Pretty-mode display logic for the playlist-check CLI.
//!
//! This module handles terminal output: progress lines (plain or colored),
//! the `--pretty` header, and the end-of-run summaries. Uses only the
//! `console` crate for styling.

use console::{style, StyledObject};
use playlist_check_lib::{
    fit_label, status_symbol, BatchReport, CheckConfig, ProbeOutcome, ProbeStatus, Progress,
    Reporter, PROGRESS_LABEL_WIDTH,
};
use std::path::Path;
use std::time::Duration;

use crate::{format_label_list, ErrorStats};

// ── Header ───────────────────────────────────────────────────────────────────

/// Print a styled header at the start of a pretty run.
pub fn print_header(target_count: usize, config: &CheckConfig) {
    println!(
        "{} {} {}",
        style("playlist-check").bold(),
        style(format!("v{}", env!("CARGO_PKG_VERSION"))).dim(),
        style(format!(
            "- Checking {} stream{}",
            target_count,
            if target_count == 1 { "" } else { "s" }
        ))
        .dim(),
    );

    let mut meta_parts = vec![
        format!("Concurrency: {}", config.concurrency),
        format!("Timeout: {}ms", config.timeout.as_millis()),
    ];
    if config.accept_invalid_certs {
        meta_parts.push("TLS verification off".to_string());
    }

    println!("{}", style(meta_parts.join(" | ")).dim());
    println!();
}

// ── Progress line ────────────────────────────────────────────────────────────

/// Print one progress line for a finished probe.
///
/// Plain mode prints exactly `Reporter::progress_line`; pretty mode prints
/// the same fields with colors.
pub fn print_progress(progress: Progress, outcome: &ProbeOutcome, pretty: bool) {
    if pretty {
        println!("{}", pretty_progress_line(progress, outcome));
    } else {
        println!(
            "{}",
            Reporter::progress_line(progress.completed, progress.total, outcome)
        );
    }
}

fn pretty_progress_line(progress: Progress, outcome: &ProbeOutcome) -> String {
    let counter = style(format!("[{}/{}]", progress.completed, progress.total)).dim();
    let symbol = status_style(outcome.status, status_symbol(outcome.status).to_string());
    let label = fit_label(&outcome.label, PROGRESS_LABEL_WIDTH);
    let status = status_style(outcome.status, outcome.status.to_string()).bold();

    match outcome.elapsed_seconds {
        Some(secs) if outcome.is_valid() => format!(
            "{} {} {} - {} {}",
            counter,
            symbol,
            label,
            status,
            style(format!("{:.2}s", secs)).dim()
        ),
        _ => format!("{} {} {} - {}", counter, symbol, label, status),
    }
}

fn status_style(status: ProbeStatus, text: String) -> StyledObject<String> {
    match status {
        ProbeStatus::Valid => style(text).green(),
        ProbeStatus::Redirect | ProbeStatus::Forbidden => style(text).yellow(),
        _ => style(text).red(),
    }
}

// ── Summary ──────────────────────────────────────────────────────────────────

/// Print the final summary bar with colored counts.
pub fn print_summary(report: &BatchReport, duration: Duration, report_path: &Path) {
    println!(
        "  {}",
        style("────────────────────────────────────────────────────").dim()
    );
    println!(
        "  {} stream{} in {:.1}s  {}  {}  {}  {}  {}  {}",
        style(report.total_count()).bold(),
        if report.total_count() == 1 { "" } else { "s" },
        duration.as_secs_f64(),
        style("|").dim(),
        style(format!("{} valid", report.valid_count())).green(),
        style("|").dim(),
        style(format!("{} invalid", report.invalid_count())).red(),
        style("|").dim(),
        style(format!("{} success", report.success_rate_display())).cyan(),
    );
    println!(
        "  {} {}",
        style("Report:").dim(),
        style(report_path.display()).underlined()
    );
}

// ── Error summary ────────────────────────────────────────────────────────────

/// Print failed streams grouped by failure kind.
pub fn print_error_summary(error_stats: &ErrorStats) {
    let categories = error_stats.categories();
    if categories.is_empty() {
        return;
    }

    println!();
    println!("  {}", style("Some streams failed:").yellow());

    for (kind, labels) in categories {
        println!(
            "  {} {} {}: {}",
            style("•").dim(),
            labels.len(),
            kind,
            format_label_list(labels, 5),
        );
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
