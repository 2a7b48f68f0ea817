//! Batch aggregation and report rendering.
//!
//! A [`BatchReport`] is built once from the complete outcome set and never
//! changes afterwards. Rendering is a pure function of the outcome sequence,
//! so the same outcomes always produce byte-identical text.

use crate::types::{ProbeOutcome, ProbeStatus};
use serde::Serialize;
use std::fmt;

/// Width of `=` and `-` rule lines in the text report.
const RULE_WIDTH: usize = 60;

/// Label column width of progress lines.
pub const PROGRESS_LABEL_WIDTH: usize = 40;

/// Symbol shown for working streams.
pub const VALID_SYMBOL: char = '✓';

/// Symbol shown for every other status.
pub const INVALID_SYMBOL: char = '✗';

/// One histogram bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub status: ProbeStatus,
    pub count: usize,
}

/// Aggregate result of a finished batch.
///
/// Fields are read through accessors so the cached text always matches
/// the aggregates it was rendered from.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    total_count: usize,
    valid_count: usize,
    invalid_count: usize,
    success_rate_percent: Option<f64>,
    status_histogram: Vec<StatusCount>,
    valid: Vec<ProbeOutcome>,
    invalid: Vec<ProbeOutcome>,

    #[serde(skip)]
    text: String,
}

impl BatchReport {
    /// Aggregate a complete outcome sequence.
    pub fn from_outcomes(outcomes: Vec<ProbeOutcome>) -> Self {
        let total_count = outcomes.len();
        let status_histogram = histogram(&outcomes);

        let (valid, invalid): (Vec<_>, Vec<_>) =
            outcomes.into_iter().partition(ProbeOutcome::is_valid);

        let valid_count = valid.len();
        let success_rate_percent = if total_count == 0 {
            None
        } else {
            let rate = valid_count as f64 / total_count as f64 * 100.0;
            Some((rate * 100.0).round() / 100.0)
        };

        let mut report = Self {
            total_count,
            valid_count,
            invalid_count: total_count - valid_count,
            success_rate_percent,
            status_histogram,
            valid,
            invalid,
            text: String::new(),
        };
        report.text = report.to_string();
        report
    }

    /// Number of outcomes (one per target).
    pub fn total_count(&self) -> usize {
        self.total_count
    }

    /// Outcomes with status `VALID`.
    pub fn valid_count(&self) -> usize {
        self.valid_count
    }

    /// `total_count - valid_count`.
    pub fn invalid_count(&self) -> usize {
        self.invalid_count
    }

    /// `valid / total * 100`, two decimals; `None` when the batch was empty.
    pub fn success_rate_percent(&self) -> Option<f64> {
        self.success_rate_percent
    }

    /// Status buckets by descending count, ties in first-seen order.
    pub fn status_histogram(&self) -> &[StatusCount] {
        &self.status_histogram
    }

    /// Working streams, in the order they were received.
    pub fn valid(&self) -> &[ProbeOutcome] {
        &self.valid
    }

    /// Everything else, in the order they were received.
    pub fn invalid(&self) -> &[ProbeOutcome] {
        &self.invalid
    }

    /// Whether the batch had no targets at all.
    pub fn is_empty(&self) -> bool {
        self.total_count == 0
    }

    /// The rendered plain-text report.
    pub fn render_text(&self) -> &str {
        &self.text
    }

    /// Success rate as shown to humans.
    pub fn success_rate_display(&self) -> String {
        match self.success_rate_percent {
            Some(rate) => format!("{:.2}%", rate),
            None => "N/A (no data)".to_string(),
        }
    }

    /// Count for one status, 0 when absent.
    pub fn count_of(&self, status: ProbeStatus) -> usize {
        self.status_histogram
            .iter()
            .find(|bucket| bucket.status == status)
            .map(|bucket| bucket.count)
            .unwrap_or(0)
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let heavy = "=".repeat(RULE_WIDTH);
        let light = "-".repeat(RULE_WIDTH);

        writeln!(f, "{}", heavy)?;
        writeln!(f, "STREAM VALIDATION REPORT")?;
        writeln!(f, "{}", heavy)?;
        writeln!(f)?;
        writeln!(f, "Total URLs tested: {}", self.total_count)?;
        writeln!(f, "Valid:             {}", self.valid_count)?;
        writeln!(f, "Invalid:           {}", self.invalid_count)?;
        writeln!(f, "Success rate:      {}", self.success_rate_display())?;
        writeln!(f)?;

        section_header(f, &light, &format!("VALID LINKS ({})", self.valid_count))?;
        if self.valid.is_empty() {
            writeln!(f, "(none)")?;
        }
        for outcome in &self.valid {
            writeln!(f, "{} {}", VALID_SYMBOL, outcome.label)?;
            writeln!(f, "  URL:  {}", outcome.url)?;
            match outcome.elapsed_seconds {
                Some(secs) => writeln!(f, "  Time: {:.2}s", secs)?,
                None => writeln!(f, "  Time: -")?,
            }
        }
        writeln!(f)?;

        section_header(f, &light, &format!("INVALID LINKS ({})", self.invalid_count))?;
        if self.invalid.is_empty() {
            writeln!(f, "(none)")?;
        }
        for outcome in &self.invalid {
            writeln!(f, "{} {}", INVALID_SYMBOL, outcome.label)?;
            writeln!(f, "  URL:    {}", outcome.url)?;
            writeln!(f, "  Status: {}", outcome.status)?;
            if let Some(code) = outcome.http_status_code {
                writeln!(f, "  HTTP:   {}", code)?;
            }
            if let Some(detail) = &outcome.error_detail {
                writeln!(f, "  Error:  {}", detail)?;
            }
        }
        writeln!(f)?;

        section_header(f, &light, "STATUS BREAKDOWN")?;
        if self.status_histogram.is_empty() {
            writeln!(f, "(none)")?;
        }
        for bucket in &self.status_histogram {
            writeln!(f, "{}: {}", bucket.status, bucket.count)?;
        }
        writeln!(f, "{}", heavy)
    }
}

fn section_header(f: &mut fmt::Formatter<'_>, rule: &str, title: &str) -> fmt::Result {
    writeln!(f, "{}", rule)?;
    writeln!(f, "{}", title)?;
    writeln!(f, "{}", rule)
}

/// Count statuses; descending by count, ties keep first-encountered order.
fn histogram(outcomes: &[ProbeOutcome]) -> Vec<StatusCount> {
    let mut buckets: Vec<StatusCount> = Vec::new();
    for outcome in outcomes {
        match buckets.iter_mut().find(|b| b.status == outcome.status) {
            Some(bucket) => bucket.count += 1,
            None => buckets.push(StatusCount {
                status: outcome.status,
                count: 1,
            }),
        }
    }
    // Stable sort keeps insertion order among equal counts
    buckets.sort_by(|a, b| b.count.cmp(&a.count));
    buckets
}

/// Entry point matching the reporter role of the pipeline.
pub struct Reporter;

impl Reporter {
    /// Build the final report from every outcome of a batch.
    pub fn render(outcomes: Vec<ProbeOutcome>) -> BatchReport {
        BatchReport::from_outcomes(outcomes)
    }

    /// One live progress line:
    /// `[<completed>/<total>] <symbol> <label padded to 40> - <status>`.
    pub fn progress_line(completed: usize, total: usize, outcome: &ProbeOutcome) -> String {
        format!(
            "[{}/{}] {} {} - {}",
            completed,
            total,
            status_symbol(outcome.status),
            fit_label(&outcome.label, PROGRESS_LABEL_WIDTH),
            outcome.status
        )
    }
}

/// Symbol distinguishing `VALID` from every other status.
pub fn status_symbol(status: ProbeStatus) -> char {
    if status.is_valid() {
        VALID_SYMBOL
    } else {
        INVALID_SYMBOL
    }
}

/// Pad or truncate to exactly `width` characters.
pub fn fit_label(label: &str, width: usize) -> String {
    let truncated: String = label.chars().take(width).collect();
    format!("{:<width$}", truncated, width = width)
}
