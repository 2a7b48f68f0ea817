//! Main playlist checker implementation.
//!
//! This module provides the `PlaylistChecker` struct that ties together the
//! batch configuration, the HTTP prober and the bounded-concurrency scheduler.

use crate::concurrent::{ConcurrentProcessor, Progress};
use crate::error::PlaylistCheckError;
use crate::playlist::read_playlist;
use crate::prober::StreamProber;
use crate::report::BatchReport;
use crate::types::{CheckConfig, ProbeOutcome, ProbeTarget};
use futures::stream::Stream;
use std::path::Path;
use std::pin::Pin;

/// Main checker that coordinates probing of a batch of stream URLs.
///
/// The `PlaylistChecker` handles:
/// - Building one shared HTTP client from the configuration
/// - Admitting probes under the concurrency cap
/// - Producing the final [`BatchReport`]
///
/// # Example
///
/// ```rust,no_run
/// use playlist_check_lib::{PlaylistChecker, ProbeTarget};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let checker = PlaylistChecker::new()?;
///     let target = ProbeTarget::new("http://example.com/live.m3u8", "Example", 1);
///     let outcome = checker.check_target(&target).await;
///     println!("{}: {}", outcome.label, outcome.status);
///     Ok(())
/// }
/// ```
pub struct PlaylistChecker {
    /// Configuration settings for this checker instance
    config: CheckConfig,
    /// HTTP prober shared by all probes of a batch
    prober: StreamProber,
    /// Admission control for concurrent probes
    processor: ConcurrentProcessor,
}

impl PlaylistChecker {
    /// Create a new checker with default configuration.
    ///
    /// Default settings:
    /// - Concurrency: 10
    /// - Timeout: 10 seconds
    /// - Certificate validation: enabled
    pub fn new() -> Result<Self, PlaylistCheckError> {
        Self::with_config(CheckConfig::default())
    }

    /// Create a new checker with custom configuration.
    ///
    /// # Example
    ///
    /// ```rust
    /// use playlist_check_lib::{PlaylistChecker, CheckConfig};
    /// use std::time::Duration;
    ///
    /// let config = CheckConfig::default()
    ///     .with_concurrency(20)
    ///     .with_timeout(Duration::from_secs(5));
    ///
    /// let checker = PlaylistChecker::with_config(config).unwrap();
    /// assert_eq!(checker.config().concurrency, 20);
    /// ```
    pub fn with_config(config: CheckConfig) -> Result<Self, PlaylistCheckError> {
        let prober = StreamProber::new(&config)?;
        let processor = ConcurrentProcessor::new(config.concurrency);

        Ok(Self {
            config,
            prober,
            processor,
        })
    }

    /// Probe a single target.
    ///
    /// Never fails: every problem is classified into the returned outcome.
    pub async fn check_target(&self, target: &ProbeTarget) -> ProbeOutcome {
        self.prober.probe(target).await
    }

    /// Probe every target and collect the outcomes.
    ///
    /// Outcomes come back in completion order, not input order. Use
    /// `sequence_index` to restore the playlist order if needed.
    pub async fn check_targets(&self, targets: Vec<ProbeTarget>) -> Vec<ProbeOutcome> {
        self.check_targets_with_progress(targets, |_, _| {}).await
    }

    /// Probe every target, calling `on_complete` after each finished probe.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use playlist_check_lib::{PlaylistChecker, ProbeTarget, Reporter};
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let checker = PlaylistChecker::new()?;
    ///     let targets = vec![
    ///         ProbeTarget::new("http://example.com/a.m3u8", "A", 1),
    ///         ProbeTarget::new("bad-url", "B", 2),
    ///     ];
    ///
    ///     let outcomes = checker
    ///         .check_targets_with_progress(targets, |progress, outcome| {
    ///             println!("{}", Reporter::progress_line(progress.completed, progress.total, outcome));
    ///         })
    ///         .await;
    ///
    ///     println!("{}", Reporter::render(outcomes).render_text());
    ///     Ok(())
    /// }
    /// ```
    pub async fn check_targets_with_progress<C>(
        &self,
        targets: Vec<ProbeTarget>,
        on_complete: C,
    ) -> Vec<ProbeOutcome>
    where
        C: FnMut(Progress, &ProbeOutcome),
    {
        if targets.is_empty() {
            tracing::warn!("no stream URLs to test");
            return Vec::new();
        }

        let prober = &self.prober;
        self.processor
            .run_batch_with_progress(
                targets,
                move |target| async move { prober.probe(&target).await },
                on_complete,
            )
            .await
    }

    /// Probe targets and yield outcomes as they complete.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use playlist_check_lib::{PlaylistChecker, ProbeTarget};
    /// use futures::StreamExt;
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let checker = PlaylistChecker::new()?;
    ///     let targets = vec![ProbeTarget::new("http://example.com/a.m3u8", "A", 1)];
    ///
    ///     let mut stream = checker.check_targets_stream(targets);
    ///     while let Some(outcome) = stream.next().await {
    ///         println!("{}: {}", outcome.url, outcome.status);
    ///     }
    ///     Ok(())
    /// }
    /// ```
    pub fn check_targets_stream(
        &self,
        targets: Vec<ProbeTarget>,
    ) -> Pin<Box<dyn Stream<Item = ProbeOutcome> + Send + '_>> {
        let prober = &self.prober;
        let stream = self
            .processor
            .stream(targets, move |target| async move { prober.probe(&target).await });

        Box::pin(stream)
    }

    /// Read an M3U playlist, probe every stream URL in it and build the report.
    ///
    /// A playlist without stream URLs yields an empty report.
    ///
    /// # Errors
    ///
    /// Returns `PlaylistCheckError::FileError` if the file cannot be read.
    pub async fn check_playlist_file<P: AsRef<Path>>(
        &self,
        path: P,
    ) -> Result<BatchReport, PlaylistCheckError> {
        let targets = read_playlist(path.as_ref()).await?;
        let outcomes = self.check_targets(targets).await;
        Ok(BatchReport::from_outcomes(outcomes))
    }

    /// Get the current configuration for this checker.
    pub fn config(&self) -> &CheckConfig {
        &self.config
    }

    /// Replace the configuration, rebuilding the HTTP client.
    pub fn set_config(&mut self, config: CheckConfig) -> Result<(), PlaylistCheckError> {
        self.prober = StreamProber::new(&config)?;
        self.processor = ConcurrentProcessor::new(config.concurrency);
        self.config = config;
        Ok(())
    }
}
