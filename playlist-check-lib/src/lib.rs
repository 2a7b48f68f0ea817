//! # Playlist Check Library
//!
//! A fast, bounded-concurrency health checker for playlist stream URLs.
//!
//! Each stream URL gets exactly one `HEAD` request. The outcome is classified
//! into a closed status set (`VALID`, `FORBIDDEN`, `NOT_FOUND`, `REDIRECT`,
//! `HTTP_<code>`, `TIMEOUT`, `CONNECTION_ERROR`, `INVALID_URL`) and the batch
//! is summarised in a deterministic text report.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use playlist_check_lib::{CheckConfig, PlaylistChecker};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = CheckConfig::default()
//!         .with_concurrency(20)
//!         .with_timeout(Duration::from_secs(5));
//!     let checker = PlaylistChecker::with_config(config)?;
//!
//!     let report = checker.check_playlist_file("channels.m3u").await?;
//!     println!("{}", report.render_text());
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Single HEAD probe**: no body download, redirects are reported, not followed
//! - **Bounded concurrency**: a fixed cap on in-flight requests
//! - **Streaming results**: outcomes are available as soon as each probe completes
//! - **Configurable**: TOML files and `PC_*` environment variables

// Re-export main public API types and functions
pub use checker::PlaylistChecker;
pub use concurrent::{ConcurrentProcessor, Progress};
pub use config::{
    load_env_config, parse_timeout_string, ConfigManager, DefaultsConfig, EnvConfig, FileConfig,
    OutputConfig,
};
pub use error::PlaylistCheckError;
pub use playlist::{extract_targets, read_playlist, targets_from_urls, UNKNOWN_LABEL};
pub use prober::{parse_probe_url, StreamProber};
pub use report::{
    fit_label, status_symbol, BatchReport, Reporter, StatusCount, INVALID_SYMBOL,
    PROGRESS_LABEL_WIDTH, VALID_SYMBOL,
};
pub use types::{
    CheckConfig, FailureKind, ProbeOutcome, ProbeStatus, ProbeTarget, DEFAULT_USER_AGENT,
};

// Internal modules - these are not part of the public API
mod checker;
mod concurrent;
mod config;
mod error;
mod playlist;
mod prober;
mod report;
mod types;

// Type alias for convenience
pub type Result<T> = std::result::Result<T, PlaylistCheckError>;

// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
