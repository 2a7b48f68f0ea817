//! M3U playlist extraction.
//!
//! Turns playlist text into an ordered list of [`ProbeTarget`]s. This is a
//! line-oriented scan, not a full M3U parser: only `#EXTINF` display names
//! and stream URL lines matter here.

use crate::error::PlaylistCheckError;
use crate::types::ProbeTarget;
use std::path::Path;

/// Label used when an entry has no `#EXTINF` name.
pub const UNKNOWN_LABEL: &str = "Unknown Channel";

/// Extract probe targets from M3U playlist content.
///
/// Rules:
/// - blank lines and the `#EXTM3U` header are skipped
/// - `#EXTINF:` sets the label of the next URL (text after the first comma)
/// - any other `#` line is a comment; commented-out `#http…` URLs are
///   disabled channels and are not probed
/// - every remaining line is a stream URL, validated later by the prober
pub fn extract_targets(content: &str) -> Vec<ProbeTarget> {
    let mut targets = Vec::new();
    let mut pending_label: Option<String> = None;

    for line in content.lines() {
        let line = line.trim();

        if line.is_empty() {
            continue;
        }

        if let Some(extinf) = line.strip_prefix("#EXTINF") {
            pending_label = extinf
                .split_once(',')
                .map(|(_, name)| name.trim().to_string())
                .filter(|name| !name.is_empty());
            continue;
        }

        if line.starts_with("#http") {
            // A disabled entry consumes its label
            pending_label = None;
            continue;
        }

        if line.starts_with('#') {
            continue;
        }

        let label = pending_label
            .take()
            .unwrap_or_else(|| UNKNOWN_LABEL.to_string());
        targets.push(ProbeTarget::new(line, label, targets.len() + 1));
    }

    targets
}

/// Read a playlist file and extract its targets.
pub async fn read_playlist<P: AsRef<Path>>(path: P) -> Result<Vec<ProbeTarget>, PlaylistCheckError> {
    let path = path.as_ref();
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| PlaylistCheckError::file_error(path.display().to_string(), e.to_string()))?;

    let targets = extract_targets(&content);
    tracing::info!(path = %path.display(), count = targets.len(), "playlist loaded");
    Ok(targets)
}

/// Build targets from ad-hoc URLs, continuing the numbering after `offset`.
pub fn targets_from_urls<S: AsRef<str>>(urls: &[S], label: &str, offset: usize) -> Vec<ProbeTarget> {
    urls.iter()
        .map(|url| url.as_ref().trim())
        .filter(|url| !url.is_empty())
        .enumerate()
        .map(|(i, url)| ProbeTarget::new(url, label, offset + i + 1))
        .collect()
}
