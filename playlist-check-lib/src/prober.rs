//! Single-target existence checks.
//!
//! The prober issues exactly one `HEAD` request per target and folds every
//! possible failure into a classified [`ProbeOutcome`]. It holds no state
//! between calls besides the shared HTTP client, so it can be driven from
//! any number of concurrent call sites.

use crate::error::PlaylistCheckError;
use crate::types::{CheckConfig, ProbeOutcome, ProbeStatus, ProbeTarget};
use std::fmt::Write;
use std::time::{Duration, Instant};
use url::Url;

/// HTTP prober for stream URLs.
#[derive(Clone)]
pub struct StreamProber {
    /// HTTP client shared by every probe (cheap to clone, pooled connections)
    http_client: reqwest::Client,
    /// Deadline for one request, dispatch to response headers
    timeout: Duration,
}

impl StreamProber {
    /// Create a prober from a batch configuration.
    ///
    /// Redirects are never followed: a 3xx answer is itself the result.
    pub fn new(config: &CheckConfig) -> Result<Self, PlaylistCheckError> {
        let http_client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .redirect(reqwest::redirect::Policy::none())
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()?;

        Ok(Self {
            http_client,
            timeout: config.timeout,
        })
    }

    /// Configured per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Probe one target. Never fails.
    pub async fn probe(&self, target: &ProbeTarget) -> ProbeOutcome {
        let url = match parse_probe_url(&target.url) {
            Ok(url) => url,
            Err(detail) => {
                tracing::debug!(url = %target.url, %detail, "rejected before dispatch");
                return ProbeOutcome::failed(target, ProbeStatus::InvalidUrl, detail);
            }
        };

        tracing::debug!(url = %url, scheme = url.scheme(), "dispatching HEAD probe");

        let start = Instant::now();
        let request = self.http_client.head(url).send();

        // Dropping the send future on expiry aborts the request.
        let outcome = match tokio::time::timeout(self.timeout, request).await {
            Ok(Ok(response)) => {
                ProbeOutcome::responded(target, response.status().as_u16(), start.elapsed())
            }
            Ok(Err(e)) if e.is_timeout() => self.timed_out(target),
            Ok(Err(e)) => {
                ProbeOutcome::failed(target, ProbeStatus::ConnectionError, error_chain(&e))
            }
            Err(_) => self.timed_out(target),
        };

        tracing::debug!(
            url = %target.url,
            status = %outcome.status,
            code = ?outcome.http_status_code,
            "probe finished"
        );

        outcome
    }

    fn timed_out(&self, target: &ProbeTarget) -> ProbeOutcome {
        ProbeOutcome::failed(
            target,
            ProbeStatus::Timeout,
            format!("Request timeout after {}ms", self.timeout.as_millis()),
        )
    }
}

/// Parse a playlist URL and make sure it can be probed over HTTP(S).
pub fn parse_probe_url(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw).map_err(|e| e.to_string())?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(format!("unsupported URL scheme '{}'", other)),
    }
}

/// Flatten an error and its sources into one line.
fn error_chain(mut err: &(dyn std::error::Error + 'static)) -> String {
    let mut s = err.to_string();
    while let Some(src) = err.source() {
        let _ = write!(s, ": {}", src);
        err = src;
    }
    s
}
