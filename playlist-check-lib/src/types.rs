//! Core data types for stream URL probing.
//!
//! This module defines the main data structures used throughout the library:
//! probe targets, classified outcomes, the status taxonomy and the checker
//! configuration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default user agent sent with every probe.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (IPTV-Validator/1.0)";

/// One playlist entry scheduled for a single existence check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeTarget {
    /// Stream URL as written in the playlist (not yet validated)
    pub url: String,

    /// Channel / display name, may be empty
    pub label: String,

    /// 1-based position in the original batch, used for display ordering only
    pub sequence_index: usize,
}

impl ProbeTarget {
    /// Create a new probe target.
    pub fn new<U: Into<String>, L: Into<String>>(url: U, label: L, sequence_index: usize) -> Self {
        Self {
            url: url.into(),
            label: label.into(),
            sequence_index,
        }
    }
}

/// Classified status of one probe.
///
/// The set is closed: every probe resolves to exactly one of these. Codes that
/// have no dedicated variant are carried by `Http`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum ProbeStatus {
    /// The URL could not be parsed; no request was made
    InvalidUrl,
    /// Server answered 200
    Valid,
    /// Server answered 403
    Forbidden,
    /// Server answered 404
    NotFound,
    /// Server answered 300-399
    Redirect,
    /// Any other HTTP status code
    Http(u16),
    /// No response inside the configured window
    Timeout,
    /// DNS, TCP or TLS level failure
    ConnectionError,
}

/// Coarse failure taxonomy used for error summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Malformed input, detected before any network activity
    InvalidUrl,
    /// No response within the configured window
    Timeout,
    /// DNS/TCP/TLS-level failure
    ConnectionError,
    /// A response arrived but it was not a 200
    HttpNonSuccess,
}

impl ProbeStatus {
    /// Classify a received HTTP status code.
    ///
    /// First match wins: 200, 403, 404, then the whole 3xx range, then
    /// everything else as `Http(code)`.
    pub fn from_http_code(code: u16) -> Self {
        match code {
            200 => Self::Valid,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            300..=399 => Self::Redirect,
            other => Self::Http(other),
        }
    }

    /// Whether this status counts as a working stream.
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// Failure category, `None` for `Valid`.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Valid => None,
            Self::InvalidUrl => Some(FailureKind::InvalidUrl),
            Self::Timeout => Some(FailureKind::Timeout),
            Self::ConnectionError => Some(FailureKind::ConnectionError),
            Self::Forbidden | Self::NotFound | Self::Redirect | Self::Http(_) => {
                Some(FailureKind::HttpNonSuccess)
            }
        }
    }
}

impl fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidUrl => write!(f, "INVALID_URL"),
            Self::Valid => write!(f, "VALID"),
            Self::Forbidden => write!(f, "FORBIDDEN"),
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::Redirect => write!(f, "REDIRECT"),
            Self::Http(code) => write!(f, "HTTP_{}", code),
            Self::Timeout => write!(f, "TIMEOUT"),
            Self::ConnectionError => write!(f, "CONNECTION_ERROR"),
        }
    }
}

impl FromStr for ProbeStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INVALID_URL" => Ok(Self::InvalidUrl),
            "VALID" => Ok(Self::Valid),
            "FORBIDDEN" => Ok(Self::Forbidden),
            "NOT_FOUND" => Ok(Self::NotFound),
            "REDIRECT" => Ok(Self::Redirect),
            "TIMEOUT" => Ok(Self::Timeout),
            "CONNECTION_ERROR" => Ok(Self::ConnectionError),
            other => other
                .strip_prefix("HTTP_")
                .filter(|code| code.len() == 3)
                .and_then(|code| code.parse::<u16>().ok())
                .filter(|&code| Self::from_http_code(code) == Self::Http(code))
                .map(Self::Http)
                .ok_or_else(|| format!("Unknown probe status '{}'", other)),
        }
    }
}

impl From<ProbeStatus> for String {
    fn from(status: ProbeStatus) -> Self {
        status.to_string()
    }
}

impl TryFrom<String> for ProbeStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid URL"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::ConnectionError => write!(f, "connection error"),
            FailureKind::HttpNonSuccess => write!(f, "HTTP error"),
        }
    }
}

/// Terminal, classified result of probing one target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeOutcome {
    /// The URL that was probed
    pub url: String,

    /// Label copied from the target
    pub label: String,

    /// Position of the target in the original batch
    pub sequence_index: usize,

    /// Classified status
    pub status: ProbeStatus,

    /// HTTP status code, present only when a response was received
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status_code: Option<u16>,

    /// Seconds from dispatch to response headers, rounded to 2 decimals.
    /// Present only when a response was received.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_seconds: Option<f64>,

    /// Human-readable cause, present only on failure statuses
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
}

impl ProbeOutcome {
    /// Outcome for a target that got no HTTP response.
    pub fn failed<D: Into<String>>(target: &ProbeTarget, status: ProbeStatus, detail: D) -> Self {
        Self {
            url: target.url.clone(),
            label: target.label.clone(),
            sequence_index: target.sequence_index,
            status,
            http_status_code: None,
            elapsed_seconds: None,
            error_detail: Some(detail.into()),
        }
    }

    /// Outcome for a target whose server sent a response.
    pub fn responded(target: &ProbeTarget, code: u16, elapsed: Duration) -> Self {
        let status = ProbeStatus::from_http_code(code);
        Self {
            url: target.url.clone(),
            label: target.label.clone(),
            sequence_index: target.sequence_index,
            status,
            http_status_code: Some(code),
            elapsed_seconds: Some(round_secs(elapsed)),
            error_detail: if status.is_valid() {
                None
            } else {
                Some(format!("HTTP {}", code))
            },
        }
    }

    /// Whether the target is a working stream.
    pub fn is_valid(&self) -> bool {
        self.status.is_valid()
    }
}

/// Round a duration to seconds with two decimal places.
pub(crate) fn round_secs(elapsed: Duration) -> f64 {
    (elapsed.as_secs_f64() * 100.0).round() / 100.0
}

/// Configuration options for a probing batch.
///
/// Passed into the checker once at batch start; nothing in the library
/// reads configuration from global state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckConfig {
    /// Maximum number of probes in flight at once
    /// Default: 10, Minimum: 1
    pub concurrency: usize,

    /// Per-request timeout
    /// Default: 10 seconds
    #[serde(skip)] // Don't serialize Duration directly
    pub timeout: Duration,

    /// User-Agent header sent with every probe
    pub user_agent: String,

    /// Accept invalid TLS certificates (many IPTV hosts use self-signed ones)
    /// Default: false
    pub accept_invalid_certs: bool,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            concurrency: 10,
            timeout: Duration::from_secs(10),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_invalid_certs: false,
        }
    }
}

impl CheckConfig {
    /// Set the concurrency cap.
    ///
    /// Raised to 1 if zero. Upper limits are enforced by CLI and config
    /// validation, not here.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the User-Agent header value.
    pub fn with_user_agent<S: Into<String>>(mut self, user_agent: S) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Accept or reject invalid TLS certificates.
    pub fn with_accept_invalid_certs(mut self, enabled: bool) -> Self {
        self.accept_invalid_certs = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_priority() {
        assert_eq!(ProbeStatus::from_http_code(200), ProbeStatus::Valid);
        assert_eq!(ProbeStatus::from_http_code(403), ProbeStatus::Forbidden);
        assert_eq!(ProbeStatus::from_http_code(404), ProbeStatus::NotFound);
        assert_eq!(ProbeStatus::from_http_code(300), ProbeStatus::Redirect);
        assert_eq!(ProbeStatus::from_http_code(301), ProbeStatus::Redirect);
        assert_eq!(ProbeStatus::from_http_code(399), ProbeStatus::Redirect);
        assert_eq!(ProbeStatus::from_http_code(204), ProbeStatus::Http(204));
        assert_eq!(ProbeStatus::from_http_code(500), ProbeStatus::Http(500));
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(ProbeStatus::Http(500).to_string(), "HTTP_500");
        assert_eq!(ProbeStatus::InvalidUrl.to_string(), "INVALID_URL");
        assert_eq!(ProbeStatus::ConnectionError.to_string(), "CONNECTION_ERROR");
        assert_eq!("HTTP_503".parse::<ProbeStatus>(), Ok(ProbeStatus::Http(503)));
        assert_eq!("NOT_FOUND".parse::<ProbeStatus>(), Ok(ProbeStatus::NotFound));
        assert!("HTTP_5".parse::<ProbeStatus>().is_err());
        assert!("BROKEN".parse::<ProbeStatus>().is_err());
    }

    #[test]
    fn test_named_codes_rejected_as_http_labels() {
        for label in ["HTTP_200", "HTTP_403", "HTTP_404", "HTTP_302", "HTTP_300", "HTTP_399"] {
            assert!(label.parse::<ProbeStatus>().is_err(), "{} accepted", label);
        }
        assert_eq!("HTTP_500".parse::<ProbeStatus>(), Ok(ProbeStatus::Http(500)));
        assert_eq!("HTTP_204".parse::<ProbeStatus>(), Ok(ProbeStatus::Http(204)));
        assert!(serde_json::from_str::<ProbeStatus>("\"HTTP_200\"").is_err());
    }

    #[test]
    fn test_failed_outcome_has_no_response_fields() {
        let target = ProbeTarget::new("http://slow.test/a", "Slow", 3);
        let outcome =
            ProbeOutcome::failed(&target, ProbeStatus::Timeout, "Request timeout after 10ms");
        assert_eq!(outcome.status, ProbeStatus::Timeout);
        assert_eq!(outcome.http_status_code, None);
        assert_eq!(outcome.elapsed_seconds, None);
        assert_eq!(outcome.sequence_index, 3);
        assert_eq!(
            outcome.error_detail.as_deref(),
            Some("Request timeout after 10ms")
        );
    }

    #[test]
    fn test_status_serializes_as_label() {
        let json = serde_json::to_string(&ProbeStatus::Http(502)).unwrap();
        assert_eq!(json, "\"HTTP_502\"");
        let back: ProbeStatus = serde_json::from_str("\"TIMEOUT\"").unwrap();
        assert_eq!(back, ProbeStatus::Timeout);
    }

    #[test]
    fn test_failure_kind() {
        assert_eq!(ProbeStatus::Valid.failure_kind(), None);
        assert_eq!(
            ProbeStatus::Redirect.failure_kind(),
            Some(FailureKind::HttpNonSuccess)
        );
        assert_eq!(
            ProbeStatus::Http(418).failure_kind(),
            Some(FailureKind::HttpNonSuccess)
        );
        assert_eq!(
            ProbeStatus::InvalidUrl.failure_kind(),
            Some(FailureKind::InvalidUrl)
        );
    }

    #[test]
    fn test_responded_outcome_rounds_elapsed() {
        let target = ProbeTarget::new("http://ok.test/a", "A", 1);
        let outcome = ProbeOutcome::responded(&target, 200, Duration::from_millis(1234));
        assert_eq!(outcome.status, ProbeStatus::Valid);
        assert_eq!(outcome.http_status_code, Some(200));
        assert_eq!(outcome.elapsed_seconds, Some(1.23));
        assert_eq!(outcome.error_detail, None);

        let outcome = ProbeOutcome::responded(&target, 404, Duration::from_millis(5));
        assert_eq!(outcome.elapsed_seconds, Some(0.01));
        assert_eq!(outcome.error_detail.as_deref(), Some("HTTP 404"));
    }

    #[test]
    fn test_config_concurrency_minimum() {
        assert_eq!(CheckConfig::default().with_concurrency(0).concurrency, 1);
        assert_eq!(CheckConfig::default().with_concurrency(150).concurrency, 150);
        assert_eq!(CheckConfig::default().with_concurrency(500).concurrency, 500);
        assert_eq!(CheckConfig::default().concurrency, 10);
        assert_eq!(CheckConfig::default().timeout, Duration::from_secs(10));
    }
}
