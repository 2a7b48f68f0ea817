//! Error handling for batch-level operations.
//!
//! Individual probes never fail: every per-target problem becomes a
//! classified [`ProbeOutcome`](crate::ProbeOutcome). This type only covers
//! things that stop a batch from starting, such as an unreadable playlist,
//! a broken configuration file or an HTTP client that cannot be built.

use std::fmt;

/// Main error type for playlist checking operations.
#[derive(Debug, Clone)]
pub enum PlaylistCheckError {
    /// Configuration errors (invalid settings, unparsable file, etc.)
    ConfigError { message: String },

    /// File I/O errors when reading playlists or writing reports
    FileError { path: String, message: String },

    /// The HTTP client could not be constructed
    ClientBuild { message: String },
}

impl PlaylistCheckError {
    /// Create a new configuration error.
    pub fn config<M: Into<String>>(message: M) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a new file error.
    pub fn file_error<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::FileError {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for PlaylistCheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigError { message } => write!(f, "Configuration error: {}", message),
            Self::FileError { path, message } => write!(f, "File error at '{}': {}", path, message),
            Self::ClientBuild { message } => {
                write!(f, "Failed to create HTTP client: {}", message)
            }
        }
    }
}

impl std::error::Error for PlaylistCheckError {}

impl From<reqwest::Error> for PlaylistCheckError {
    fn from(err: reqwest::Error) -> Self {
        Self::ClientBuild {
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for PlaylistCheckError {
    fn from(err: toml::de::Error) -> Self {
        Self::ConfigError {
            message: format!("Failed to parse TOML configuration: {}", err),
        }
    }
}
