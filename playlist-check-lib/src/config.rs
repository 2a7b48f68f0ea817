//! Configuration file parsing and management.
//!
//! This module handles loading configuration from TOML files and `PC_*`
//! environment variables, and merging configurations with proper precedence
//! rules. Applying the result to a [`CheckConfig`](crate::CheckConfig) is left
//! to the caller, which knows about its own command-line overrides.

use crate::error::PlaylistCheckError;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration loaded from TOML files.
///
/// ```toml
/// [defaults]
/// concurrency = 20
/// timeout = "5s"
/// user_agent = "MyChecker/2.0"
/// insecure = false
///
/// [output]
/// report_path = "reports/latest.txt"
/// json_pretty = true
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// Default values for probe options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,

    /// Report output preferences
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputConfig>,
}

/// Default configuration values that map to CLI options.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DefaultsConfig {
    /// Maximum number of probes in flight
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<usize>,

    /// Per-request timeout (as string, e.g. "500ms", "10s", "2m")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,

    /// User-Agent header sent with every probe
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    /// Accept invalid TLS certificates
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insecure: Option<bool>,
}

/// Output configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputConfig {
    /// Where the text report is written
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_path: Option<String>,

    /// Pretty-print JSON output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_pretty: Option<bool>,
}

/// Configuration discovery and loading functionality.
#[derive(Debug, Default)]
pub struct ConfigManager;

impl ConfigManager {
    /// Create a new configuration manager.
    pub fn new() -> Self {
        Self
    }

    /// Load configuration from a specific file.
    ///
    /// The file is validated after parsing; a file with out-of-range values
    /// is rejected as a whole.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<FileConfig, PlaylistCheckError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(PlaylistCheckError::file_error(
                path.to_string_lossy(),
                "Configuration file not found",
            ));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            PlaylistCheckError::file_error(
                path.to_string_lossy(),
                format!("Failed to read configuration file: {}", e),
            )
        })?;

        let config: FileConfig = toml::from_str(&content)?;
        self.validate_config(&config)?;

        tracing::debug!(path = %path.display(), "configuration file loaded");
        Ok(config)
    }

    /// Discover and load configuration files in precedence order.
    ///
    /// Lowest to highest: `$XDG_CONFIG_HOME/playlist-check/config.toml`,
    /// `~/.playlist-check.toml`, then `./playlist-check.toml` or
    /// `./.playlist-check.toml`. Discovered files that fail to load are
    /// skipped with a warning.
    pub fn discover_and_load(&self) -> Result<FileConfig, PlaylistCheckError> {
        let mut merged_config = FileConfig::default();
        let mut loaded_files = Vec::new();

        let candidates = [
            self.get_xdg_config_path(),
            self.get_global_config_path(),
            self.get_local_config_path(),
        ];

        for path in candidates.into_iter().flatten() {
            match self.load_file(&path) {
                Ok(config) => {
                    merged_config = self.merge_configs(merged_config, config);
                    loaded_files.push(path);
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "ignoring configuration file");
                }
            }
        }

        if loaded_files.len() > 1 {
            for path in &loaded_files {
                tracing::info!(path = %path.display(), "merged configuration file");
            }
        }

        Ok(merged_config)
    }

    /// Get the local configuration file path.
    fn get_local_config_path(&self) -> Option<PathBuf> {
        ["./playlist-check.toml", "./.playlist-check.toml"]
            .iter()
            .map(Path::new)
            .find(|path| path.exists())
            .map(Path::to_path_buf)
    }

    /// Get the global configuration file path in the user's home directory.
    fn get_global_config_path(&self) -> Option<PathBuf> {
        let home = env::var_os("HOME")?;

        [".playlist-check.toml", "playlist-check.toml"]
            .iter()
            .map(|candidate| Path::new(&home).join(candidate))
            .find(|path| path.exists())
    }

    /// Get the XDG configuration file path.
    fn get_xdg_config_path(&self) -> Option<PathBuf> {
        let config_dir = env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| Path::new(&home).join(".config")))?;

        let path = config_dir.join("playlist-check").join("config.toml");
        if path.exists() {
            Some(path)
        } else {
            None
        }
    }

    /// Merge two configurations with proper precedence.
    ///
    /// Values from `higher` take precedence over values from `lower`.
    pub fn merge_configs(&self, lower: FileConfig, higher: FileConfig) -> FileConfig {
        FileConfig {
            defaults: match (lower.defaults, higher.defaults) {
                (Some(lower_defaults), Some(higher_defaults)) => Some(DefaultsConfig {
                    concurrency: higher_defaults.concurrency.or(lower_defaults.concurrency),
                    timeout: higher_defaults.timeout.or(lower_defaults.timeout),
                    user_agent: higher_defaults.user_agent.or(lower_defaults.user_agent),
                    insecure: higher_defaults.insecure.or(lower_defaults.insecure),
                }),
                (lower_defaults, higher_defaults) => higher_defaults.or(lower_defaults),
            },
            output: match (lower.output, higher.output) {
                (Some(lower_output), Some(higher_output)) => Some(OutputConfig {
                    report_path: higher_output.report_path.or(lower_output.report_path),
                    json_pretty: higher_output.json_pretty.or(lower_output.json_pretty),
                }),
                (lower_output, higher_output) => higher_output.or(lower_output),
            },
        }
    }

    /// Validate a configuration for common issues.
    fn validate_config(&self, config: &FileConfig) -> Result<(), PlaylistCheckError> {
        if let Some(defaults) = &config.defaults {
            if let Some(concurrency) = defaults.concurrency {
                if concurrency == 0 || concurrency > 100 {
                    return Err(PlaylistCheckError::config(
                        "Concurrency must be between 1 and 100",
                    ));
                }
            }

            if let Some(timeout_str) = &defaults.timeout {
                if parse_timeout_string(timeout_str).is_none() {
                    return Err(PlaylistCheckError::config(format!(
                        "Invalid timeout format '{}'. Use format like '500ms', '10s', '2m'",
                        timeout_str
                    )));
                }
            }

            if let Some(user_agent) = &defaults.user_agent {
                if user_agent.trim().is_empty() {
                    return Err(PlaylistCheckError::config("User agent cannot be empty"));
                }
            }
        }

        if let Some(output) = &config.output {
            if let Some(report_path) = &output.report_path {
                if report_path.trim().is_empty() {
                    return Err(PlaylistCheckError::config("Report path cannot be empty"));
                }
            }
        }

        Ok(())
    }
}

/// Environment variable configuration that mirrors CLI options.
///
/// This represents configuration values that can be set via `PC_*`
/// environment variables.
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub concurrency: Option<usize>,
    pub timeout: Option<Duration>,
    pub user_agent: Option<String>,
    pub insecure: Option<bool>,
    pub output: Option<String>,
    pub config: Option<String>,
}

/// Load configuration from `PC_*` environment variables.
///
/// Invalid values are logged as warnings and ignored.
pub fn load_env_config() -> EnvConfig {
    env_config_from(|key| env::var(key).ok())
}

fn env_config_from<F>(lookup: F) -> EnvConfig
where
    F: Fn(&str) -> Option<String>,
{
    let mut env_config = EnvConfig::default();

    if let Some(val) = lookup("PC_CONCURRENCY") {
        match val.trim().parse::<usize>() {
            Ok(concurrency) if (1..=100).contains(&concurrency) => {
                tracing::info!("using PC_CONCURRENCY={}", concurrency);
                env_config.concurrency = Some(concurrency);
            }
            _ => tracing::warn!("invalid PC_CONCURRENCY='{}', must be 1-100", val),
        }
    }

    if let Some(val) = lookup("PC_TIMEOUT") {
        match parse_timeout_string(&val) {
            Some(timeout) => {
                tracing::info!("using PC_TIMEOUT={}", val);
                env_config.timeout = Some(timeout);
            }
            None => tracing::warn!(
                "invalid PC_TIMEOUT='{}', use format like '500ms', '10s', '2m'",
                val
            ),
        }
    }

    if let Some(val) = lookup("PC_USER_AGENT") {
        if !val.trim().is_empty() {
            tracing::info!("using PC_USER_AGENT={}", val);
            env_config.user_agent = Some(val);
        }
    }

    if let Some(val) = lookup("PC_INSECURE") {
        match parse_bool(&val) {
            Some(insecure) => {
                tracing::info!("using PC_INSECURE={}", insecure);
                env_config.insecure = Some(insecure);
            }
            None => tracing::warn!("invalid PC_INSECURE='{}', use true/false", val),
        }
    }

    if let Some(val) = lookup("PC_OUTPUT") {
        if !val.trim().is_empty() {
            tracing::info!("using PC_OUTPUT={}", val);
            env_config.output = Some(val);
        }
    }

    if let Some(val) = lookup("PC_CONFIG") {
        if !val.trim().is_empty() {
            tracing::info!("using PC_CONFIG={}", val);
            env_config.config = Some(val);
        }
    }

    env_config
}

fn parse_bool(val: &str) -> Option<bool> {
    match val.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a timeout string like "500ms", "10s", "2m" or "10" (seconds).
///
/// Returns `None` for unparsable or zero durations.
pub fn parse_timeout_string(timeout_str: &str) -> Option<Duration> {
    let timeout_str = timeout_str.trim().to_lowercase();

    let timeout = if let Some(ms) = timeout_str.strip_suffix("ms") {
        ms.parse::<u64>().ok().map(Duration::from_millis)
    } else if let Some(secs) = timeout_str.strip_suffix('s') {
        secs.parse::<u64>().ok().map(Duration::from_secs)
    } else if let Some(mins) = timeout_str.strip_suffix('m') {
        mins.parse::<u64>()
            .ok()
            .and_then(|m| m.checked_mul(60))
            .map(Duration::from_secs)
    } else {
        timeout_str.parse::<u64>().ok().map(Duration::from_secs)
    }?;

    if timeout.is_zero() {
        None
    } else {
        Some(timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(content.as_bytes()).unwrap();
        temp_file.flush().unwrap();
        temp_file
    }

    fn env_from(pairs: &[(&str, &str)]) -> EnvConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        env_config_from(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_parse_timeout_string() {
        assert_eq!(parse_timeout_string("500ms"), Some(Duration::from_millis(500)));
        assert_eq!(parse_timeout_string("10s"), Some(Duration::from_secs(10)));
        assert_eq!(parse_timeout_string("2m"), Some(Duration::from_secs(120)));
        assert_eq!(parse_timeout_string(" 7 "), Some(Duration::from_secs(7)));
        assert_eq!(parse_timeout_string("0s"), None);
        assert_eq!(parse_timeout_string("soon"), None);
        assert_eq!(parse_timeout_string(""), None);
    }

    #[test]
    fn test_load_valid_config() {
        let temp_file = write_config(
            r#"
[defaults]
concurrency = 25
timeout = "3s"
user_agent = "Tester/1.0"
insecure = true

[output]
report_path = "out.txt"
json_pretty = true
"#,
        );

        let config = ConfigManager::new().load_file(temp_file.path()).unwrap();

        let defaults = config.defaults.unwrap();
        assert_eq!(defaults.concurrency, Some(25));
        assert_eq!(defaults.timeout.as_deref(), Some("3s"));
        assert_eq!(defaults.user_agent.as_deref(), Some("Tester/1.0"));
        assert_eq!(defaults.insecure, Some(true));

        let output = config.output.unwrap();
        assert_eq!(output.report_path.as_deref(), Some("out.txt"));
        assert_eq!(output.json_pretty, Some(true));
    }

    #[test]
    fn test_invalid_concurrency() {
        let temp_file = write_config("[defaults]\nconcurrency = 0\n");
        let result = ConfigManager::new().load_file(temp_file.path());
        assert!(matches!(result, Err(PlaylistCheckError::ConfigError { .. })));
    }

    #[test]
    fn test_invalid_timeout() {
        let temp_file = write_config("[defaults]\ntimeout = \"forever\"\n");
        let err = ConfigManager::new().load_file(temp_file.path()).unwrap_err();
        assert!(err.to_string().contains("forever"));
    }

    #[test]
    fn test_malformed_toml() {
        let temp_file = write_config("[defaults\nconcurrency = 5\n");
        let err = ConfigManager::new().load_file(temp_file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse TOML"));
    }

    #[test]
    fn test_missing_file() {
        let result = ConfigManager::new().load_file("/no/such/playlist-check.toml");
        assert!(matches!(result, Err(PlaylistCheckError::FileError { .. })));
    }

    #[test]
    fn test_merge_configs() {
        let manager = ConfigManager::new();

        let lower = FileConfig {
            defaults: Some(DefaultsConfig {
                concurrency: Some(10),
                user_agent: Some("Lower/1.0".to_string()),
                ..Default::default()
            }),
            output: Some(OutputConfig {
                report_path: Some("lower.txt".to_string()),
                json_pretty: Some(false),
            }),
        };

        let higher = FileConfig {
            defaults: Some(DefaultsConfig {
                concurrency: Some(25),
                insecure: Some(true),
                ..Default::default()
            }),
            output: None,
        };

        let merged = manager.merge_configs(lower, higher);
        let defaults = merged.defaults.unwrap();

        assert_eq!(defaults.concurrency, Some(25)); // Higher wins
        assert_eq!(defaults.user_agent.as_deref(), Some("Lower/1.0")); // Lower preserved
        assert_eq!(defaults.insecure, Some(true));
        assert_eq!(
            merged.output.unwrap().report_path.as_deref(),
            Some("lower.txt")
        );
    }

    #[test]
    fn test_env_config_valid_values() {
        let env_config = env_from(&[
            ("PC_CONCURRENCY", "8"),
            ("PC_TIMEOUT", "750ms"),
            ("PC_USER_AGENT", "Env/1.0"),
            ("PC_INSECURE", "yes"),
            ("PC_OUTPUT", "env_report.txt"),
            ("PC_CONFIG", "custom.toml"),
        ]);

        assert_eq!(env_config.concurrency, Some(8));
        assert_eq!(env_config.timeout, Some(Duration::from_millis(750)));
        assert_eq!(env_config.user_agent.as_deref(), Some("Env/1.0"));
        assert_eq!(env_config.insecure, Some(true));
        assert_eq!(env_config.output.as_deref(), Some("env_report.txt"));
        assert_eq!(env_config.config.as_deref(), Some("custom.toml"));
    }

    #[test]
    fn test_env_config_invalid_values_ignored() {
        let env_config = env_from(&[
            ("PC_CONCURRENCY", "500"),
            ("PC_TIMEOUT", "whenever"),
            ("PC_USER_AGENT", "  "),
            ("PC_INSECURE", "maybe"),
        ]);

        assert_eq!(env_config.concurrency, None);
        assert_eq!(env_config.timeout, None);
        assert_eq!(env_config.user_agent, None);
        assert_eq!(env_config.insecure, None);
    }
}
