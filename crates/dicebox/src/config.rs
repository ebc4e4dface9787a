//! Configuration for the auth service binary.
//!
//! Loaded from a TOML file. A missing file is created with the defaults so
//! there is always something to edit. Command-line flags override file
//! values (see [`AppConfig::apply_cli`]).

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use dicebox_protocol::{AUTH_SERVICE_PORT, INTERNAL_REQUEST_DEADLINE};
use dicebox_session::SessionConfig;
use dicebox_validation::HttpValidator;
use serde::{Deserialize, Serialize};

use crate::DiceboxError;
use crate::cli::CliArgs;

/// Longest accepted sweep interval and first-sweep jitter: one year.
pub const MAX_SWEEP_PERIOD: Duration = Duration::from_secs(365 * 24 * 60 * 60);

fn default_bind_address() -> String {
    format!("0.0.0.0:{AUTH_SERVICE_PORT}")
}

fn default_sweep_interval_secs() -> u64 {
    SessionConfig::DEFAULT_SWEEP_INTERVAL.as_secs()
}

fn default_stale_after_secs() -> u64 {
    SessionConfig::DEFAULT_STALE_AFTER.as_secs()
}

fn default_auth_url() -> String {
    format!("http://127.0.0.1:{AUTH_SERVICE_PORT}")
}

fn default_request_timeout_ms() -> u64 {
    INTERNAL_REQUEST_DEADLINE.as_millis() as u64
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Application configuration loaded from a TOML file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub sessions: SessionSettings,
    #[serde(default)]
    pub validation: ValidationSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Address the auth service listens on (e.g. "0.0.0.0:40001")
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

/// Session lifetime settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Seconds between two sweeps of the session table
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
    /// Seconds of inactivity after which a session is evicted
    #[serde(default = "default_stale_after_secs")]
    pub stale_after_secs: u64,
    /// Upper bound of the random delay before the first sweep
    #[serde(default)]
    pub sweep_jitter_ms: u64,
}

/// How collaborator services reach the auth service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationSettings {
    /// Base URL of the auth service
    #[serde(default = "default_auth_url")]
    pub auth_url: String,
    /// Deadline for one validation request
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

/// Logging system configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level filter (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Whether to output logs in JSON format
    #[serde(default)]
    pub json_format: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            sweep_interval_secs: default_sweep_interval_secs(),
            stale_after_secs: default_stale_after_secs(),
            sweep_jitter_ms: 0,
        }
    }
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            auth_url: default_auth_url(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
        }
    }
}

/// Where a loaded configuration came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigOrigin {
    /// Parsed from an existing file.
    File,
    /// The file was missing and the defaults were written to it.
    CreatedDefault,
}

impl AppConfig {
    /// Loads configuration from a TOML file.
    ///
    /// If the file doesn't exist, writes the default configuration to
    /// `path` and returns it with [`ConfigOrigin::CreatedDefault`]. Nothing
    /// is logged here since this runs before the subscriber is installed.
    pub async fn load_from_file(path: &Path) -> Result<(Self, ConfigOrigin), DiceboxError> {
        if tokio::fs::try_exists(path).await? {
            let content = tokio::fs::read_to_string(path).await?;
            let config = toml::from_str(&content)
                .map_err(|e| DiceboxError::Config(format!("{}: {e}", path.display())))?;
            Ok((config, ConfigOrigin::File))
        } else {
            let default_config = AppConfig::default();
            let toml_content = toml::to_string_pretty(&default_config)
                .map_err(|e| DiceboxError::Config(e.to_string()))?;
            tokio::fs::write(path, toml_content).await?;
            Ok((default_config, ConfigOrigin::CreatedDefault))
        }
    }

    /// Applies command-line overrides.
    pub fn apply_cli(&mut self, args: &CliArgs) {
        if let Some(bind) = &args.bind {
            self.server.bind_address = bind.clone();
        }
        if let Some(level) = &args.log_level {
            self.logging.level = level.clone();
        }
        if args.json_logs {
            self.logging.json_format = true;
        }
    }

    /// Rejects values the service cannot run with.
    pub fn validate(&self) -> Result<(), DiceboxError> {
        self.server
            .bind_address
            .parse::<SocketAddr>()
            .map_err(|e| {
                DiceboxError::Config(format!(
                    "invalid bind address {:?}: {e}",
                    self.server.bind_address
                ))
            })?;

        if self.sessions.sweep_interval_secs == 0 {
            return Err(DiceboxError::Config(
                "sessions.sweep_interval_secs must be greater than zero".into(),
            ));
        }
        if self.sessions.sweep_interval_secs > MAX_SWEEP_PERIOD.as_secs() {
            return Err(DiceboxError::Config(format!(
                "sessions.sweep_interval_secs must be at most {}",
                MAX_SWEEP_PERIOD.as_secs()
            )));
        }
        if u128::from(self.sessions.sweep_jitter_ms) > MAX_SWEEP_PERIOD.as_millis() {
            return Err(DiceboxError::Config(format!(
                "sessions.sweep_jitter_ms must be at most {}",
                MAX_SWEEP_PERIOD.as_millis()
            )));
        }
        if self.sessions.stale_after_secs == 0 {
            return Err(DiceboxError::Config(
                "sessions.stale_after_secs must be greater than zero".into(),
            ));
        }
        if self.validation.request_timeout_ms == 0 {
            return Err(DiceboxError::Config(
                "validation.request_timeout_ms must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            sweep_interval: Duration::from_secs(self.sessions.sweep_interval_secs),
            stale_after: Duration::from_secs(self.sessions.stale_after_secs),
        }
    }

    pub fn sweep_jitter(&self) -> Duration {
        Duration::from_millis(self.sessions.sweep_jitter_ms)
    }

    /// A validation client for collaborator services, pointed at
    /// `validation.auth_url`.
    pub fn validator(&self) -> Result<HttpValidator, DiceboxError> {
        Ok(HttpValidator::new(&self.validation.auth_url)?
            .with_timeout(Duration::from_millis(self.validation.request_timeout_ms)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_default_matches_session_defaults() {
        let config = AppConfig::default();

        assert_eq!(config.session_config(), SessionConfig::default());
        assert_eq!(config.server.bind_address, "0.0.0.0:40001");
        assert_eq!(config.validation.request_timeout_ms, 2000);
        assert!(config.validate().is_ok());
    }

    #[tokio::test]
    async fn test_load_from_file_missing_writes_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dicebox.toml");

        let (config, origin) = AppConfig::load_from_file(&path).await.unwrap();

        assert_eq!(config, AppConfig::default());
        assert_eq!(origin, ConfigOrigin::CreatedDefault);
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("sweep_interval_secs = 21600"));
    }

    #[tokio::test]
    async fn test_load_from_file_second_load_reports_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dicebox.toml");

        let (_, first) = AppConfig::load_from_file(&path).await.unwrap();
        let (config, second) = AppConfig::load_from_file(&path).await.unwrap();

        assert_eq!(first, ConfigOrigin::CreatedDefault);
        assert_eq!(second, ConfigOrigin::File);
        assert_eq!(config, AppConfig::default());
    }

    #[tokio::test]
    async fn test_load_from_file_partial_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dicebox.toml");
        std::fs::write(
            &path,
            "[sessions]\nstale_after_secs = 60\n\n[logging]\njson_format = true\n",
        )
        .unwrap();

        let (config, origin) = AppConfig::load_from_file(&path).await.unwrap();

        assert_eq!(origin, ConfigOrigin::File);
        assert_eq!(config.sessions.stale_after_secs, 60);
        assert_eq!(config.sessions.sweep_interval_secs, 21600);
        assert!(config.logging.json_format);
        assert_eq!(config.logging.level, "info");
    }

    #[tokio::test]
    async fn test_load_from_file_invalid_toml_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dicebox.toml");
        std::fs::write(&path, "[sessions\nstale_after_secs = ").unwrap();

        let result = AppConfig::load_from_file(&path).await;

        assert!(matches!(result, Err(DiceboxError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_bad_bind_address() {
        let mut config = AppConfig::default();
        config.server.bind_address = "not an address".into();

        assert!(matches!(config.validate(), Err(DiceboxError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let mut config = AppConfig::default();
        config.sessions.sweep_interval_secs = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_interval_beyond_one_year() {
        let mut config = AppConfig::default();
        config.sessions.sweep_interval_secs = u64::MAX;

        assert!(matches!(config.validate(), Err(DiceboxError::Config(_))));

        config.sessions.sweep_interval_secs = MAX_SWEEP_PERIOD.as_secs();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_jitter_beyond_one_year() {
        let mut config = AppConfig::default();
        config.sessions.sweep_jitter_ms = u64::MAX;

        assert!(matches!(config.validate(), Err(DiceboxError::Config(_))));

        config.sessions.sweep_jitter_ms = 60_000;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = AppConfig::default();
        config.validation.request_timeout_ms = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_apply_cli_overrides_file_values() {
        let mut config = AppConfig::default();
        let args = CliArgs::try_parse_from([
            "dicebox-auth",
            "--bind",
            "127.0.0.1:9000",
            "--log-level",
            "debug",
            "--json-logs",
        ])
        .unwrap();

        config.apply_cli(&args);

        assert_eq!(config.server.bind_address, "127.0.0.1:9000");
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json_format);
    }

    #[test]
    fn test_validator_uses_configured_timeout() {
        let mut config = AppConfig::default();
        config.validation.auth_url = "http://auth.internal:40001".into();
        config.validation.request_timeout_ms = 500;

        let validator = config.validator().unwrap();

        assert_eq!(validator.timeout(), Duration::from_millis(500));
        assert_eq!(
            validator.endpoint().to_string(),
            "http://auth.internal:40001/auth/validation-internal"
        );
    }
}
