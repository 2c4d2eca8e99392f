use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "Intake";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Registration page opened after a successful enrollment.
pub const DEFAULT_PORTAL_URL: &str = "https://portal.copays.org/#/register";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
/// How long the pricing result stays on screen before the wizard advances.
pub const DEFAULT_ADVANCE_DELAY_MS: u64 = 2000;
/// Delay between enrolling and ending the session.
pub const DEFAULT_LOGOUT_DELAY_MS: u64 = 1000;

const ENV_DB_PATH: &str = "INTAKE_DB_PATH";
const ENV_BIND_ADDR: &str = "INTAKE_BIND_ADDR";
const ENV_PORTAL_URL: &str = "INTAKE_PORTAL_URL";
const ENV_ADVANCE_DELAY_MS: &str = "INTAKE_ADVANCE_DELAY_MS";
const ENV_LOGOUT_DELAY_MS: &str = "INTAKE_LOGOUT_DELAY_MS";

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "intake=info,intake_lib=info,tower_http=info"
}

/// Get the application data directory.
///
/// Falls back to the working directory when the platform has no data dir.
pub fn app_data_dir() -> PathBuf {
    dirs::data_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

pub fn default_db_path() -> PathBuf {
    app_data_dir().join("intake.db")
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} is not a valid socket address: {value}")]
    InvalidAddr { var: &'static str, value: String },
    #[error("{var} must be a whole number of milliseconds: {value}")]
    InvalidDelay { var: &'static str, value: String },
    #[error("{var} cannot be empty")]
    Empty { var: &'static str },
}

/// Runtime configuration, resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntakeConfig {
    pub db_path: PathBuf,
    pub bind_addr: SocketAddr,
    pub portal_url: String,
    pub advance_delay: Duration,
    pub logout_delay: Duration,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            bind_addr: DEFAULT_BIND_ADDR
                .parse()
                .unwrap_or_else(|_| SocketAddr::from(([127, 0, 0, 1], 8080))),
            portal_url: DEFAULT_PORTAL_URL.to_string(),
            advance_delay: Duration::from_millis(DEFAULT_ADVANCE_DELAY_MS),
            logout_delay: Duration::from_millis(DEFAULT_LOGOUT_DELAY_MS),
        }
    }
}

impl IntakeConfig {
    /// Read overrides from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from an arbitrary variable source; unset variables keep defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup(ENV_DB_PATH) {
            if path.trim().is_empty() {
                return Err(ConfigError::Empty { var: ENV_DB_PATH });
            }
            config.db_path = PathBuf::from(path);
        }

        if let Some(addr) = lookup(ENV_BIND_ADDR) {
            config.bind_addr = addr.trim().parse().map_err(|_| ConfigError::InvalidAddr {
                var: ENV_BIND_ADDR,
                value: addr.clone(),
            })?;
        }

        if let Some(url) = lookup(ENV_PORTAL_URL) {
            if url.trim().is_empty() {
                return Err(ConfigError::Empty { var: ENV_PORTAL_URL });
            }
            config.portal_url = url.trim().to_string();
        }

        if let Some(ms) = lookup(ENV_ADVANCE_DELAY_MS) {
            config.advance_delay = parse_delay(ENV_ADVANCE_DELAY_MS, &ms)?;
        }

        if let Some(ms) = lookup(ENV_LOGOUT_DELAY_MS) {
            config.logout_delay = parse_delay(ENV_LOGOUT_DELAY_MS, &ms)?;
        }

        Ok(config)
    }
}

fn parse_delay(var: &'static str, value: &str) -> Result<Duration, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|_| ConfigError::InvalidDelay {
            var,
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn app_data_dir_ends_with_app_name() {
        assert!(app_data_dir().ends_with(APP_NAME));
        assert!(default_db_path().starts_with(app_data_dir()));
    }

    #[test]
    fn defaults_when_nothing_set() {
        let config = IntakeConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, IntakeConfig::default());
        assert_eq!(config.portal_url, DEFAULT_PORTAL_URL);
        assert_eq!(config.advance_delay, Duration::from_secs(2));
        assert_eq!(config.logout_delay, Duration::from_secs(1));
        assert_eq!(config.bind_addr.port(), 8080);
    }

    #[test]
    fn overrides_applied() {
        let config = IntakeConfig::from_lookup(lookup_from(&[
            ("INTAKE_DB_PATH", "/tmp/intake-test.db"),
            ("INTAKE_BIND_ADDR", "0.0.0.0:9000"),
            ("INTAKE_PORTAL_URL", " https://portal.example/register "),
            ("INTAKE_ADVANCE_DELAY_MS", "0"),
            ("INTAKE_LOGOUT_DELAY_MS", "250"),
        ]))
        .unwrap();

        assert_eq!(config.db_path, PathBuf::from("/tmp/intake-test.db"));
        assert_eq!(config.bind_addr.port(), 9000);
        assert_eq!(config.portal_url, "https://portal.example/register");
        assert_eq!(config.advance_delay, Duration::ZERO);
        assert_eq!(config.logout_delay, Duration::from_millis(250));
    }

    #[test]
    fn invalid_values_rejected() {
        let err = IntakeConfig::from_lookup(lookup_from(&[("INTAKE_BIND_ADDR", "localhost")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidAddr { .. }));

        let err =
            IntakeConfig::from_lookup(lookup_from(&[("INTAKE_ADVANCE_DELAY_MS", "two seconds")]))
                .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDelay { .. }));

        let err = IntakeConfig::from_lookup(lookup_from(&[("INTAKE_PORTAL_URL", "  ")])).unwrap_err();
        assert_eq!(err, ConfigError::Empty { var: "INTAKE_PORTAL_URL" });
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }
}
