//! Eventy Configuration
//!
//! Layered application configuration:
//! 1. Built-in defaults
//! 2. Optional TOML file (`EVENTY_CONFIG`, or `eventy.toml` in the working directory)
//! 3. Environment variable overrides
//!
//! ## Environment Variables
//!
//! | Variable | Section |
//! |----------|---------|
//! | `SERVER_HOST`, `SERVER_PORT` | `[server]` |
//! | `DATABASE_URL`, `DATABASE_MAX_CONNECTIONS` | `[database]` |
//! | `JWT_SECRET`, `TOKEN_EXPIRY_HOURS`, `PROTECT_BACKOFFICE` | `[auth]` |
//! | `ADMIN_USERNAME`, `ADMIN_PASSWORD` | `[admin]` |
//! | `STRIPE_SECRET_KEY`, `STRIPE_API_BASE`, `PAYMENT_CURRENCY` | `[payments]` |
//! | `BALANCE_POLICY` | `[booking]` |
//! | `LOG_LEVEL`, `LOG_FORMAT` | `[logging]` |

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

pub const CONFIG_PATH_ENV: &str = "EVENTY_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "eventy.toml";
const DEFAULT_JWT_SECRET: &str = "change-me";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub admin: AdminConfig,
    pub payments: PaymentsConfig,
    pub booking: BookingConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// sqlx connection URL, e.g. `sqlite://eventy.db?mode=rwc`
    pub url: String,
    pub max_connections: u32,
    /// How long a writer waits on a locked database before failing
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://eventy.db?mode=rwc".to_string(),
            max_connections: 5,
            busy_timeout_ms: 5_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_expiry_hours: i64,
    /// Require an admin bearer token on back-office routes
    pub protect_backoffice: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            token_expiry_hours: 1,
            protect_backoffice: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    pub username: String,
    pub password: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            password: "admin".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentsConfig {
    pub stripe_secret_key: String,
    pub api_base: String,
    pub currency: String,
}

impl Default for PaymentsConfig {
    fn default() -> Self {
        Self {
            stripe_secret_key: String::new(),
            api_base: "https://api.stripe.com".to_string(),
            currency: "usd".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BookingConfig {
    pub balance_policy: BalancePolicy,
}

/// What happens when a booking costs more than the user's balance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalancePolicy {
    /// Debit regardless; the balance may go negative
    #[default]
    AllowNegative,
    /// Reject bookings the balance cannot cover
    RequireFunds,
}

impl FromStr for BalancePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "allow_negative" => Ok(Self::AllowNegative),
            "require_funds" => Ok(Self::RequireFunds),
            _ => Err(ConfigError::InvalidValue {
                key: "BALANCE_POLICY".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(ConfigError::InvalidValue {
                key: "LOG_FORMAT".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

impl AppConfig {
    /// Load from the default file location and the process environment.
    pub fn load() -> Result<Self> {
        let mut config = match Self::config_path() {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// The TOML file `load` reads, if any.
    pub fn config_path() -> Option<PathBuf> {
        resolve_config_path(std::env::var(CONFIG_PATH_ENV).ok(), Path::new(DEFAULT_CONFIG_FILE))
    }

    pub fn uses_default_jwt_secret(&self) -> bool {
        self.auth.jwt_secret == DEFAULT_JWT_SECRET
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Overlay values from an environment lookup.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("SERVER_HOST") {
            self.server.host = v;
        }
        if let Some(v) = lookup("SERVER_PORT") {
            self.server.port = parse_var("SERVER_PORT", &v)?;
        }
        if let Some(v) = lookup("DATABASE_URL") {
            self.database.url = v;
        }
        if let Some(v) = lookup("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse_var("DATABASE_MAX_CONNECTIONS", &v)?;
        }
        if let Some(v) = lookup("JWT_SECRET") {
            self.auth.jwt_secret = v;
        }
        if let Some(v) = lookup("TOKEN_EXPIRY_HOURS") {
            self.auth.token_expiry_hours = parse_var("TOKEN_EXPIRY_HOURS", &v)?;
        }
        if let Some(v) = lookup("PROTECT_BACKOFFICE") {
            self.auth.protect_backoffice = parse_var("PROTECT_BACKOFFICE", &v)?;
        }
        if let Some(v) = lookup("ADMIN_USERNAME") {
            self.admin.username = v;
        }
        if let Some(v) = lookup("ADMIN_PASSWORD") {
            self.admin.password = v;
        }
        if let Some(v) = lookup("STRIPE_SECRET_KEY") {
            self.payments.stripe_secret_key = v;
        }
        if let Some(v) = lookup("STRIPE_API_BASE") {
            self.payments.api_base = v;
        }
        if let Some(v) = lookup("PAYMENT_CURRENCY") {
            self.payments.currency = v.to_ascii_lowercase();
        }
        if let Some(v) = lookup("BALANCE_POLICY") {
            self.booking.balance_policy = v.parse()?;
        }
        if let Some(v) = lookup("LOG_LEVEL") {
            self.logging.level = v;
        }
        if let Some(v) = lookup("LOG_FORMAT") {
            self.logging.format = v.parse()?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(ConfigError::Invalid("server.port must be non-zero".to_string()));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be at least 1".to_string(),
            ));
        }
        if self.auth.jwt_secret.is_empty() {
            return Err(ConfigError::Invalid("auth.jwt_secret must not be empty".to_string()));
        }
        if self.auth.token_expiry_hours <= 0 {
            return Err(ConfigError::Invalid(
                "auth.token_expiry_hours must be positive".to_string(),
            ));
        }
        if self.payments.currency.len() != 3 {
            return Err(ConfigError::Invalid(format!(
                "payments.currency must be a three-letter ISO code, got {:?}",
                self.payments.currency
            )));
        }
        Ok(())
    }
}

fn parse_var<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn resolve_config_path(explicit: Option<String>, default: &Path) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(PathBuf::from(path)),
        None if default.exists() => Some(default.to_path_buf()),
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.bind_address(), "127.0.0.1:8080");
        assert_eq!(config.admin.username, "admin");
        assert_eq!(config.auth.token_expiry_hours, 1);
        assert!(config.auth.protect_backoffice);
        assert_eq!(config.booking.balance_policy, BalancePolicy::AllowNegative);
        assert_eq!(config.payments.currency, "usd");
        assert!(config.uses_default_jwt_secret());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [server]
            port = 9000

            [booking]
            balance_policy = "require_funds"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.booking.balance_policy, BalancePolicy::RequireFunds);
        assert_eq!(config.logging.format, LogFormat::Text);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[database]\nurl = \"sqlite::memory:\"\nmax_connections = 2").unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(config.database.max_connections, 2);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppConfig::from_file(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_config_path_resolution() {
        let dir = tempfile::tempdir().unwrap();
        let default = dir.path().join("eventy.toml");

        assert_eq!(resolve_config_path(None, &default), None);
        assert_eq!(
            resolve_config_path(Some("/etc/eventy.toml".into()), &default),
            Some(PathBuf::from("/etc/eventy.toml"))
        );

        std::fs::write(&default, "[server]\nport = 9000\n").unwrap();
        assert_eq!(resolve_config_path(None, &default), Some(default.clone()));
    }

    #[test]
    fn test_malformed_toml() {
        let err = AppConfig::from_toml("[server\nport = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_env_overrides_file_values() {
        let mut config = AppConfig::from_toml("[server]\nport = 9000").unwrap();
        config
            .apply_env(lookup_from(&[
                ("SERVER_PORT", "7000"),
                ("JWT_SECRET", "s3cret"),
                ("BALANCE_POLICY", "REQUIRE_FUNDS"),
                ("LOG_FORMAT", "json"),
                ("PROTECT_BACKOFFICE", "false"),
                ("PAYMENT_CURRENCY", "EUR"),
            ]))
            .unwrap();

        assert_eq!(config.server.port, 7000);
        assert_eq!(config.auth.jwt_secret, "s3cret");
        assert_eq!(config.booking.balance_policy, BalancePolicy::RequireFunds);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert!(!config.auth.protect_backoffice);
        assert_eq!(config.payments.currency, "eur");
    }

    #[test]
    fn test_invalid_env_value() {
        let mut config = AppConfig::default();
        let err = config.apply_env(lookup_from(&[("SERVER_PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "SERVER_PORT"));

        let err = config.apply_env(lookup_from(&[("BALANCE_POLICY", "sometimes")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_validate_rejects_empty_secret() {
        let mut config = AppConfig::default();
        config.auth.jwt_secret.clear();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
