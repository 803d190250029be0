//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// JWT configuration.
    pub jwt: JwtSettings,
    /// Ledger behaviour switches.
    #[serde(default)]
    pub ledger: LedgerConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Run pending migrations on startup.
    #[serde(default)]
    pub auto_migrate: bool,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// JWT verification settings.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtSettings {
    /// Secret key the tokens are signed with.
    pub secret: String,
}

/// How the entity write and the balance update are committed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitMode {
    /// Entity write and balance deltas share one database transaction.
    #[default]
    Atomic,
    /// Entity write commits first; each delta is applied in its own unit of work.
    TwoPhase,
}

impl CommitMode {
    /// The configuration spelling of this mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Atomic => "atomic",
            Self::TwoPhase => "two_phase",
        }
    }
}

/// What an explicit `null` means when updating a transaction's `Occurred`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OccurredNullPolicy {
    /// `null` clears the timestamp.
    #[default]
    Clear,
    /// `null` is rejected as invalid input.
    Reject,
}

/// Ledger behaviour switches.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Commit protocol for mutations that move a balance.
    #[serde(default)]
    pub commit_mode: CommitMode,
    /// Interpretation of `null` for `Occurred` updates.
    #[serde(default)]
    pub occurred_null: OccurredNullPolicy,
    /// Currency given to logbooks created without one.
    #[serde(default = "default_currency")]
    pub default_currency: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            commit_mode: CommitMode::default(),
            occurred_null: OccurredNullPolicy::default(),
            default_currency: default_currency(),
        }
    }
}

fn default_currency() -> String {
    "usd".to_string()
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("MONEYLOG").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_applies_defaults() {
        temp_env::with_vars(
            [
                ("MONEYLOG__DATABASE__URL", Some("sqlite::memory:")),
                ("MONEYLOG__JWT__SECRET", Some("secret")),
                ("MONEYLOG__LEDGER__COMMIT_MODE", None),
                ("MONEYLOG__LEDGER__OCCURRED_NULL", None),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.database.url, "sqlite::memory:");
                assert_eq!(config.server.port, 8080);
                assert_eq!(config.database.max_connections, 10);
                assert!(!config.database.auto_migrate);
                assert_eq!(config.ledger.commit_mode, CommitMode::Atomic);
                assert_eq!(config.ledger.occurred_null, OccurredNullPolicy::Clear);
                assert_eq!(config.ledger.default_currency, "usd");
            },
        );
    }

    #[test]
    fn test_load_reads_ledger_switches() {
        temp_env::with_vars(
            [
                ("MONEYLOG__DATABASE__URL", Some("sqlite::memory:")),
                ("MONEYLOG__JWT__SECRET", Some("secret")),
                ("MONEYLOG__LEDGER__COMMIT_MODE", Some("two_phase")),
                ("MONEYLOG__LEDGER__OCCURRED_NULL", Some("reject")),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.ledger.commit_mode, CommitMode::TwoPhase);
                assert_eq!(config.ledger.occurred_null, OccurredNullPolicy::Reject);
            },
        );
    }

    #[test]
    fn test_load_fails_without_database_url() {
        temp_env::with_vars(
            [
                ("MONEYLOG__DATABASE__URL", None::<&str>),
                ("MONEYLOG__JWT__SECRET", Some("secret")),
            ],
            || {
                assert!(AppConfig::load().is_err());
            },
        );
    }
}
