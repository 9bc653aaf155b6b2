//! Service configuration loaded via OrthoConfig.
//!
//! Values come from `ENGAGEMENT_*` environment variables, configuration
//! files and command-line flags, in OrthoConfig's usual precedence.

use std::net::SocketAddr;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::outbound::persistence::PoolConfig;

const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";
const DEFAULT_POOL_MAX_SIZE: u32 = 10;
const DEFAULT_POOL_MIN_IDLE: u32 = 2;
const DEFAULT_POOL_CONNECTION_TIMEOUT_SECS: u64 = 30;

/// Errors raised when settings are incomplete or malformed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    /// No database URL was configured.
    #[error("ENGAGEMENT_DATABASE_URL must be set")]
    MissingDatabaseUrl,
    /// The bind address is not a socket address.
    #[error("invalid bind address '{value}': {message}")]
    InvalidBindAddress { value: String, message: String },
    /// The pool cannot hold its idle connections.
    #[error("pool_min_idle ({min_idle}) exceeds pool_max_size ({max_size})")]
    PoolBounds { min_idle: u32, max_size: u32 },
}

/// Runtime settings for the engagement ledger service.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "ENGAGEMENT")]
pub struct AppSettings {
    /// PostgreSQL connection URL.
    pub database_url: Option<String>,
    /// Socket address the HTTP server binds to.
    pub bind_address: Option<String>,
    /// Maximum pooled connections.
    pub pool_max_size: Option<u32>,
    /// Idle connections kept open.
    pub pool_min_idle: Option<u32>,
    /// Seconds to wait for a pooled connection.
    pub pool_connection_timeout_secs: Option<u64>,
    /// Apply embedded migrations before serving.
    pub run_migrations: Option<bool>,
}

impl AppSettings {
    /// The configured database URL.
    ///
    /// # Errors
    ///
    /// [`SettingsError::MissingDatabaseUrl`] when unset or blank.
    pub fn database_url(&self) -> Result<&str, SettingsError> {
        self.database_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or(SettingsError::MissingDatabaseUrl)
    }

    /// Parsed bind address, `0.0.0.0:8080` unless overridden.
    ///
    /// # Errors
    ///
    /// [`SettingsError::InvalidBindAddress`] when the value does not parse.
    pub fn bind_address(&self) -> Result<SocketAddr, SettingsError> {
        let value = self.bind_address.as_deref().unwrap_or(DEFAULT_BIND_ADDRESS);
        value
            .parse()
            .map_err(|err: std::net::AddrParseError| SettingsError::InvalidBindAddress {
                value: value.to_owned(),
                message: err.to_string(),
            })
    }

    /// Whether embedded migrations run at startup, `true` unless disabled.
    #[must_use]
    pub fn run_migrations(&self) -> bool {
        self.run_migrations.unwrap_or(true)
    }

    /// Pool configuration derived from the pool settings.
    ///
    /// # Errors
    ///
    /// Fails when the database URL is missing or the idle count exceeds the
    /// pool size.
    pub fn pool_config(&self) -> Result<PoolConfig, SettingsError> {
        let max_size = self.pool_max_size.unwrap_or(DEFAULT_POOL_MAX_SIZE);
        let min_idle = self.pool_min_idle.unwrap_or(DEFAULT_POOL_MIN_IDLE);
        if min_idle > max_size {
            return Err(SettingsError::PoolBounds { min_idle, max_size });
        }
        let timeout = Duration::from_secs(
            self.pool_connection_timeout_secs
                .unwrap_or(DEFAULT_POOL_CONNECTION_TIMEOUT_SECS),
        );
        Ok(PoolConfig::new(self.database_url()?)
            .with_max_size(max_size)
            .with_min_idle(Some(min_idle))
            .with_connection_timeout(timeout))
    }
}

#[cfg(test)]
mod tests {
    //! Configuration loading through the environment.

    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    use super::*;

    const VARS: [&str; 6] = [
        "ENGAGEMENT_DATABASE_URL",
        "ENGAGEMENT_BIND_ADDRESS",
        "ENGAGEMENT_POOL_MAX_SIZE",
        "ENGAGEMENT_POOL_MIN_IDLE",
        "ENGAGEMENT_POOL_CONNECTION_TIMEOUT_SECS",
        "ENGAGEMENT_RUN_MIGRATIONS",
    ];

    fn load_with(overrides: &[(&'static str, &str)]) -> AppSettings {
        let vars = VARS.map(|name| {
            let value = overrides
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value).to_owned());
            (name, value)
        });
        let _guard = lock_env(vars);
        AppSettings::load_from_iter([OsString::from("engagement-ledger")])
            .expect("settings should load")
    }

    #[rstest]
    fn defaults_apply_when_unset() {
        let settings = load_with(&[("ENGAGEMENT_DATABASE_URL", "postgres://localhost/ledger")]);

        assert!(settings.run_migrations());
        assert_eq!(
            settings.bind_address().expect("default address"),
            "0.0.0.0:8080".parse::<SocketAddr>().expect("socket address")
        );
        let pool = settings.pool_config().expect("pool config");
        assert_eq!(pool.database_url(), "postgres://localhost/ledger");
        assert_eq!(pool.max_size(), DEFAULT_POOL_MAX_SIZE);
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let settings = load_with(&[
            ("ENGAGEMENT_DATABASE_URL", "postgres://db/ledger"),
            ("ENGAGEMENT_BIND_ADDRESS", "127.0.0.1:9000"),
            ("ENGAGEMENT_POOL_MAX_SIZE", "4"),
            ("ENGAGEMENT_POOL_MIN_IDLE", "1"),
            ("ENGAGEMENT_RUN_MIGRATIONS", "false"),
        ]);

        assert!(!settings.run_migrations());
        assert_eq!(
            settings.bind_address().expect("address").port(),
            9000
        );
        assert_eq!(settings.pool_config().expect("pool config").max_size(), 4);
    }

    #[rstest]
    #[case("true", true)]
    #[case("false", false)]
    fn run_migrations_follows_the_environment(#[case] raw: &str, #[case] expected: bool) {
        let settings = load_with(&[
            ("ENGAGEMENT_DATABASE_URL", "postgres://db/ledger"),
            ("ENGAGEMENT_RUN_MIGRATIONS", raw),
        ]);
        assert_eq!(settings.run_migrations(), expected);
        assert_eq!(settings.run_migrations, Some(expected));
    }

    #[rstest]
    fn run_migrations_defaults_to_enabled() {
        let settings = load_with(&[("ENGAGEMENT_DATABASE_URL", "postgres://db/ledger")]);
        assert_eq!(settings.run_migrations, None);
        assert!(settings.run_migrations());
    }

    #[rstest]
    #[case(&[], SettingsError::MissingDatabaseUrl)]
    #[case(&[("ENGAGEMENT_DATABASE_URL", "  ")], SettingsError::MissingDatabaseUrl)]
    #[case(
        &[
            ("ENGAGEMENT_DATABASE_URL", "postgres://db/ledger"),
            ("ENGAGEMENT_POOL_MAX_SIZE", "2"),
            ("ENGAGEMENT_POOL_MIN_IDLE", "3"),
        ],
        SettingsError::PoolBounds { min_idle: 3, max_size: 2 }
    )]
    fn invalid_pool_settings_are_reported(
        #[case] overrides: &[(&'static str, &str)],
        #[case] expected: SettingsError,
    ) {
        let settings = load_with(overrides);
        assert_eq!(settings.pool_config().err(), Some(expected));
    }

    #[rstest]
    fn malformed_bind_address_is_reported() {
        let settings = load_with(&[("ENGAGEMENT_BIND_ADDRESS", "localhost")]);
        assert!(matches!(
            settings.bind_address(),
            Err(SettingsError::InvalidBindAddress { .. })
        ));
    }
}
