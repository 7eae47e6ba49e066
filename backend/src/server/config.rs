//! Server settings loaded via OrthoConfig.
//!
//! [`AppSettings`] is the raw layered view (CLI, `SOLAR_*` environment,
//! config files). [`ServerConfig`] is the validated form the bootstrap
//! consumes; required secrets are checked there.

use std::net::SocketAddr;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;
use url::Url;
use zeroize::Zeroizing;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_CALCULATION_URL: &str = "http://localhost:8002/calculate/";
const DEFAULT_JWT_TTL_SECS: u64 = 3600;
const DEFAULT_CALCULATION_TIMEOUT_SECS: u64 = 10;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;

/// Raw settings as layered by OrthoConfig.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "SOLAR")]
pub struct AppSettings {
    pub bind_addr: Option<String>,
    pub database_url: Option<String>,
    /// Unset keeps revocations in process memory.
    pub redis_url: Option<String>,
    pub jwt_secret: Option<String>,
    pub jwt_ttl_secs: Option<u64>,
    pub calculation_url: Option<String>,
    pub calculation_timeout_secs: Option<u64>,
    /// Shared secret the calculation service echoes back.
    pub service_token: Option<String>,
    pub db_max_connections: Option<u32>,
    #[ortho_config(default = true)]
    pub run_migrations: bool,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required setting {env}")]
    Missing { env: &'static str },
    #[error("invalid bind address {value:?}: {message}")]
    BindAddr { value: String, message: String },
    #[error("invalid calculation url {value:?}: {message}")]
    CalculationUrl { value: String, message: String },
    #[error("{env} must be greater than zero")]
    Zero { env: &'static str },
}

fn required(value: Option<String>, env: &'static str) -> Result<Zeroizing<String>, ConfigError> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(Zeroizing::new(value)),
        _ => Err(ConfigError::Missing { env }),
    }
}

fn positive(value: Option<u64>, default: u64, env: &'static str) -> Result<u64, ConfigError> {
    match value.unwrap_or(default) {
        0 => Err(ConfigError::Zero { env }),
        value => Ok(value),
    }
}

/// Validated server configuration.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) database_url: Zeroizing<String>,
    pub(crate) redis_url: Option<Zeroizing<String>>,
    pub(crate) jwt_secret: Zeroizing<String>,
    pub(crate) jwt_ttl: Duration,
    pub(crate) calculation_url: Url,
    pub(crate) calculation_timeout: Duration,
    pub(crate) service_token: Zeroizing<String>,
    pub(crate) db_max_connections: u32,
    pub(crate) run_migrations: bool,
}

impl ServerConfig {
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}

impl TryFrom<AppSettings> for ServerConfig {
    type Error = ConfigError;

    fn try_from(settings: AppSettings) -> Result<Self, Self::Error> {
        let raw_bind = settings
            .bind_addr
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_owned());
        let bind_addr = raw_bind
            .parse::<SocketAddr>()
            .map_err(|err| ConfigError::BindAddr {
                message: err.to_string(),
                value: raw_bind.clone(),
            })?;
        let raw_url = settings
            .calculation_url
            .unwrap_or_else(|| DEFAULT_CALCULATION_URL.to_owned());
        let calculation_url = Url::parse(&raw_url).map_err(|err| ConfigError::CalculationUrl {
            message: err.to_string(),
            value: raw_url.clone(),
        })?;
        let db_max_connections = settings
            .db_max_connections
            .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS);
        if db_max_connections == 0 {
            return Err(ConfigError::Zero {
                env: "SOLAR_DB_MAX_CONNECTIONS",
            });
        }

        Ok(Self {
            bind_addr,
            database_url: required(settings.database_url, "SOLAR_DATABASE_URL")?,
            redis_url: settings
                .redis_url
                .filter(|url| !url.trim().is_empty())
                .map(Zeroizing::new),
            jwt_secret: required(settings.jwt_secret, "SOLAR_JWT_SECRET")?,
            jwt_ttl: Duration::from_secs(positive(
                settings.jwt_ttl_secs,
                DEFAULT_JWT_TTL_SECS,
                "SOLAR_JWT_TTL_SECS",
            )?),
            calculation_url,
            calculation_timeout: Duration::from_secs(positive(
                settings.calculation_timeout_secs,
                DEFAULT_CALCULATION_TIMEOUT_SECS,
                "SOLAR_CALCULATION_TIMEOUT_SECS",
            )?),
            service_token: required(settings.service_token, "SOLAR_SERVICE_TOKEN")?,
            db_max_connections,
            run_migrations: settings.run_migrations,
        })
    }
}

#[cfg(test)]
mod tests {
    //! Configuration loading and validation.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const VARS: [&str; 10] = [
        "SOLAR_BIND_ADDR",
        "SOLAR_DATABASE_URL",
        "SOLAR_REDIS_URL",
        "SOLAR_JWT_SECRET",
        "SOLAR_JWT_TTL_SECS",
        "SOLAR_CALCULATION_URL",
        "SOLAR_CALCULATION_TIMEOUT_SECS",
        "SOLAR_SERVICE_TOKEN",
        "SOLAR_DB_MAX_CONNECTIONS",
        "SOLAR_RUN_MIGRATIONS",
    ];

    fn env_with(overrides: &[(&'static str, &str)]) -> Vec<(&'static str, Option<String>)> {
        VARS.iter()
            .map(|name| {
                let value = overrides
                    .iter()
                    .find(|(key, _)| key == name)
                    .map(|(_, value)| (*value).to_owned());
                (*name, value)
            })
            .collect()
    }

    fn load() -> AppSettings {
        AppSettings::load_from_iter([OsString::from("solar-backend")]).expect("config should load")
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("SOLAR_DATABASE_URL", "postgres://solar@localhost/solar"),
        ("SOLAR_JWT_SECRET", "0123456789abcdef0123456789abcdef"),
        ("SOLAR_SERVICE_TOKEN", "svc-token"),
    ];

    #[rstest]
    fn defaults_fill_optional_settings() {
        let _guard = lock_env(env_with(&REQUIRED));

        let config = ServerConfig::try_from(load()).expect("valid config");
        assert_eq!(config.bind_addr().to_string(), DEFAULT_BIND_ADDR);
        assert_eq!(config.calculation_url.as_str(), DEFAULT_CALCULATION_URL);
        assert_eq!(config.jwt_ttl, Duration::from_secs(3600));
        assert_eq!(config.calculation_timeout, Duration::from_secs(10));
        assert_eq!(config.db_max_connections, 10);
        assert!(config.redis_url.is_none());
        assert!(config.run_migrations);
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let mut vars = REQUIRED.to_vec();
        vars.extend([
            ("SOLAR_BIND_ADDR", "127.0.0.1:9000"),
            ("SOLAR_REDIS_URL", "redis://cache:6379"),
            ("SOLAR_JWT_TTL_SECS", "60"),
            ("SOLAR_RUN_MIGRATIONS", "false"),
        ]);
        let _guard = lock_env(env_with(&vars));

        let config = ServerConfig::try_from(load()).expect("valid config");
        assert_eq!(config.bind_addr().port(), 9000);
        assert_eq!(
            config.redis_url.as_deref().map(String::as_str),
            Some("redis://cache:6379")
        );
        assert_eq!(config.jwt_ttl, Duration::from_secs(60));
        assert!(!config.run_migrations);
    }

    #[rstest]
    #[case("SOLAR_DATABASE_URL")]
    #[case("SOLAR_JWT_SECRET")]
    #[case("SOLAR_SERVICE_TOKEN")]
    fn missing_secrets_fail_validation(#[case] absent: &'static str) {
        let vars: Vec<_> = REQUIRED
            .iter()
            .copied()
            .filter(|(name, _)| *name != absent)
            .collect();
        let _guard = lock_env(env_with(&vars));

        let err = ServerConfig::try_from(load()).err().expect("config should fail");
        assert_eq!(err, ConfigError::Missing { env: absent });
    }

    #[rstest]
    #[case("SOLAR_BIND_ADDR", "not-an-address")]
    #[case("SOLAR_CALCULATION_URL", "::nope")]
    #[case("SOLAR_DB_MAX_CONNECTIONS", "0")]
    #[case("SOLAR_CALCULATION_TIMEOUT_SECS", "0")]
    fn malformed_values_fail_validation(#[case] name: &'static str, #[case] value: &str) {
        let mut vars = REQUIRED.to_vec();
        vars.push((name, value));
        let _guard = lock_env(env_with(&vars));

        assert!(ServerConfig::try_from(load()).is_err());
    }
}
