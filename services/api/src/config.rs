//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use chrono::TimeDelta;
use cinema_core::TextRepair;
use sqlx::postgres::PgConnectOptions;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database: PgConnectOptions,
    pub db_max_connections: u32,
    pub run_migrations: bool,
    pub log_level: Level,
    pub text_repair: TextRepair,
    pub session_ttl: TimeDelta,
    pub session_purge_interval_secs: u64,
    pub static_dir: PathBuf,
    pub cors_allowed_origins: Vec<String>,
    pub cookie_secure: bool,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        // --- Server and Database Settings ---
        let bind_address = parse_var("BIND_ADDRESS", &var_or("BIND_ADDRESS", "0.0.0.0:8000"))?;

        let database = match lookup("DATABASE_URL") {
            Some(url) => url
                .parse::<PgConnectOptions>()
                .map_err(|e| ConfigError::InvalidValue("DATABASE_URL".to_string(), e.to_string()))?,
            None => connect_options_from_parts(&lookup)?,
        };

        let db_max_connections = parse_var("DB_MAX_CONNECTIONS", &var_or("DB_MAX_CONNECTIONS", "5"))?;
        let run_migrations = parse_bool("RUN_MIGRATIONS", &var_or("RUN_MIGRATIONS", "true"))?;

        let log_level_str = var_or("RUST_LOG", "INFO");
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let text_repair = var_or("TEXT_REPAIR", "off")
            .parse::<TextRepair>()
            .map_err(|e| ConfigError::InvalidValue("TEXT_REPAIR".to_string(), e))?;

        // --- Login Sessions ---
        let session_ttl_hours: i64 = parse_var("SESSION_TTL_HOURS", &var_or("SESSION_TTL_HOURS", "12"))?;
        let session_ttl = match TimeDelta::try_hours(session_ttl_hours) {
            Some(ttl) if (1..=MAX_SESSION_TTL_HOURS).contains(&session_ttl_hours) => ttl,
            _ => {
                return Err(ConfigError::InvalidValue(
                    "SESSION_TTL_HOURS".to_string(),
                    format!("must be between 1 and {}", MAX_SESSION_TTL_HOURS),
                ))
            }
        };
        let session_purge_interval_secs: u64 = parse_var(
            "SESSION_PURGE_INTERVAL_SECS",
            &var_or("SESSION_PURGE_INTERVAL_SECS", "3600"),
        )?;
        if session_purge_interval_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "SESSION_PURGE_INTERVAL_SECS".to_string(),
                "must be positive".to_string(),
            ));
        }

        // --- Web Settings ---
        let static_dir = PathBuf::from(var_or("STATIC_DIR", "./static"));

        let cors_allowed_origins = var_or("CORS_ALLOWED_ORIGINS", "")
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect();

        let cookie_secure = parse_bool("COOKIE_SECURE", &var_or("COOKIE_SECURE", "false"))?;

        Ok(Self {
            bind_address,
            database,
            db_max_connections,
            run_migrations,
            log_level,
            text_repair,
            session_ttl,
            session_purge_interval_secs,
            static_dir,
            cors_allowed_origins,
            cookie_secure,
        })
    }
}

/// Longest login session accepted from `SESSION_TTL_HOURS` (one leap year).
const MAX_SESSION_TTL_HOURS: i64 = 24 * 366;

/// Builds connection options from the individual `DB_*` variables.
/// An empty `DB_PASSWORD` connects without a password.
fn connect_options_from_parts<F>(lookup: &F) -> Result<PgConnectOptions, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let name = lookup("DB_NAME").unwrap_or_else(|| "cinema_db".to_string());
    let user = lookup("DB_USER").unwrap_or_else(|| "postgres".to_string());
    let password = lookup("DB_PASSWORD").unwrap_or_default();
    let host = lookup("DB_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
    let port: u16 = parse_var("DB_PORT", &lookup("DB_PORT").unwrap_or_else(|| "5432".to_string()))?;

    let options = PgConnectOptions::new()
        .host(&host)
        .port(port)
        .username(&user)
        .database(&name);
    if password.is_empty() {
        Ok(options)
    } else {
        Ok(options.password(&password))
    }
}

fn parse_var<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidValue(key.to_string(), e.to_string()))
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidValue(
            key.to_string(),
            format!("'{}' is not a boolean", other),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_match_local_development_setup() {
        let config = load(&[]).unwrap();
        assert_eq!(config.bind_address, "0.0.0.0:8000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.database.get_host(), "127.0.0.1");
        assert_eq!(config.database.get_port(), 5432);
        assert_eq!(config.database.get_username(), "postgres");
        assert_eq!(config.database.get_database(), Some("cinema_db"));
        assert_eq!(config.db_max_connections, 5);
        assert!(config.run_migrations);
        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(config.text_repair, TextRepair::Off);
        assert_eq!(config.session_ttl, TimeDelta::hours(12));
        assert!(config.cors_allowed_origins.is_empty());
        assert!(!config.cookie_secure);
    }

    #[test]
    fn database_url_takes_precedence_over_parts() {
        let config = load(&[
            ("DATABASE_URL", "postgres://app:secret@db/cinema"),
            ("DB_NAME", "ignored"),
        ])
        .unwrap();
        assert_eq!(config.database.get_host(), "db");
        assert_eq!(config.database.get_username(), "app");
        assert_eq!(config.database.get_database(), Some("cinema"));
    }

    #[test]
    fn reserved_characters_in_password_do_not_leak_into_address() {
        let config = load(&[
            ("DB_PASSWORD", "p@ss/w:rd"),
            ("DB_HOST", "localhost"),
            ("DB_PORT", "6543"),
        ])
        .unwrap();
        assert_eq!(config.database.get_host(), "localhost");
        assert_eq!(config.database.get_port(), 6543);
        assert_eq!(config.database.get_username(), "postgres");
        assert_eq!(config.database.get_database(), Some("cinema_db"));
        assert!(format!("{:?}", config.database).contains("\"p@ss/w:rd\""));
    }

    #[test]
    fn parses_lists_and_modes() {
        let config = load(&[
            ("CORS_ALLOWED_ORIGINS", "http://localhost:3000, ,http://kino.local"),
            ("TEXT_REPAIR", "latin1"),
            ("RUN_MIGRATIONS", "no"),
        ])
        .unwrap();
        assert_eq!(
            config.cors_allowed_origins,
            vec!["http://localhost:3000", "http://kino.local"]
        );
        assert_eq!(config.text_repair, TextRepair::Latin1);
        assert!(!config.run_migrations);
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(matches!(
            load(&[("BIND_ADDRESS", "nowhere")]),
            Err(ConfigError::InvalidValue(key, _)) if key == "BIND_ADDRESS"
        ));
        assert!(matches!(
            load(&[("RUST_LOG", "chatty")]),
            Err(ConfigError::InvalidValue(key, _)) if key == "RUST_LOG"
        ));
        assert!(matches!(
            load(&[("TEXT_REPAIR", "koi8")]),
            Err(ConfigError::InvalidValue(key, _)) if key == "TEXT_REPAIR"
        ));
        assert!(matches!(
            load(&[("SESSION_TTL_HOURS", "0")]),
            Err(ConfigError::InvalidValue(key, _)) if key == "SESSION_TTL_HOURS"
        ));
        assert!(matches!(
            load(&[("SESSION_TTL_HOURS", "9000000000000")]),
            Err(ConfigError::InvalidValue(key, _)) if key == "SESSION_TTL_HOURS"
        ));
        assert!(matches!(
            load(&[("DB_PORT", "postgres")]),
            Err(ConfigError::InvalidValue(key, _)) if key == "DB_PORT"
        ));
        assert!(matches!(
            load(&[("DATABASE_URL", "not a url")]),
            Err(ConfigError::InvalidValue(key, _)) if key == "DATABASE_URL"
        ));
    }
}
