//! Application configuration management

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};

use crate::services::events::DEFAULT_CAPACITY;

/// Output format of the log subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" | "text" => Ok(LogFormat::Pretty),
            other => anyhow::bail!("Unknown log format '{}': expected json or pretty", other),
        }
    }
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Bind address
    pub host: String,

    /// Server port
    pub port: u16,

    /// SQLite connection URL (`sqlite:` prefix required)
    pub database_url: String,

    pub database_max_connections: u32,

    /// Identity used when a request names none. `None` makes such requests anonymous.
    pub default_user_id: Option<String>,

    /// Per-event-name buffer before slow subscribers start skipping events
    pub event_bus_capacity: usize,

    /// JSON file of actors to seed on startup
    pub actors_seed_path: Option<PathBuf>,

    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 4000,
            database_url: "sqlite:./data/movies.db".to_string(),
            database_max_connections: 10,
            default_user_id: Some("iamuser".to_string()),
            event_bus_capacity: DEFAULT_CAPACITY,
            actors_seed_path: None,
            log_format: LogFormat::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key lookup; unset keys keep their defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Ok(Self {
            host: lookup("HOST").unwrap_or(defaults.host),

            port: match lookup("PORT") {
                Some(v) => v.parse().context("Invalid PORT")?,
                None => defaults.port,
            },

            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),

            database_max_connections: match lookup("DATABASE_MAX_CONNECTIONS") {
                Some(v) => v.parse().context("Invalid DATABASE_MAX_CONNECTIONS")?,
                None => defaults.database_max_connections,
            },

            // Set but empty disables the fallback identity
            default_user_id: match lookup("DEFAULT_USER_ID") {
                Some(v) if v.trim().is_empty() => None,
                Some(v) => Some(v.trim().to_string()),
                None => defaults.default_user_id,
            },

            event_bus_capacity: match lookup("EVENT_BUS_CAPACITY") {
                Some(v) => v.parse().context("Invalid EVENT_BUS_CAPACITY")?,
                None => defaults.event_bus_capacity,
            },

            actors_seed_path: lookup("ACTORS_SEED_PATH")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),

            log_format: match lookup("LOG_FORMAT") {
                Some(v) => v.parse()?,
                None => defaults.log_format,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.port, 4000);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.database_url, "sqlite:./data/movies.db");
        assert_eq!(config.database_max_connections, 10);
        assert_eq!(config.default_user_id.as_deref(), Some("iamuser"));
        assert_eq!(config.event_bus_capacity, 256);
        assert_eq!(config.actors_seed_path, None);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("PORT", "8080"),
            ("DATABASE_URL", "sqlite::memory:"),
            ("DEFAULT_USER_ID", "alice"),
            ("ACTORS_SEED_PATH", "./actors.json"),
            ("LOG_FORMAT", "pretty"),
        ])
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.default_user_id.as_deref(), Some("alice"));
        assert_eq!(config.actors_seed_path, Some(PathBuf::from("./actors.json")));
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_empty_default_user_disables_fallback() {
        let config = config_from(&[("DEFAULT_USER_ID", "")]).unwrap();
        assert_eq!(config.default_user_id, None);
    }

    #[test]
    fn test_invalid_values_are_errors() {
        assert!(config_from(&[("PORT", "not-a-port")]).is_err());
        assert!(config_from(&[("EVENT_BUS_CAPACITY", "-1")]).is_err());
        assert!(config_from(&[("LOG_FORMAT", "xml")]).is_err());
    }
}
