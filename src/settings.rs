//! Process settings from environment variables (a `.env` file is honoured by `Settings::load`).

use crate::error::ConfigError;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    /// `DATABASE_URL`, e.g. `sqlite://data.sqlite` or `sqlite::memory:`.
    pub database_url: String,
    pub max_connections: u32,
    pub bind_addr: String,
    pub log_level: String,
    /// JSON catalog; the built-in models are used when unset.
    pub models_path: Option<PathBuf>,
    /// Mount point for all model routes, e.g. `/api`.
    pub api_prefix: Option<String>,
    pub body_limit_bytes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            database_url: "sqlite://data.sqlite".into(),
            max_connections: 5,
            bind_addr: "127.0.0.1:8000".into(),
            log_level: "info".into(),
            models_path: None,
            api_prefix: None,
            body_limit_bytes: 1024 * 1024,
        }
    }
}

fn parse<T: FromStr>(key: &str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    match raw {
        Some(s) => s
            .trim()
            .parse()
            .map_err(|_| ConfigError::Settings(format!("{} has an invalid value: {}", key, s))),
        None => Ok(default),
    }
}

impl Settings {
    /// Load `.env` if present, then read the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = Settings::default();
        let api_prefix = lookup("API_PREFIX")
            .map(|p| p.trim().trim_end_matches('/').to_string())
            .filter(|p| !p.is_empty())
            .map(|p| if p.starts_with('/') { p } else { format!("/{}", p) });
        let settings = Settings {
            database_url: lookup("DATABASE_URL").unwrap_or(d.database_url),
            max_connections: parse("DATABASE_MAX_CONNECTIONS", lookup("DATABASE_MAX_CONNECTIONS"), d.max_connections)?,
            bind_addr: lookup("BIND_ADDR").unwrap_or(d.bind_addr),
            log_level: lookup("LOG_LEVEL").unwrap_or(d.log_level),
            models_path: lookup("MODELS_PATH").filter(|p| !p.is_empty()).map(PathBuf::from),
            api_prefix,
            body_limit_bytes: parse("BODY_LIMIT_BYTES", lookup("BODY_LIMIT_BYTES"), d.body_limit_bytes)?,
        };
        if settings.max_connections == 0 {
            return Err(ConfigError::Settings("DATABASE_MAX_CONNECTIONS must be > 0".into()));
        }
        if !settings.database_url.starts_with("sqlite:") {
            return Err(ConfigError::Settings(format!(
                "DATABASE_URL must be a sqlite url, got {}",
                settings.database_url
            )));
        }
        Ok(settings)
    }
}

/// Install the global tracing subscriber. `RUST_LOG` wins over `LOG_LEVEL`.
pub fn init_tracing(settings: &Settings) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("pantry={0},tower_http={0}", settings.log_level)));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from(pairs: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let env: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Settings::from_lookup(|k| env.get(k).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        assert_eq!(from(&[]).unwrap(), Settings::default());
    }

    #[test]
    fn reads_overrides() {
        let s = from(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("DATABASE_MAX_CONNECTIONS", "2"),
            ("API_PREFIX", "api/"),
            ("MODELS_PATH", "models.json"),
        ])
        .unwrap();
        assert_eq!(s.database_url, "sqlite::memory:");
        assert_eq!(s.max_connections, 2);
        assert_eq!(s.api_prefix.as_deref(), Some("/api"));
        assert_eq!(s.models_path, Some(PathBuf::from("models.json")));
    }

    #[test]
    fn rejects_bad_values() {
        assert!(from(&[("DATABASE_MAX_CONNECTIONS", "many")]).is_err());
        assert!(from(&[("DATABASE_MAX_CONNECTIONS", "0")]).is_err());
        assert!(from(&[("DATABASE_URL", "postgres://localhost/db")]).is_err());
    }
}
