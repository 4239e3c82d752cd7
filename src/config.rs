//! Runtime configuration read from the environment (and `.env` via `dotenvy`).

use anyhow::{Context, Result};
use std::path::PathBuf;

pub const DEFAULT_BASE_URL: &str = "https://web.spaggiari.eu/rest/v1";
pub const DEFAULT_API_KEY: &str = "Tg1NWEwNGIgIC0K";
pub const DEFAULT_USER_AGENT: &str = "CVVS/std/4.1.7 Android/10";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_CORS_ORIGIN: &str = "*";
pub const DEFAULT_SESSION_PATH: &str = ".gradebook/session.json";

/// Upstream API coordinates plus the proxy and session settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub base_url: String,
    pub api_key: String,
    pub user_agent: String,
    pub port: u16,
    pub cors_origin: String,
    pub session_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: DEFAULT_API_KEY.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            port: DEFAULT_PORT,
            cors_origin: DEFAULT_CORS_ORIGIN.to_string(),
            session_path: PathBuf::from(DEFAULT_SESSION_PATH),
        }
    }
}

impl Config {
    /// Reads the process environment, falling back to defaults for unset keys.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup.
    ///
    /// Recognised keys: `CLASSEVIVA_BASE_URL`, `CLASSEVIVA_API_KEY`,
    /// `CLASSEVIVA_USER_AGENT`, `PORT`, `CORS_ORIGIN`, `SESSION_PATH`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port = match lookup("PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("PORT must be a port number, got '{raw}'"))?,
            None => defaults.port,
        };

        Ok(Self {
            base_url: lookup("CLASSEVIVA_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            api_key: lookup("CLASSEVIVA_API_KEY").unwrap_or(defaults.api_key),
            user_agent: lookup("CLASSEVIVA_USER_AGENT").unwrap_or(defaults.user_agent),
            port,
            cors_origin: lookup("CORS_ORIGIN").unwrap_or(defaults.cors_origin),
            session_path: lookup("SESSION_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.session_path),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("CLASSEVIVA_BASE_URL", "http://localhost:9000/rest/v1/"),
            ("PORT", "8080"),
            ("CORS_ORIGIN", "https://grades.example.org"),
        ]))
        .unwrap();

        assert_eq!(config.base_url, "http://localhost:9000/rest/v1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.cors_origin, "https://grades.example.org");
        assert_eq!(config.api_key, DEFAULT_API_KEY);
    }

    #[test]
    fn test_bad_port() {
        let err = Config::from_lookup(lookup_from(&[("PORT", "eighty")])).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }
}
