//! Application configuration management.
//!
//! Configuration is read from `~/.config/nspconnect/config.json` when it
//! exists, and individual fields can be overridden through `NSPCONNECT_*`
//! environment variables (a `.env` file is honoured by the server binary).

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Application name used for the config directory path
const APP_NAME: &str = "nspconnect";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Seconds before expiry at which the access token is renewed.
const DEFAULT_RENEWAL_MARGIN_SECS: u64 = 10;

/// Page size used when listing the whole intent-type catalog.
const DEFAULT_SEARCH_PAGE_SIZE: u32 = 300;

/// Upper bound on search pages regardless of what the server reports.
/// 1000 pages of 300 is far beyond any real catalog.
const DEFAULT_MAX_SEARCH_PAGES: u32 = 1000;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub listen_addr: String,
    pub scheme: String,
    /// NSP deployments commonly run with self-signed certificates.
    pub accept_invalid_certs: bool,
    pub request_timeout_secs: u64,
    pub renewal_margin_secs: u64,
    pub search_page_size: u32,
    pub max_search_pages: u32,
    /// Directory for daily rolling log files; stderr only when unset.
    pub log_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            scheme: "https".to_string(),
            accept_invalid_certs: true,
            request_timeout_secs: 30,
            renewal_margin_secs: DEFAULT_RENEWAL_MARGIN_SECS,
            search_page_size: DEFAULT_SEARCH_PAGE_SIZE,
            max_search_pages: DEFAULT_MAX_SEARCH_PAGES,
            log_dir: None,
        }
    }
}

impl Config {
    /// Load the config file (defaults when absent) and apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = match Self::config_path() {
            Ok(path) => Self::load_from(&path)?,
            Err(e) => {
                warn!(error = %e, "No config directory, using defaults");
                Self::default()
            }
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    /// Apply `NSPCONNECT_*` overrides from the given lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup("NSPCONNECT_LISTEN") {
            self.listen_addr = addr;
        }
        if let Some(scheme) = lookup("NSPCONNECT_SCHEME") {
            self.scheme = scheme;
        }
        if let Some(value) = lookup("NSPCONNECT_INSECURE") {
            match parse_bool(&value) {
                Some(b) => self.accept_invalid_certs = b,
                None => warn!(value = %value, "Ignoring invalid NSPCONNECT_INSECURE"),
            }
        }
        if let Some(value) = lookup("NSPCONNECT_TIMEOUT_SECS") {
            match value.parse() {
                Ok(secs) => self.request_timeout_secs = secs,
                Err(_) => warn!(value = %value, "Ignoring invalid NSPCONNECT_TIMEOUT_SECS"),
            }
        }
        if let Some(dir) = lookup("NSPCONNECT_LOG_DIR") {
            self.log_dir = Some(PathBuf::from(dir));
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn renewal_margin(&self) -> Duration {
        Duration::from_secs(self.renewal_margin_secs)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"scheme":"http","search_page_size":50}"#).unwrap();
        assert_eq!(config.scheme, "http");
        assert_eq!(config.search_page_size, 50);
        assert_eq!(config.renewal_margin_secs, DEFAULT_RENEWAL_MARGIN_SECS);
        assert_eq!(config.max_search_pages, DEFAULT_MAX_SEARCH_PAGES);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = Config::load_from(Path::new("/nonexistent/nspconnect/config.json")).unwrap();
        assert_eq!(config.listen_addr, "0.0.0.0:8080");
        assert!(config.accept_invalid_certs);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("NSPCONNECT_LISTEN", "127.0.0.1:9000"),
            ("NSPCONNECT_INSECURE", "no"),
            ("NSPCONNECT_TIMEOUT_SECS", "not-a-number"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.listen_addr, "127.0.0.1:9000");
        assert!(!config.accept_invalid_certs);
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool(" off "), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
