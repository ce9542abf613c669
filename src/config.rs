use serde::Deserialize;
use std::env::VarError;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::{
    DEFAULT_BASE_URL, DEFAULT_CONCURRENCY_LIMIT, DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_LOG_DIR,
    DEFAULT_REFRESH_MAX_AGE_DAYS, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_STATE_DIR,
};
use crate::error::{Result, ScraperError};

/// What makes a page count as "has events" during discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingFilter {
    /// Any event container and no "no more events" notice.
    #[default]
    AnyEvents,
    /// At least one event starting in the current calendar year.
    CurrentYear,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    pub base_url: String,
    pub concurrency_limit: usize,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub listing_filter: ListingFilter,
    pub user_agent: Option<String>,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            concurrency_limit: DEFAULT_CONCURRENCY_LIMIT,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            listing_filter: ListingFilter::default(),
            user_agent: None,
        }
    }
}

impl ScrapeConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.concurrency_limit == 0 {
            return Err(ScraperError::Config(
                "concurrency_limit must be at least 1".to_string(),
            ));
        }
        if self.connect_timeout_secs == 0 || self.request_timeout_secs == 0 {
            return Err(ScraperError::Config("timeouts must be non-zero".to_string()));
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ScraperError::Config(format!(
                "base_url must be an http(s) URL, got '{}'",
                self.base_url
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub scrape: ScrapeConfig,
    pub state_dir: PathBuf,
    pub log_dir: PathBuf,
    pub refresh_max_age_days: i64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            scrape: ScrapeConfig::default(),
            state_dir: PathBuf::from(DEFAULT_STATE_DIR),
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
            refresh_max_age_days: DEFAULT_REFRESH_MAX_AGE_DAYS,
        }
    }
}

impl AppConfig {
    /// Load from an optional TOML file, then apply environment overrides.
    /// A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = fs::read_to_string(path).map_err(|e| {
                ScraperError::Config(format!(
                    "Failed to read config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
            Self::from_toml(&content)?
        } else {
            Self::default()
        };

        dotenv::dotenv().ok();
        config.apply_overrides(env_var)?;
        config.scrape.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Result<Option<String>>) -> Result<()> {
        if let Some(url) = lookup("EQUINE_EVENTS_BASE_URL")? {
            self.scrape.base_url = url;
        }
        if let Some(limit) = lookup("EQUINE_EVENTS_CONCURRENCY")? {
            self.scrape.concurrency_limit = limit.trim().parse().map_err(|_| {
                ScraperError::Config(format!("EQUINE_EVENTS_CONCURRENCY is not a number: {}", limit))
            })?;
        }
        if let Some(dir) = lookup("EQUINE_EVENTS_STATE_DIR")? {
            self.state_dir = PathBuf::from(dir);
        }
        Ok(())
    }

    pub fn refresh_max_age(&self) -> chrono::Duration {
        chrono::Duration::days(self.refresh_max_age_days)
    }
}

/// An unset variable is `None`; a set but non-UTF-8 one is an error.
fn env_var(key: &str) -> Result<Option<String>> {
    match std::env::var(key) {
        Ok(value) => Ok(Some(value)),
        Err(VarError::NotPresent) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.scrape.concurrency_limit, 5);
        assert_eq!(config.scrape.connect_timeout(), Duration::from_secs(15));
        assert_eq!(config.scrape.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.scrape.listing_filter, ListingFilter::AnyEvents);
        assert_eq!(config.refresh_max_age_days, 7);
        assert!(config.scrape.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AppConfig::from_toml(
            r#"
            state_dir = "/tmp/events"

            [scrape]
            base_url = "https://example.com/events"
            listing_filter = "current_year"
            "#,
        )
        .unwrap();
        assert_eq!(config.state_dir, PathBuf::from("/tmp/events"));
        assert_eq!(config.scrape.base_url, "https://example.com/events");
        assert_eq!(config.scrape.listing_filter, ListingFilter::CurrentYear);
        assert_eq!(config.scrape.concurrency_limit, 5);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("EQUINE_EVENTS_BASE_URL", "http://localhost:8080/events"),
            ("EQUINE_EVENTS_CONCURRENCY", "2"),
        ]
        .into_iter()
        .collect();
        let mut config = AppConfig::default();
        config
            .apply_overrides(|key| Ok(env.get(key).map(|v| v.to_string())))
            .unwrap();
        assert_eq!(config.scrape.base_url, "http://localhost:8080/events");
        assert_eq!(config.scrape.concurrency_limit, 2);
    }

    #[test]
    fn test_unreadable_env_var_is_an_error() {
        let mut config = AppConfig::default();
        let result = config.apply_overrides(|key| match key {
            "EQUINE_EVENTS_STATE_DIR" => Err(VarError::NotUnicode("\u{fffd}".into()).into()),
            _ => Ok(None),
        });
        assert!(matches!(result, Err(ScraperError::Env(VarError::NotUnicode(_)))));
    }

    #[test]
    fn test_unset_env_var_is_none() {
        assert_eq!(env_var("EQUINE_EVENTS_SURELY_UNSET_VARIABLE").unwrap(), None);
    }

    #[test]
    fn test_bad_concurrency_override_is_rejected() {
        let mut config = AppConfig::default();
        let result = config.apply_overrides(|key| match key {
            "EQUINE_EVENTS_CONCURRENCY" => Ok(Some("lots".to_string())),
            _ => Ok(None),
        });
        assert!(matches!(result, Err(ScraperError::Config(_))));
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = ScrapeConfig::default();
        config.concurrency_limit = 0;
        assert!(config.validate().is_err());

        let mut config = ScrapeConfig::default();
        config.base_url = "ftp://example.com".to_string();
        assert!(config.validate().is_err());

        let mut config = ScrapeConfig::default();
        config.request_timeout_secs = 0;
        assert!(config.validate().is_err());
    }
}
