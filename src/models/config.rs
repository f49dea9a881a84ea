//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::Animal;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote feed settings
    #[serde(default)]
    pub feed: FeedConfig,

    /// Poll loop timing
    #[serde(default)]
    pub poll: PollConfig,

    /// Notification sink
    #[serde(default)]
    pub notifier: NotifierConfig,

    /// Record store location
    #[serde(default)]
    pub storage: StorageConfig,

    /// Eligibility rules applied before ingest
    #[serde(default)]
    pub filter: FilterConfig,

    /// Log output
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration, or defaults when the file does not exist.
    ///
    /// A file that exists but cannot be read or parsed is an error.
    pub fn load_if_present(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::warn!("No config file at {:?}. Using defaults.", path);
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from a key lookup.
    ///
    /// Unset or empty values leave the current setting untouched.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(raw) = get(env::FREQUENCY) {
            self.poll.interval_secs = raw.trim().parse().map_err(|e| {
                AppError::config(format!(
                    "{} must be a whole number of seconds: {e}",
                    env::FREQUENCY
                ))
            })?;
        }
        if let Some(url) = get(env::SLACK_TOKEN) {
            self.notifier.webhook_url = url.trim().to_string();
        }
        if let Some(url) = get(env::FEED_URL) {
            self.feed.url = url.trim().to_string();
        }
        if let Some(path) = get(env::DATABASE_PATH) {
            self.storage.database_path = PathBuf::from(path.trim());
        }
        Ok(())
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.feed.url)
            .map_err(|e| AppError::config(format!("feed.url is invalid: {e}")))?;
        if self.feed.user_agent.trim().is_empty() {
            return Err(AppError::config("feed.user_agent is empty"));
        }
        if self.feed.timeout_secs == 0 {
            return Err(AppError::config("feed.timeout_secs must be > 0"));
        }
        if self.poll.interval_secs == 0 {
            return Err(AppError::config("poll.interval_secs must be > 0"));
        }
        if let Some(webhook) = self.notifier.webhook() {
            url::Url::parse(webhook).map_err(|e| {
                AppError::config(format!("notifier.webhook_url is invalid: {e}"))
            })?;
        }
        if self.storage.database_path.as_os_str().is_empty() {
            return Err(AppError::config("storage.database_path is empty"));
        }
        Ok(())
    }
}

/// Environment variable names recognised as overrides.
pub mod env {
    pub const FREQUENCY: &str = "FREQUENCY";
    pub const SLACK_TOKEN: &str = "SLACK_TOKEN";
    pub const FEED_URL: &str = "FEED_URL";
    pub const DATABASE_PATH: &str = "DATABASE_PATH";
}

/// Remote feed settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// URL returning the adoptable-animal JSON array
    #[serde(default = "defaults::feed_url")]
    pub url: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: defaults::feed_url(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Poll loop timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    /// Seconds to sleep between cycles
    #[serde(default = "defaults::interval")]
    pub interval_secs: u64,
}

impl PollConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: defaults::interval(),
        }
    }
}

/// Notification sink settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
    /// Incoming-webhook URL; empty means log-only
    #[serde(default)]
    pub webhook_url: String,

    /// Attachment footer text
    #[serde(default = "defaults::footer")]
    pub footer: String,

    /// Attachment footer icon URL
    #[serde(default = "defaults::footer_icon")]
    pub footer_icon: String,
}

impl NotifierConfig {
    /// The configured webhook, if any.
    pub fn webhook(&self) -> Option<&str> {
        let url = self.webhook_url.trim();
        (!url.is_empty()).then_some(url)
    }
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            webhook_url: String::new(),
            footer: defaults::footer(),
            footer_icon: defaults::footer_icon(),
        }
    }
}

/// Record store location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite database file
    #[serde(default = "defaults::database_path")]
    pub database_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: defaults::database_path(),
        }
    }
}

/// Eligibility rules applied to observed animals before ingest.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Ignore animals older than this many whole years
    #[serde(default)]
    pub max_age_years: Option<u32>,
}

impl FilterConfig {
    /// Whether an observed animal should be tracked.
    ///
    /// Ages that cannot be read are always eligible.
    pub fn is_eligible(&self, animal: &Animal) -> bool {
        match (self.max_age_years, age_in_years(&animal.age)) {
            (Some(limit), Some(years)) => years <= limit,
            _ => true,
        }
    }
}

const YEARS_PATTERN: &str = r"(?i)(\d+)\s*(?:years?|yrs?)\b";
const UNDER_A_YEAR_PATTERN: &str = r"(?i)\d+\s*(?:months?|weeks?|days?)\b";

static YEARS: LazyLock<Option<Regex>> = LazyLock::new(|| compile(YEARS_PATTERN));
static UNDER_A_YEAR: LazyLock<Option<Regex>> = LazyLock::new(|| compile(UNDER_A_YEAR_PATTERN));

fn compile(pattern: &str) -> Option<Regex> {
    Regex::new(pattern)
        .inspect_err(|e| log::error!("Age pattern {:?} does not compile: {}", pattern, e))
        .ok()
}

/// Whole years from free-text ages like "2 years 3 months" or "5 weeks".
fn age_in_years(age: &str) -> Option<u32> {
    if let Some(caps) = YEARS.as_ref()?.captures(age) {
        return caps.get(1)?.as_str().parse().ok();
    }
    UNDER_A_YEAR.as_ref()?.is_match(age).then_some(0)
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default level when RUST_LOG is unset
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    pub fn feed_url() -> String {
        "https://www.boulderhumane.org/wp-content/plugins/Petpoint-Webservices-2018/pullanimals.php?type=dog".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; shelterwatch/0.1)".into()
    }
    pub fn timeout() -> u64 {
        20
    }
    pub fn interval() -> u64 {
        30
    }
    pub fn footer() -> String {
        "doggo api".into()
    }
    pub fn footer_icon() -> String {
        "https://platform.slack-edge.com/img/default_application_icon.png".into()
    }
    pub fn database_path() -> PathBuf {
        PathBuf::from("data/animals.db")
    }
    pub fn log_level() -> String {
        "info".into()
    }
}
