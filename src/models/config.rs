//! Application configuration structures.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Durable storage settings
    #[serde(default)]
    pub database: DatabaseConfig,

    /// External vacancy search settings
    #[serde(default)]
    pub search: SearchConfig,

    /// Telegram delivery settings
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Ingestion cycle policy
    #[serde(default)]
    pub cycle: CycleConfig,

    /// Log output settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Apply `DATABASE_URL` and `TELEGRAM_BOT_TOKEN` (or `BOT_TOKEN`) overrides.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("DATABASE_URL").filter(|v| !v.trim().is_empty()) {
            self.database.url = url;
        }
        if let Some(token) = lookup("TELEGRAM_BOT_TOKEN")
            .or_else(|| lookup("BOT_TOKEN"))
            .filter(|v| !v.trim().is_empty())
        {
            self.telegram.bot_token = token;
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.database.url.trim().is_empty() {
            return Err(AppError::validation("database.url is empty"));
        }
        if self.database.max_connections == 0 {
            return Err(AppError::validation("database.max_connections must be > 0"));
        }
        if self.search.user_agent.trim().is_empty() {
            return Err(AppError::validation("search.user_agent is empty"));
        }
        if self.search.timeout_secs == 0 {
            return Err(AppError::validation("search.timeout_secs must be > 0"));
        }
        if self.search.per_page == 0 || self.search.per_page > 100 {
            return Err(AppError::validation("search.per_page must be within 1..=100"));
        }
        if self.search.per_page < self.cycle.max_new_per_subscription {
            return Err(AppError::validation(
                "search.per_page must be >= cycle.max_new_per_subscription",
            ));
        }
        if self.telegram.timeout_secs == 0 {
            return Err(AppError::validation("telegram.timeout_secs must be > 0"));
        }
        if self.cycle.max_new_per_subscription == 0 {
            return Err(AppError::validation(
                "cycle.max_new_per_subscription must be > 0",
            ));
        }
        if self.cycle.search_timeout_secs == 0 {
            return Err(AppError::validation("cycle.search_timeout_secs must be > 0"));
        }
        if self.cycle.max_concurrent == 0 {
            return Err(AppError::validation("cycle.max_concurrent must be > 0"));
        }
        if self.cycle.interval_secs == 0 {
            return Err(AppError::validation("cycle.interval_secs must be > 0"));
        }
        Ok(())
    }
}

/// SQLite connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// sqlx connection URL, e.g. `sqlite://data/jobwatch.db`
    #[serde(default = "defaults::database_url")]
    pub url: String,

    /// Pool size; every concurrent subscription task borrows its own connection
    #[serde(default = "defaults::max_connections")]
    pub max_connections: u32,

    /// How long a writer waits on a locked database
    #[serde(default = "defaults::busy_timeout")]
    pub busy_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: defaults::database_url(),
            max_connections: defaults::max_connections(),
            busy_timeout_secs: defaults::busy_timeout(),
        }
    }
}

/// hh.ru API client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// API root
    #[serde(default = "defaults::search_base_url")]
    pub base_url: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::http_timeout")]
    pub timeout_secs: u64,

    /// Items requested per search (hh.ru caps this at 100)
    #[serde(default = "defaults::per_page")]
    pub per_page: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::search_base_url(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::http_timeout(),
            per_page: defaults::per_page(),
        }
    }
}

/// Telegram Bot API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default = "defaults::telegram_api_url")]
    pub api_url: String,

    /// Bot token; usually supplied through `TELEGRAM_BOT_TOKEN`
    #[serde(default)]
    pub bot_token: String,

    #[serde(default = "defaults::http_timeout")]
    pub timeout_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            api_url: defaults::telegram_api_url(),
            bot_token: String::new(),
            timeout_secs: defaults::http_timeout(),
        }
    }
}

/// Per-cycle caps, pacing and scheduling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleConfig {
    /// New listings persisted and notified per subscription per cycle
    #[serde(default = "defaults::max_new_per_subscription")]
    pub max_new_per_subscription: usize,

    /// Minimum delay after every send, in milliseconds
    #[serde(default = "defaults::send_delay")]
    pub send_delay_ms: u64,

    /// Upper bound for a single search call
    #[serde(default = "defaults::search_timeout")]
    pub search_timeout_secs: u64,

    /// Subscriptions processed in parallel
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,

    /// Interval between cycles in `watch` mode
    #[serde(default = "defaults::interval")]
    pub interval_secs: u64,
}

impl CycleConfig {
    pub fn send_delay(&self) -> Duration {
        Duration::from_millis(self.send_delay_ms)
    }

    pub fn search_timeout(&self) -> Duration {
        Duration::from_secs(self.search_timeout_secs)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            max_new_per_subscription: defaults::max_new_per_subscription(),
            send_delay_ms: defaults::send_delay(),
            search_timeout_secs: defaults::search_timeout(),
            max_concurrent: defaults::max_concurrent(),
            interval_secs: defaults::interval(),
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` and `--verbose` are absent
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
    // Database defaults
    pub fn database_url() -> String {
        "sqlite://data/jobwatch.db".into()
    }
    pub fn max_connections() -> u32 {
        5
    }
    pub fn busy_timeout() -> u64 {
        5
    }

    // Search defaults
    pub fn search_base_url() -> String {
        "https://api.hh.ru".into()
    }
    pub fn user_agent() -> String {
        "HH Jobs Bot/1.0".into()
    }
    pub fn http_timeout() -> u64 {
        30
    }
    pub fn per_page() -> usize {
        50
    }

    pub fn telegram_api_url() -> String {
        "https://api.telegram.org".into()
    }

    // Cycle defaults
    pub fn max_new_per_subscription() -> usize {
        5
    }
    pub fn send_delay() -> u64 {
        500
    }
    pub fn search_timeout() -> u64 {
        60
    }
    pub fn max_concurrent() -> usize {
        1
    }
    pub fn interval() -> u64 {
        15 * 60
    }

    pub fn log_level() -> String {
        "info".into()
    }
}
