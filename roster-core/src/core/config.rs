use std::time::Duration;

use chrono_tz::Tz;
use shared::error::{AppError, AppResult};

/// Largest accepted birthday window (half a year each way)
pub const MAX_BIRTHDAY_WINDOW_DAYS: u32 = 182;

/// Roster configuration
///
/// # Environment variables
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | ROSTER_BACKEND_URL | http://localhost:54321 | Backend base URL |
/// | ROSTER_API_KEY | (empty) | API key sent with every request |
/// | ROSTER_MEMBER_TABLE | jemaat | Member table |
/// | ROSTER_ADMIN_TABLE | admins | Admin role table |
/// | ROSTER_PHOTO_BUCKET | photos | Photo bucket |
/// | ROSTER_BIRTHDAY_RPC | upcoming_birthdays | Birthday aggregate function |
/// | ROSTER_PAGE_SIZE | 9 | Members per page |
/// | ROSTER_SEARCH_DEBOUNCE_MS | 400 | Search quiescence interval |
/// | ROSTER_BIRTHDAY_WINDOW_DAYS | 7 | Birthday window half-width |
/// | ROSTER_MAX_PHOTO_BYTES | 5242880 | Photo size limit |
/// | ROSTER_TIMEZONE | Asia/Jakarta | Business time zone |
/// | ROSTER_REQUEST_TIMEOUT_MS | 30000 | HTTP timeout |
/// | LOG_LEVEL | info | Log level |
/// | LOG_JSON | false | JSON log lines |
/// | LOG_DIR | (none) | Daily rolling log directory |
/// | ENVIRONMENT | development | Environment name |
///
/// # Example
///
/// ```ignore
/// ROSTER_PAGE_SIZE=12 ROSTER_TIMEZONE=Asia/Makassar roster
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    pub backend_url: String,
    pub api_key: String,
    pub member_table: String,
    pub admin_table: String,
    pub photo_bucket: String,
    pub birthday_rpc: String,
    /// Fixed page size of the roster
    pub page_size: u32,
    pub search_debounce_ms: u64,
    pub birthday_window_days: u32,
    pub max_photo_bytes: usize,
    /// IANA zone name used to derive "today"
    pub timezone: String,
    pub request_timeout_ms: u64,
    pub log_level: String,
    pub log_json: bool,
    pub log_dir: Option<String>,
    /// development | staging | production
    pub environment: String,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Unset or unparseable variables fall back to their defaults.
    pub fn from_env() -> Self {
        Self {
            backend_url: env_or("ROSTER_BACKEND_URL", "http://localhost:54321"),
            api_key: env_or("ROSTER_API_KEY", ""),
            member_table: env_or("ROSTER_MEMBER_TABLE", "jemaat"),
            admin_table: env_or("ROSTER_ADMIN_TABLE", "admins"),
            photo_bucket: env_or("ROSTER_PHOTO_BUCKET", "photos"),
            birthday_rpc: env_or("ROSTER_BIRTHDAY_RPC", "upcoming_birthdays"),
            page_size: env_parse("ROSTER_PAGE_SIZE", 9),
            search_debounce_ms: env_parse("ROSTER_SEARCH_DEBOUNCE_MS", 400),
            birthday_window_days: env_parse("ROSTER_BIRTHDAY_WINDOW_DAYS", 7),
            max_photo_bytes: env_parse("ROSTER_MAX_PHOTO_BYTES", 5 * 1024 * 1024),
            timezone: env_or("ROSTER_TIMEZONE", "Asia/Jakarta"),
            request_timeout_ms: env_parse("ROSTER_REQUEST_TIMEOUT_MS", 30000),
            log_level: env_or("LOG_LEVEL", "info"),
            log_json: env_parse("LOG_JSON", false),
            log_dir: std::env::var("LOG_DIR").ok().filter(|d| !d.is_empty()),
            environment: env_or("ENVIRONMENT", "development"),
        }
    }

    /// Load `.env`, read the environment and validate
    pub fn load() -> AppResult<Self> {
        dotenv::dotenv().ok();
        let config = Self::from_env();
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.page_size == 0 {
            return Err(AppError::config("ROSTER_PAGE_SIZE must be at least 1"));
        }
        if self.search_debounce_ms == 0 {
            return Err(AppError::config("ROSTER_SEARCH_DEBOUNCE_MS must be at least 1"));
        }
        if self.birthday_window_days > MAX_BIRTHDAY_WINDOW_DAYS {
            return Err(AppError::config(format!(
                "ROSTER_BIRTHDAY_WINDOW_DAYS must be at most {}",
                MAX_BIRTHDAY_WINDOW_DAYS
            )));
        }
        if self.timezone.parse::<Tz>().is_err() {
            return Err(AppError::config(format!(
                "Unknown time zone: {}",
                self.timezone
            ))
            .with_detail("timezone", self.timezone.clone()));
        }
        Ok(())
    }

    /// Business time zone (Asia/Jakarta if the name is unknown)
    pub fn tz(&self) -> Tz {
        self.timezone.parse().unwrap_or(chrono_tz::Asia::Jakarta)
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Config {
        Config {
            backend_url: "http://localhost:54321".into(),
            api_key: String::new(),
            member_table: "jemaat".into(),
            admin_table: "admins".into(),
            photo_bucket: "photos".into(),
            birthday_rpc: "upcoming_birthdays".into(),
            page_size: 9,
            search_debounce_ms: 400,
            birthday_window_days: 7,
            max_photo_bytes: 5 * 1024 * 1024,
            timezone: "Asia/Jakarta".into(),
            request_timeout_ms: 30000,
            log_level: "info".into(),
            log_json: false,
            log_dir: None,
            environment: "development".into(),
        }
    }

    #[test]
    fn test_validate_accepts_defaults() {
        assert!(base().validate().is_ok());
        assert_eq!(base().tz(), chrono_tz::Asia::Jakarta);
        assert_eq!(base().search_debounce(), Duration::from_millis(400));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = base();
        config.page_size = 0;
        assert_eq!(
            config.validate().unwrap_err().code,
            shared::error::ErrorCode::ConfigError
        );

        let mut config = base();
        config.search_debounce_ms = 0;
        assert!(config.validate().is_err());

        let mut config = base();
        config.birthday_window_days = 200;
        assert!(config.validate().is_err());

        let mut config = base();
        config.timezone = "Mars/Olympus".into();
        assert!(config.validate().is_err());
        assert_eq!(config.tz(), chrono_tz::Asia::Jakarta);
    }
}
