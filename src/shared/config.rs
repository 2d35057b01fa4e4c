//! Application configuration. Bind address, data directory, sessions, seeding.
//!
//! Read from `TUTOR_MATCH_*` environment variables and, when `TUTOR_MATCH_CONFIG` names one,
//! a config file. Environment wins over the file. `main` loads `.env` before this runs.

use serde::Deserialize;
use std::path::PathBuf;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8000";
pub const DEFAULT_DATA_DIR: &str = "./data";
/// Two weeks.
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 336;
pub const DEFAULT_SEED_USER_COUNT: u64 = 300;

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Address the web server listens on. Read from TUTOR_MATCH_BIND_ADDR.
    #[serde(default)]
    pub bind_addr: Option<String>,

    /// Directory holding the database file. Read from TUTOR_MATCH_DATA_DIR.
    #[serde(default)]
    pub data_dir: Option<String>,

    /// Session lifetime after the last write. Read from TUTOR_MATCH_SESSION_TTL_HOURS.
    #[serde(default)]
    pub session_ttl_hours: Option<i64>,

    /// Mark the session cookie `Secure` (HTTPS deployments). Read from TUTOR_MATCH_COOKIE_SECURE.
    #[serde(default)]
    pub cookie_secure: Option<bool>,

    /// Total users the seeder fills up to. Read from TUTOR_MATCH_SEED_USER_COUNT.
    #[serde(default)]
    pub seed_user_count: Option<u64>,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let mut c = config::Config::builder();
        if let Ok(path) = std::env::var("TUTOR_MATCH_CONFIG") {
            c = c.add_source(config::File::with_name(&path));
        }
        c = c.add_source(config::Environment::with_prefix("TUTOR_MATCH").try_parsing(true));
        c.build()?.try_deserialize()
    }

    pub fn bind_addr_or_default(&self) -> String {
        self.bind_addr
            .clone()
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
    }

    pub fn data_dir_or_default(&self) -> PathBuf {
        PathBuf::from(self.data_dir.as_deref().unwrap_or(DEFAULT_DATA_DIR))
    }

    /// Non-positive values fall back to the default.
    pub fn session_ttl(&self) -> chrono::Duration {
        let hours = self
            .session_ttl_hours
            .filter(|h| *h > 0)
            .unwrap_or(DEFAULT_SESSION_TTL_HOURS);
        chrono::Duration::hours(hours)
    }

    pub fn cookie_secure(&self) -> bool {
        self.cookie_secure.unwrap_or(false)
    }

    pub fn seed_user_count_or_default(&self) -> u64 {
        self.seed_user_count.unwrap_or(DEFAULT_SEED_USER_COUNT)
    }
}
