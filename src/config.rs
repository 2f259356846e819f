use std::env;
use std::path::PathBuf;

use chrono::Duration;
use thiserror::Error;

/// Kept outside `target/`, which cargo-leptos wipes on every rebuild.
const DEFAULT_TICKET_DIR: &str = "data/tickets";

/// Runtime settings, read from the environment (and `.env`) once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub admin_password: String,
    /// Event name stamped on every new invite.
    pub event_name: String,
    pub invite_validity_days: i64,
    pub default_table_capacity: i32,
    /// Origin used to build invite links and ticket URLs, without a trailing slash.
    pub public_base_url: String,
    /// Directory the generated tickets are written to. Served under `/tickets`.
    pub ticket_dir: PathBuf,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set in .env")]
    Missing(&'static str),
    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let database_url = required("DATABASE_URL")?;
        let admin_password = required("ADMIN_PASSWORD")?;
        let event_name = env::var("EVENT_NAME").unwrap_or_else(|_| "Our Wedding".to_string());
        let invite_validity_days = parsed("INVITE_VALIDITY_DAYS", 90)?;
        let default_table_capacity = parsed("DEFAULT_TABLE_CAPACITY", 10)?;
        if default_table_capacity < 1 {
            return Err(ConfigError::Invalid {
                name: "DEFAULT_TABLE_CAPACITY",
                value: default_table_capacity.to_string(),
            });
        }
        let public_base_url = env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:3000".to_string())
            .trim_end_matches('/')
            .to_string();
        let ticket_dir = ticket_dir(env::var("TICKET_DIR").ok());

        Ok(Self {
            database_url,
            admin_password,
            event_name,
            invite_validity_days,
            default_table_capacity,
            public_base_url,
            ticket_dir,
        })
    }

    /// How long a freshly created invite stays valid.
    pub fn invite_validity(&self) -> Duration {
        Duration::days(self.invite_validity_days)
    }
}

fn ticket_dir(value: Option<String>) -> PathBuf {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_TICKET_DIR))
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::Missing(name))
}

fn parsed<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(default),
    }
}
