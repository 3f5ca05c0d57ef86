use std::env;
use std::time::Duration;

use dotenvy::dotenv;
use thiserror::Error;
use url::Url;

const DEFAULT_EVENTS_URL: &str = "https://events.statsigapi.net/v1/log_event";
const DEFAULT_CONFIRMATION_DELAY_MS: u64 = 2000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("STATSIG_EVENTS_URL is not a valid url: {0}")]
    InvalidEventsUrl(#[from] url::ParseError),
    #[error("CONFIRMATION_DELAY_MS must be a number of milliseconds, got {0:?}")]
    InvalidDelay(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub statsig_server_key: Option<String>,
    pub statsig_events_url: Url,
    pub confirmation_delay: Duration,
}

impl Config {
    /// Reads the process environment, after loading `.env` if there is one.
    /// The bot token itself is picked up by `Bot::from_env`.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let statsig_server_key = get("STATSIG_SERVER_KEY").filter(|k| !k.trim().is_empty());
        let statsig_events_url = Url::parse(
            get("STATSIG_EVENTS_URL")
                .as_deref()
                .unwrap_or(DEFAULT_EVENTS_URL),
        )?;
        let confirmation_delay = match get("CONFIRMATION_DELAY_MS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(ms) => Duration::from_millis(ms),
                Err(_) => return Err(ConfigError::InvalidDelay(raw)),
            },
            None => Duration::from_millis(DEFAULT_CONFIRMATION_DELAY_MS),
        };

        Ok(Config {
            statsig_server_key,
            statsig_events_url,
            confirmation_delay,
        })
    }
}
