use std::env;
use std::fmt;
use std::num::NonZeroUsize;
use std::time::Duration;

use thiserror::Error;
use ticker_cache::{CacheSettings, StalePolicy};

use crate::utils;

const DEFAULT_HOST: &str = "localhost";
const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} environment variable is required and not found")]
    Missing(&'static str),
    #[error("{name} is not valid: '{value}'")]
    Invalid { name: &'static str, value: String },
}

#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
    pub api_key: String,
    pub alphavantage_base_url: Option<String>,
    pub cache: CacheSettings,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("workers", &self.workers)
            .field("api_key", &"<redacted>")
            .field("alphavantage_base_url", &self.alphavantage_base_url)
            .field("cache", &self.cache)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Config, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| -> Result<String, ConfigError> {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .ok_or(ConfigError::Missing(name))
        };
        let invalid = |name: &'static str, value: &str| ConfigError::Invalid {
            name,
            value: value.to_string(),
        };

        let api_key = required("API_KEY")?;

        let raw_symbol = required("SYMBOL")?;
        let symbol = utils::sanitize_symbol(&raw_symbol);
        if symbol.is_empty() {
            return Err(invalid("SYMBOL", &raw_symbol));
        }

        let ndays = required("NDAYS")?;
        let window_size: NonZeroUsize = ndays.trim().parse().map_err(|_| invalid("NDAYS", &ndays))?;

        let mut cache = CacheSettings::new(symbol, window_size);

        if let Some(value) = lookup("CACHE_TTL_SECS") {
            let secs: u64 = value.trim().parse().map_err(|_| invalid("CACHE_TTL_SECS", &value))?;
            cache = cache.with_freshness(Duration::from_secs(secs));
        }

        if let Some(value) = lookup("UPSTREAM_TIMEOUT_SECS") {
            let secs: u64 = value
                .trim()
                .parse()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| invalid("UPSTREAM_TIMEOUT_SECS", &value))?;
            cache = cache.with_upstream_timeout(Duration::from_secs(secs));
        }

        if let Some(value) = lookup("SERVE_STALE_ON_ERROR") {
            let serve_stale =
                utils::parse_flag(&value).ok_or_else(|| invalid("SERVE_STALE_ON_ERROR", &value))?;
            if serve_stale {
                cache = cache.with_stale_policy(StalePolicy::ServeStale);
            }
        }

        let host = lookup("HOST")
            .filter(|host| !host.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = match lookup("PORT") {
            Some(value) => value.trim().parse().map_err(|_| invalid("PORT", &value))?,
            None => DEFAULT_PORT,
        };

        let workers = match lookup("STOCK_TICKER_WORKERS") {
            Some(value) => {
                let workers: usize = value
                    .trim()
                    .parse()
                    .map_err(|_| invalid("STOCK_TICKER_WORKERS", &value))?;
                Some(workers.max(1))
            }
            None => None,
        };

        let alphavantage_base_url =
            lookup("ALPHAVANTAGE_BASE_URL").filter(|url| !url.trim().is_empty());

        Ok(Config {
            host,
            port,
            workers,
            api_key,
            alphavantage_base_url,
            cache,
        })
    }
}
