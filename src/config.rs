use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::executor::RetryPolicy;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub db: DbConfig,
    pub retry: RetryPolicy,
    pub listing_cache_ttl: Duration,
    pub notifier: NotifierConfig,
}

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub max_connections: u32,
    pub connect_timeout: Duration,
    pub idle_timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            connect_timeout: Duration::from_secs(15),
            idle_timeout: Duration::from_secs(30),
        }
    }
}

/// Without a URL, messages are only logged.
#[derive(Debug, Clone)]
pub struct NotifierConfig {
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub from: String,
    /// Upper bound on one send, so a hanging email API cannot stall a response.
    pub timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = parse_or("APP_PORT", 3000);

        let db = DbConfig {
            max_connections: parse_or("DB_MAX_CONNECTIONS", 10),
            connect_timeout: Duration::from_secs(parse_or("DB_CONNECT_TIMEOUT_SECS", 15)),
            idle_timeout: Duration::from_secs(parse_or("DB_IDLE_TIMEOUT_SECS", 30)),
        };

        let retry = RetryPolicy {
            max_retries: parse_or("QUERY_MAX_RETRIES", 2),
            base_delay: Duration::from_millis(parse_or("QUERY_RETRY_BASE_MS", 100)),
            max_delay: Duration::from_millis(parse_or("QUERY_RETRY_MAX_MS", 500)),
        };

        let notifier = NotifierConfig {
            url: non_empty("NOTIFIER_URL"),
            api_key: non_empty("NOTIFIER_API_KEY"),
            from: non_empty("NOTIFIER_FROM")
                .unwrap_or_else(|| "noreply@farmshare.local".to_string()),
            timeout: Duration::from_secs(parse_or("NOTIFIER_TIMEOUT_SECS", 10)),
        };

        Ok(Self {
            database_url,
            host,
            port,
            db,
            retry,
            listing_cache_ttl: Duration::from_secs(parse_or("LISTING_CACHE_TTL_SECS", 60)),
            notifier,
        })
    }
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
