use std::net::SocketAddr;

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// Root of the upstream hot-list API, e.g. `https://hot.example.com`.
    pub api_base_url: String,
    /// Passed through to the upstream as a bearer token when present.
    pub api_key: Option<String>,
    pub kv_host: String,
    pub kv_port: u16,
    pub kv_db: i64,
    pub kv_password: Option<String>,
    /// Prefix for every cache key (`{namespace}:topic:{hash}` and so on).
    pub kv_namespace: String,
    pub config_update_interval_secs: i64,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    /// Total attempts per upstream call, including the first.
    pub fetch_attempts: u32,
    pub retry_delay_ms: u64,
    pub max_concurrent_platforms: usize,
    pub collect_cron: String,
    pub sweep_cron: String,
}

impl AppConfig {
    /// Connection URL for the key-value store.
    ///
    /// The password is percent-encoded so characters such as `@` or `/`
    /// survive URL parsing.
    #[must_use]
    pub fn redis_url(&self) -> String {
        match &self.kv_password {
            Some(password) => format!(
                "redis://:{}@{}:{}/{}",
                utf8_percent_encode(password, NON_ALPHANUMERIC),
                self.kv_host,
                self.kv_port,
                self.kv_db
            ),
            None => format!("redis://{}:{}/{}", self.kv_host, self.kv_port, self.kv_db),
        }
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("api_base_url", &self.api_base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[redacted]"))
            .field("kv_host", &self.kv_host)
            .field("kv_port", &self.kv_port)
            .field("kv_db", &self.kv_db)
            .field(
                "kv_password",
                &self.kv_password.as_ref().map(|_| "[redacted]"),
            )
            .field("kv_namespace", &self.kv_namespace)
            .field(
                "config_update_interval_secs",
                &self.config_update_interval_secs,
            )
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("fetch_attempts", &self.fetch_attempts)
            .field("retry_delay_ms", &self.retry_delay_ms)
            .field("max_concurrent_platforms", &self.max_concurrent_platforms)
            .field("collect_cron", &self.collect_cron)
            .field("sweep_cron", &self.sweep_cron)
            .finish()
    }
}
