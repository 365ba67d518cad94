use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Parsing and validation are decoupled from the process environment so the
/// tests can drive them with a plain `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> { lookup(var).ok().filter(|v| !v.is_empty()) };

    let parse = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u16 = |var: &str, default: &str| -> Result<u16, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u16>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_i64 = |var: &str, default: &str| -> Result<i64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<i64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let api_base_url = require("API_BASE_URL")?;
    if !api_base_url.starts_with("http://") && !api_base_url.starts_with("https://") {
        return Err(ConfigError::InvalidEnvVar {
            var: "API_BASE_URL".to_string(),
            reason: format!("expected an http(s) URL, got '{api_base_url}'"),
        });
    }
    let api_key = optional("API_KEY");

    let env = parse_environment(&or_default("HOTSPOT_ENV", "development"))?;
    let bind_addr = parse("HOTSPOT_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("HOTSPOT_LOG_LEVEL", "info");

    let kv_host = or_default("KV_HOST", "127.0.0.1");
    let kv_port = parse_u16("KV_PORT", "6379")?;
    let kv_db = parse_i64("KV_DB", "0")?;
    let kv_password = optional("KV_PASSWORD");
    let kv_namespace = or_default("KV_NAMESPACE", "hotspot");
    if kv_namespace.is_empty() || kv_namespace.contains(char::is_whitespace) {
        return Err(ConfigError::InvalidEnvVar {
            var: "KV_NAMESPACE".to_string(),
            reason: "namespace must be non-empty and contain no whitespace".to_string(),
        });
    }

    let config_update_interval_secs = parse_i64("CONFIG_UPDATE_INTERVAL_SECONDS", "604800")?;
    if config_update_interval_secs <= 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "CONFIG_UPDATE_INTERVAL_SECONDS".to_string(),
            reason: "interval must be positive".to_string(),
        });
    }

    let request_timeout_secs = parse_u64("HOTSPOT_REQUEST_TIMEOUT_SECS", "15")?;
    let user_agent = or_default("HOTSPOT_USER_AGENT", "hotspot/0.1 (trend-aggregator)");
    let fetch_attempts = parse_u32("HOTSPOT_FETCH_ATTEMPTS", "3")?.max(1);
    let retry_delay_ms = parse_u64("HOTSPOT_RETRY_DELAY_MS", "1000")?;
    let max_concurrent_platforms = parse_usize("HOTSPOT_MAX_CONCURRENT_PLATFORMS", "16")?.max(1);
    let collect_cron = or_default("HOTSPOT_COLLECT_CRON", "0 */30 * * * *");
    let sweep_cron = or_default("HOTSPOT_SWEEP_CRON", "0 15 * * * *");

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        api_base_url,
        api_key,
        kv_host,
        kv_port,
        kv_db,
        kv_password,
        kv_namespace,
        config_update_interval_secs,
        request_timeout_secs,
        user_agent,
        fetch_attempts,
        retry_delay_ms,
        max_concurrent_platforms,
        collect_cron,
        sweep_cron,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "HOTSPOT_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
