use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

/// Returns a map with all required env vars populated with valid defaults.
fn full_env<'a>() -> HashMap<&'a str, &'a str> {
    let mut m = HashMap::new();
    m.insert("API_BASE_URL", "https://hot.example.com");
    m
}

#[test]
fn parse_environment_development() {
    assert_eq!(
        parse_environment("development").unwrap(),
        Environment::Development
    );
}

#[test]
fn parse_environment_production() {
    assert_eq!(
        parse_environment("production").unwrap(),
        Environment::Production
    );
}

#[test]
fn parse_environment_unknown_fails() {
    let err = parse_environment("staging").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidEnvVar { ref var, .. } if var == "HOTSPOT_ENV"));
}

#[test]
fn build_app_config_fails_without_api_base_url() {
    let map: HashMap<&str, &str> = HashMap::new();
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "API_BASE_URL"),
        "expected MissingEnvVar(API_BASE_URL), got: {result:?}"
    );
}

#[test]
fn build_app_config_rejects_blank_api_base_url() {
    let mut map = HashMap::new();
    map.insert("API_BASE_URL", "   ");
    let result = build_app_config(lookup_from_map(&map));
    assert!(matches!(result, Err(ConfigError::MissingEnvVar(_))));
}

#[test]
fn build_app_config_rejects_non_http_base_url() {
    let mut map = HashMap::new();
    map.insert("API_BASE_URL", "ftp://hot.example.com");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "API_BASE_URL"),
        "expected InvalidEnvVar(API_BASE_URL), got: {result:?}"
    );
}

#[test]
fn build_app_config_succeeds_with_all_required_vars() {
    let map = full_env();
    let result = build_app_config(lookup_from_map(&map));
    assert!(result.is_ok(), "expected Ok, got: {result:?}");
    let cfg = result.unwrap();
    assert_eq!(cfg.env, Environment::Development);
    assert_eq!(cfg.api_base_url, "https://hot.example.com");
    assert!(cfg.api_key.is_none());
    assert_eq!(cfg.bind_addr.to_string(), "0.0.0.0:3000");
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.kv_host, "127.0.0.1");
    assert_eq!(cfg.kv_port, 6379);
    assert_eq!(cfg.kv_db, 0);
    assert!(cfg.kv_password.is_none());
    assert_eq!(cfg.kv_namespace, "hotspot");
    assert_eq!(cfg.config_update_interval_secs, 604_800);
    assert_eq!(cfg.request_timeout_secs, 15);
    assert_eq!(cfg.fetch_attempts, 3);
    assert_eq!(cfg.retry_delay_ms, 1000);
    assert_eq!(cfg.max_concurrent_platforms, 16);
    assert_eq!(cfg.collect_cron, "0 */30 * * * *");
    assert_eq!(cfg.sweep_cron, "0 15 * * * *");
}

#[test]
fn kv_port_override() {
    let mut map = full_env();
    map.insert("KV_PORT", "6380");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.kv_port, 6380);
}

#[test]
fn kv_port_invalid() {
    let mut map = full_env();
    map.insert("KV_PORT", "not-a-port");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "KV_PORT"),
        "expected InvalidEnvVar(KV_PORT), got: {result:?}"
    );
}

#[test]
fn config_update_interval_must_be_positive() {
    let mut map = full_env();
    map.insert("CONFIG_UPDATE_INTERVAL_SECONDS", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "CONFIG_UPDATE_INTERVAL_SECONDS"),
        "expected InvalidEnvVar(CONFIG_UPDATE_INTERVAL_SECONDS), got: {result:?}"
    );
}

#[test]
fn fetch_attempts_is_at_least_one() {
    let mut map = full_env();
    map.insert("HOTSPOT_FETCH_ATTEMPTS", "0");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.fetch_attempts, 1);
}

#[test]
fn namespace_with_whitespace_is_rejected() {
    let mut map = full_env();
    map.insert("KV_NAMESPACE", "hot spot");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "KV_NAMESPACE"),
        "expected InvalidEnvVar(KV_NAMESPACE), got: {result:?}"
    );
}

#[test]
fn redis_url_without_password() {
    let cfg = build_app_config(lookup_from_map(&full_env())).unwrap();
    assert_eq!(cfg.redis_url(), "redis://127.0.0.1:6379/0");
}

#[test]
fn redis_url_encodes_password() {
    let mut map = full_env();
    map.insert("KV_PASSWORD", "p@ss/word");
    map.insert("KV_DB", "2");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.redis_url(), "redis://:p%40ss%2Fword@127.0.0.1:6379/2");
}

#[test]
fn debug_output_redacts_secrets() {
    let mut map = full_env();
    map.insert("API_KEY", "secret-token");
    map.insert("KV_PASSWORD", "hunter2");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    let rendered = format!("{cfg:?}");
    assert!(!rendered.contains("secret-token"));
    assert!(!rendered.contains("hunter2"));
    assert!(rendered.contains("[redacted]"));
}
