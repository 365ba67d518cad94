//! HTTP client for the upstream hot-list API.
//!
//! The upstream exposes a discovery endpoint (`GET {base}/all`) and one
//! endpoint per platform (`GET {base}{path}`). Both wrap their payload in a
//! JSON envelope whose `code` must be 200.

use std::time::Duration;

use hotspot_core::{AppConfig, PlatformRoute, RawTopic};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, Url};
use serde_json::Value;

use crate::error::UpstreamError;
use crate::parse;

const DEFAULT_USER_AGENT: &str = "hotspot/0.1 (trending-aggregator)";

/// Client for the upstream hot-list API.
///
/// Use [`HotApiClient::from_config`] in the service and
/// [`HotApiClient::with_base_url`] to point at a mock server in tests.
#[derive(Debug, Clone)]
pub struct HotApiClient {
    client: Client,
    base_url: String,
}

impl HotApiClient {
    /// # Errors
    ///
    /// Returns [`UpstreamError::InvalidBaseUrl`] if `api_base_url` does not
    /// parse, or [`UpstreamError::Http`] if the `reqwest::Client` cannot be
    /// built.
    pub fn from_config(config: &AppConfig) -> Result<Self, UpstreamError> {
        Self::build(
            &config.api_base_url,
            config.api_key.as_deref(),
            config.request_timeout_secs,
            &config.user_agent,
        )
    }

    /// Creates a client with a custom base URL and no API key.
    ///
    /// # Errors
    ///
    /// Same as [`HotApiClient::from_config`].
    pub fn with_base_url(base_url: &str, timeout_secs: u64) -> Result<Self, UpstreamError> {
        Self::build(base_url, None, timeout_secs, DEFAULT_USER_AGENT)
    }

    /// Like [`HotApiClient::with_base_url`] but sends `Authorization: Bearer {api_key}`.
    ///
    /// # Errors
    ///
    /// Same as [`HotApiClient::from_config`].
    pub fn with_api_key(
        base_url: &str,
        api_key: &str,
        timeout_secs: u64,
    ) -> Result<Self, UpstreamError> {
        Self::build(base_url, Some(api_key), timeout_secs, DEFAULT_USER_AGENT)
    }

    fn build(
        base_url: &str,
        api_key: Option<&str>,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, UpstreamError> {
        let trimmed = base_url.trim().trim_end_matches('/');
        Url::parse(trimmed).map_err(|_| UpstreamError::InvalidBaseUrl(base_url.to_string()))?;

        let mut headers = HeaderMap::new();
        if let Some(key) = api_key.map(str::trim).filter(|k| !k.is_empty()) {
            let mut value = HeaderValue::from_str(&format!("Bearer {key}"))
                .map_err(|_| UpstreamError::InvalidApiKey)?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs.max(1)))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: trimmed.to_string(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetches the discovery listing of platform routes.
    ///
    /// Entries are returned as-is; validation happens in
    /// [`PlatformConfig::from_routes`](hotspot_core::PlatformConfig::from_routes).
    ///
    /// # Errors
    ///
    /// - [`UpstreamError::Http`] on network failure or non-2xx status.
    /// - [`UpstreamError::Deserialize`] on malformed JSON.
    /// - [`UpstreamError::ApiStatus`] if `code` is not 200.
    /// - [`UpstreamError::MissingField`] if `routes` is absent.
    pub async fn fetch_routes(&self) -> Result<Vec<PlatformRoute>, UpstreamError> {
        let context = format!("{}/all", self.base_url);
        let mut body = self.request_json(&context).await?;
        Self::check_code(&body, &context)?;

        let routes = take_array(&mut body, "routes", &context)?;
        // Entries that are not objects decode as empty routes and get rejected later.
        Ok(routes
            .into_iter()
            .map(|route| {
                serde_json::from_value(route).unwrap_or(PlatformRoute {
                    name: None,
                    path: None,
                })
            })
            .collect())
    }

    /// Fetches one platform's hot list from `{base}{path}`.
    ///
    /// Items without a usable title are dropped.
    ///
    /// # Errors
    ///
    /// Same as [`HotApiClient::fetch_routes`], with `data` as the required array.
    pub async fn fetch_platform(&self, path: &str) -> Result<Vec<RawTopic>, UpstreamError> {
        let context = if path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        };
        let mut body = self.request_json(&context).await?;
        Self::check_code(&body, &context)?;

        let items = take_array(&mut body, "data", &context)?;
        Ok(items.iter().filter_map(parse::raw_topic).collect())
    }

    async fn request_json(&self, url: &str) -> Result<Value, UpstreamError> {
        let response = self.client.get(url).send().await?;
        let response = response.error_for_status()?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| UpstreamError::Deserialize {
            context: url.to_string(),
            source: e,
        })
    }

    /// The envelope's `code` must be the number (or numeric string) 200.
    fn check_code(body: &Value, context: &str) -> Result<(), UpstreamError> {
        let code = body.get("code").and_then(|c| match c {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        });
        if code == Some(200) {
            Ok(())
        } else {
            Err(UpstreamError::ApiStatus {
                context: context.to_string(),
                code,
            })
        }
    }
}

fn take_array(body: &mut Value, field: &'static str, context: &str) -> Result<Vec<Value>, UpstreamError> {
    match body.get_mut(field).map(Value::take) {
        Some(Value::Array(items)) => Ok(items),
        _ => Err(UpstreamError::MissingField {
            context: context.to_string(),
            field,
        }),
    }
}
