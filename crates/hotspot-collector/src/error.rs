use hotspot_store::StoreError;
use thiserror::Error;

/// Failure talking to the upstream hot-list API.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Transport failure or non-2xx status.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The envelope's `code` field was missing or not 200.
    #[error("upstream returned code {code:?} for {context}")]
    ApiStatus { context: String, code: Option<i64> },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("response for {context} has no `{field}` array")]
    MissingField { context: String, field: &'static str },

    #[error("invalid base URL '{0}'")]
    InvalidBaseUrl(String),

    #[error("API key contains characters not allowed in a header")]
    InvalidApiKey,

    #[error("request for {context} timed out after {secs}s")]
    Timeout { context: String, secs: u64 },
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("platform discovery failed: {0}")]
    Upstream(#[from] UpstreamError),

    #[error("platform discovery returned no usable routes ({rejected} rejected)")]
    NoValidRoutes { rejected: usize },

    #[error("platform config store error: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum CollectorError {
    #[error("no platforms are registered")]
    NoPlatforms,

    /// Every registered platform failed; carries their names.
    #[error("all {} platforms failed to fetch", failed.len())]
    NoPlatformSucceeded { failed: Vec<String> },

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("storing collected topics failed: {0}")]
    Store(#[from] StoreError),
}
