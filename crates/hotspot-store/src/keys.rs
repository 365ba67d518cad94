//! Cache key schema.
//!
//! Key format (`ns` is the configured namespace):
//!
//! | Key | Holds | TTL |
//! |-----|-------|-----|
//! | `ns:topic:{md5(title)}` | one [`Topic`](hotspot_core::Topic) | 7 d |
//! | `ns:platform:{platform}:topics` | [`PlatformIndex`](crate::PlatformIndex) | 3 h |
//! | `ns:platform:config` | [`PlatformConfig`](hotspot_core::PlatformConfig) | none |
//! | `ns:platform:config_backup` | copy of the above | none |
//! | `ns:stats:platforms` | [`PlatformStats`](crate::PlatformStats) | 24 h |
//!
//! Other components share these keys, so the layout must not change.

/// TTLs in seconds.
pub mod ttl {
    pub const TOPIC: u64 = 7 * 24 * 60 * 60;
    pub const PLATFORM_INDEX: u64 = 3 * 60 * 60;
    pub const STATS: u64 = 24 * 60 * 60;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKeys {
    namespace: String,
}

impl CacheKeys {
    #[must_use]
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    #[must_use]
    pub fn topic(&self, hash: &str) -> String {
        format!("{}:topic:{hash}", self.namespace)
    }

    #[must_use]
    pub fn topic_pattern(&self) -> String {
        format!("{}:topic:*", self.namespace)
    }

    #[must_use]
    pub fn platform_index(&self, platform: &str) -> String {
        format!("{}:platform:{platform}:topics", self.namespace)
    }

    #[must_use]
    pub fn platform_index_pattern(&self) -> String {
        format!("{}:platform:*:topics", self.namespace)
    }

    /// Extracts the platform name from a platform-index key.
    #[must_use]
    pub fn platform_from_index_key<'a>(&self, key: &'a str) -> Option<&'a str> {
        key.strip_prefix(self.namespace.as_str())?
            .strip_prefix(":platform:")?
            .strip_suffix(":topics")
            .filter(|name| !name.is_empty())
    }

    #[must_use]
    pub fn platform_config(&self) -> String {
        format!("{}:platform:config", self.namespace)
    }

    #[must_use]
    pub fn platform_config_backup(&self) -> String {
        format!("{}:platform:config_backup", self.namespace)
    }

    #[must_use]
    pub fn stats(&self) -> String {
        format!("{}:stats:platforms", self.namespace)
    }
}
