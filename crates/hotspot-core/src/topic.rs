use serde::{Deserialize, Serialize};

/// Lifetime of a cached topic record: seven days from its fetch time.
pub const TOPIC_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// One item from an upstream platform's hot list, before it is stamped with
/// fetch metadata.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawTopic {
    pub title: String,
    pub url: Option<String>,
    pub mobile_url: Option<String>,
    pub cover: Option<String>,
    pub description: Option<String>,
    /// Raw popularity as reported by the source; `None` when absent or not numeric.
    pub hot: Option<i64>,
    /// Source-side publication time in epoch seconds.
    pub timestamp: Option<i64>,
}

/// A cached trending topic.
///
/// Records are immutable once written. `normalizedHot` and `priorityScore`
/// are derived on the read path and never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    pub title: String,
    pub platform: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub hot: Option<i64>,
    pub source_timestamp: i64,
    pub fetch_time: i64,
    pub expire_time: i64,
}

impl Topic {
    /// Stamps a raw upstream item with fetch metadata.
    ///
    /// `sourceTimestamp` falls back to the fetch time when the upstream did
    /// not report one; `expireTime` is always `fetch_time + TOPIC_TTL_SECS`.
    #[must_use]
    pub fn from_raw(platform: &str, raw: RawTopic, fetch_time: i64) -> Self {
        Self {
            title: raw.title.trim().to_string(),
            platform: platform.to_string(),
            url: raw.url,
            mobile_url: raw.mobile_url,
            cover: raw.cover,
            description: raw.description,
            hot: raw.hot,
            source_timestamp: raw.timestamp.unwrap_or(fetch_time),
            fetch_time,
            expire_time: fetch_time + TOPIC_TTL_SECS,
        }
    }

    /// MD5 hex of the title's dedup form.
    #[must_use]
    pub fn dedup_hash(&self) -> String {
        title_hash(&self.title)
    }

    #[must_use]
    pub fn is_expired(&self, now: i64) -> bool {
        self.expire_time <= now
    }

    /// Remaining lifetime in seconds, zero once expired.
    #[must_use]
    pub fn remaining_ttl(&self, now: i64) -> i64 {
        (self.expire_time - now).max(0)
    }
}

/// Canonical form of a title used for deduplication: trimmed, inner
/// whitespace collapsed to single spaces, lowercased.
#[must_use]
pub fn dedup_form(title: &str) -> String {
    title
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Content hash identifying a topic across platforms and fetches.
#[must_use]
pub fn title_hash(title: &str) -> String {
    format!("{:x}", md5::compute(dedup_form(title).as_bytes()))
}
