//! Key-value backends.

mod memory;
mod redis_backend;

pub use self::memory::MemoryBackend;
pub use self::redis_backend::RedisBackend;

use async_trait::async_trait;

use crate::error::StoreResult;

/// One write in a batch handed to [`KvBackend::write_batch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KvWrite {
    Set {
        key: String,
        value: String,
        /// `None` stores the value without expiry.
        ttl_secs: Option<u64>,
        /// Skip the write when the key already holds a value.
        only_if_absent: bool,
    },
    Delete {
        key: String,
    },
}

impl KvWrite {
    #[must_use]
    pub fn set_ex(key: impl Into<String>, value: impl Into<String>, ttl_secs: u64) -> Self {
        Self::Set {
            key: key.into(),
            value: value.into(),
            ttl_secs: Some(ttl_secs),
            only_if_absent: false,
        }
    }

    #[must_use]
    pub fn set_nx_ex(key: impl Into<String>, value: impl Into<String>, ttl_secs: u64) -> Self {
        Self::Set {
            key: key.into(),
            value: value.into(),
            ttl_secs: Some(ttl_secs),
            only_if_absent: true,
        }
    }

    #[must_use]
    pub fn set_persistent(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Set {
            key: key.into(),
            value: value.into(),
            ttl_secs: None,
            only_if_absent: false,
        }
    }

    #[must_use]
    pub fn delete(key: impl Into<String>) -> Self {
        Self::Delete { key: key.into() }
    }

    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::Set { key, .. } | Self::Delete { key } => key,
        }
    }
}

/// Minimal TTL-capable key-value surface the topic store needs.
///
/// Implementations must apply a [`write_batch`](KvBackend::write_batch)
/// all-or-nothing and in one round trip where the store supports it.
#[async_trait]
pub trait KvBackend: Send + Sync {
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Fetches several keys at once; the result is positionally aligned with `keys`.
    async fn get_many(&self, keys: &[String]) -> StoreResult<Vec<Option<String>>>;

    async fn write_batch(&self, writes: Vec<KvWrite>) -> StoreResult<()>;

    /// Lists live keys matching a glob pattern (`*` wildcards only).
    async fn scan_keys(&self, pattern: &str) -> StoreResult<Vec<String>>;

    /// Deletes the given keys, returning how many existed.
    async fn delete(&self, keys: &[String]) -> StoreResult<usize>;

    async fn ping(&self) -> StoreResult<()>;
}
