//! TTL-indexed topic cache.
//!
//! Topic records, per-platform indices and rollup statistics live in a
//! key-value store behind [`KvBackend`]. Production uses Redis
//! ([`RedisBackend`]); tests and single-process runs can use the in-process
//! [`MemoryBackend`]. [`TopicStore`] owns deduplication and expiry on top of
//! either backend.

pub mod backend;
pub mod error;
pub mod keys;
pub mod records;
pub mod topics;

pub use backend::{KvBackend, KvWrite, MemoryBackend, RedisBackend};
pub use error::{StoreError, StoreResult};
pub use keys::CacheKeys;
pub use records::{PlatformIndex, PlatformStat, PlatformStats};
pub use topics::{ClearReport, StoreReport, TopicStore};
