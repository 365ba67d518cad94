//! In-process backend with TTL semantics driven by a [`Clock`].
//!
//! Used by tests and by local runs without a Redis instance.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use hotspot_core::Clock;

use super::{KvBackend, KvWrite};
use crate::error::{StoreError, StoreResult};

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<i64>,
}

impl Entry {
    fn is_live(&self, now: i64) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }
}

pub struct MemoryBackend {
    entries: Mutex<HashMap<String, Entry>>,
    clock: Arc<dyn Clock>,
    unavailable: AtomicBool,
}

impl MemoryBackend {
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
            unavailable: AtomicBool::new(false),
        }
    }

    /// Makes every subsequent operation fail with [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Remaining lifetime of `key` in seconds. `None` when the key is absent
    /// or expired, `Some(None)` when it has no expiry.
    #[must_use]
    pub fn ttl(&self, key: &str) -> Option<Option<i64>> {
        let now = self.clock.now();
        let entries = self.lock().ok()?;
        entries
            .get(key)
            .filter(|e| e.is_live(now))
            .map(|e| e.expires_at.map(|at| at - now))
    }

    /// Number of live keys.
    #[must_use]
    pub fn len(&self) -> usize {
        let now = self.clock.now();
        self.lock()
            .map(|entries| entries.values().filter(|e| e.is_live(now)).count())
            .unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Writes a raw value without going through a batch. Test helper for
    /// seeding corrupt or hand-built records.
    pub fn insert_raw(&self, key: &str, value: &str, ttl_secs: Option<u64>) {
        let now = self.clock.now();
        if let Ok(mut entries) = self.lock() {
            entries.insert(
                key.to_string(),
                Entry {
                    value: value.to_string(),
                    expires_at: ttl_secs.map(|ttl| now + ttl_as_i64(ttl)),
                },
            );
        }
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "memory backend marked unavailable".to_string(),
            ));
        }
        Ok(())
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, HashMap<String, Entry>>> {
        self.entries
            .lock()
            .map_err(|_| StoreError::Unavailable("memory backend lock poisoned".to_string()))
    }

    fn live_value(entries: &HashMap<String, Entry>, key: &str, now: i64) -> Option<String> {
        entries
            .get(key)
            .filter(|e| e.is_live(now))
            .map(|e| e.value.clone())
    }
}

fn ttl_as_i64(ttl: u64) -> i64 {
    i64::try_from(ttl).unwrap_or(i64::MAX)
}

/// Glob match supporting `*` only, which is all the key schema uses.
fn glob_match(pattern: &str, candidate: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();
    if parts.len() == 1 {
        return pattern == candidate;
    }

    let (first, rest) = parts.split_first().unwrap_or((&"", &[]));
    let Some(mut remaining) = candidate.strip_prefix(first) else {
        return false;
    };
    let (last, middle) = rest.split_last().unwrap_or((&"", &[]));

    for part in middle {
        match remaining.find(part) {
            Some(idx) => remaining = &remaining[idx + part.len()..],
            None => return false,
        }
    }
    remaining.len() >= last.len() && remaining.ends_with(last)
}

#[async_trait]
impl KvBackend for MemoryBackend {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.check_available()?;
        let now = self.clock.now();
        let entries = self.lock()?;
        Ok(Self::live_value(&entries, key, now))
    }

    async fn get_many(&self, keys: &[String]) -> StoreResult<Vec<Option<String>>> {
        self.check_available()?;
        let now = self.clock.now();
        let entries = self.lock()?;
        Ok(keys
            .iter()
            .map(|key| Self::live_value(&entries, key, now))
            .collect())
    }

    async fn write_batch(&self, writes: Vec<KvWrite>) -> StoreResult<()> {
        self.check_available()?;
        let now = self.clock.now();
        let mut entries = self.lock()?;
        for write in writes {
            match write {
                KvWrite::Set {
                    key,
                    value,
                    ttl_secs,
                    only_if_absent,
                } => {
                    if only_if_absent && Self::live_value(&entries, &key, now).is_some() {
                        continue;
                    }
                    entries.insert(
                        key,
                        Entry {
                            value,
                            expires_at: ttl_secs.map(|ttl| now + ttl_as_i64(ttl)),
                        },
                    );
                }
                KvWrite::Delete { key } => {
                    entries.remove(&key);
                }
            }
        }
        Ok(())
    }

    async fn scan_keys(&self, pattern: &str) -> StoreResult<Vec<String>> {
        self.check_available()?;
        let now = self.clock.now();
        let entries = self.lock()?;
        let mut keys: Vec<String> = entries
            .iter()
            .filter(|(key, entry)| entry.is_live(now) && glob_match(pattern, key))
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn delete(&self, keys: &[String]) -> StoreResult<usize> {
        self.check_available()?;
        let now = self.clock.now();
        let mut entries = self.lock()?;
        let mut deleted = 0;
        for key in keys {
            if let Some(entry) = entries.remove(key) {
                if entry.is_live(now) {
                    deleted += 1;
                }
            }
        }
        Ok(deleted)
    }

    async fn ping(&self) -> StoreResult<()> {
        self.check_available()
    }
}
