//! Topic persistence: dedup, per-platform indices, stats and expiry sweeps.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use hotspot_core::{Clock, PlatformConfig, Topic};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::backend::{KvBackend, KvWrite};
use crate::error::{StoreError, StoreResult};
use crate::keys::{ttl, CacheKeys};
use crate::records::{PlatformIndex, PlatformStat, PlatformStats};

/// Keys fetched per MGET during an expiry sweep.
const SWEEP_CHUNK: usize = 500;

/// Outcome of one [`TopicStore::store_cycle`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreReport {
    /// New topic records written.
    pub written: usize,
    /// Topics whose dedup hash already had a live record, in the store or
    /// earlier in the same batch.
    pub duplicates: usize,
    /// Topics dropped because they were already past `expireTime`.
    pub skipped_expired: usize,
    /// Platforms whose index was rebuilt, in batch order.
    pub platforms: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClearReport {
    pub scanned: usize,
    pub deleted: usize,
}

/// Cache-backed topic store.
///
/// Holds no state of its own beyond the backend handle, so it is shared
/// between the collection job and request handlers through an `Arc`.
pub struct TopicStore {
    backend: Arc<dyn KvBackend>,
    keys: CacheKeys,
    clock: Arc<dyn Clock>,
}

impl TopicStore {
    #[must_use]
    pub fn new(backend: Arc<dyn KvBackend>, keys: CacheKeys, clock: Arc<dyn Clock>) -> Self {
        Self {
            backend,
            keys,
            clock,
        }
    }

    #[must_use]
    pub fn keys(&self) -> &CacheKeys {
        &self.keys
    }

    #[must_use]
    pub fn now(&self) -> i64 {
        self.clock.now()
    }

    /// Stores topics without touching the recorded cycle failures.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend read or the write batch fails.
    pub async fn store_topics(&self, topics: &[Topic]) -> StoreResult<StoreReport> {
        self.write_cycle(topics, None).await
    }

    /// Stores one collection cycle's topics and records which platforms
    /// failed to fetch in the same batch.
    ///
    /// Every write of the cycle (topic records, rebuilt indices, stats) is
    /// committed in a single atomic batch. A topic whose dedup hash already
    /// resolves to a live record is not rewritten; the existing record keeps
    /// its platform. Each platform's index is rebuilt from the hashes it owns
    /// after the cycle; a platform that owns nothing has its index removed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend read or the write batch fails.
    pub async fn store_cycle(&self, topics: &[Topic], failed: &[String]) -> StoreResult<StoreReport> {
        self.write_cycle(topics, Some(failed)).await
    }

    async fn write_cycle(
        &self,
        topics: &[Topic],
        failed: Option<&[String]>,
    ) -> StoreResult<StoreReport> {
        let now = self.clock.now();
        let mut report = StoreReport::default();

        // First occurrence of each hash wins within the batch. Every platform
        // that returned a live topic gets its index rebuilt, even when all of
        // its topics were claimed earlier in the same batch.
        let mut candidates: Vec<(String, &Topic)> = Vec::with_capacity(topics.len());
        let mut platform_order: Vec<&str> = Vec::new();
        let mut seen = HashSet::new();
        for topic in topics {
            if topic.is_expired(now) {
                report.skipped_expired += 1;
                continue;
            }
            if !platform_order.contains(&topic.platform.as_str()) {
                platform_order.push(topic.platform.as_str());
            }
            let hash = topic.dedup_hash();
            if seen.insert(hash.clone()) {
                candidates.push((hash, topic));
            } else {
                report.duplicates += 1;
            }
        }

        let mut read_keys: Vec<String> = candidates
            .iter()
            .map(|(hash, _)| self.keys.topic(hash))
            .collect();
        read_keys.push(self.keys.stats());
        let mut existing = self.backend.get_many(&read_keys).await?;
        let previous_stats = existing
            .pop()
            .flatten()
            .and_then(|raw| decode::<PlatformStats>(&self.keys.stats(), &raw).ok());

        let mut writes = Vec::new();
        let mut owned: HashMap<&str, Vec<String>> = HashMap::new();

        for ((hash, topic), current) in candidates.iter().zip(existing) {
            let live_owner = current
                .and_then(|raw| decode::<Topic>(&self.keys.topic(hash), &raw).ok())
                .filter(|record| !record.is_expired(now))
                .map(|record| record.platform);

            let owner = match live_owner {
                Some(owner) => {
                    report.duplicates += 1;
                    owner
                }
                None => {
                    let key = self.keys.topic(hash);
                    let value = encode(&key, *topic)?;
                    let ttl_secs = u64::try_from(topic.remaining_ttl(now)).unwrap_or(ttl::TOPIC);
                    writes.push(KvWrite::set_nx_ex(key, value, ttl_secs));
                    report.written += 1;
                    topic.platform.clone()
                }
            };

            if owner == topic.platform {
                owned
                    .entry(topic.platform.as_str())
                    .or_default()
                    .push(hash.clone());
            }
        }

        let mut stats = previous_stats.unwrap_or_default();
        for platform in platform_order {
            let index_key = self.keys.platform_index(platform);
            match owned.remove(platform) {
                Some(hashes) if !hashes.is_empty() => {
                    stats.platforms.insert(
                        platform.to_string(),
                        PlatformStat {
                            count: hashes.len(),
                            update_time: now,
                        },
                    );
                    let index = PlatformIndex {
                        platform: platform.to_string(),
                        topic_hashes: hashes,
                        update_time: now,
                    };
                    let value = encode(&index_key, &index)?;
                    writes.push(KvWrite::set_ex(index_key, value, ttl::PLATFORM_INDEX));
                    report.platforms.push(platform.to_string());
                }
                _ => {
                    stats.platforms.remove(platform);
                    writes.push(KvWrite::delete(index_key));
                }
            }
        }

        prune_stale_stats(&mut stats, now);
        if let Some(failed) = failed {
            stats.failed_platforms = sorted_unique(failed);
        }
        stats.update_time = now;
        let stats_key = self.keys.stats();
        let value = encode(&stats_key, &stats)?;
        writes.push(KvWrite::set_ex(stats_key, value, ttl::STATS));

        self.backend.write_batch(writes).await?;

        info!(
            written = report.written,
            duplicates = report.duplicates,
            skipped_expired = report.skipped_expired,
            platforms = report.platforms.len(),
            "stored topic batch"
        );
        Ok(report)
    }

    /// Replaces the failure list in the stats rollup without storing topics.
    ///
    /// Used when a cycle produced nothing to store.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend read or write fails.
    pub async fn record_cycle_failures(&self, failed: &[String]) -> StoreResult<()> {
        let now = self.clock.now();
        let mut stats = self.stats().await?.unwrap_or_default();
        prune_stale_stats(&mut stats, now);
        stats.failed_platforms = sorted_unique(failed);
        stats.update_time = now;

        let key = self.keys.stats();
        let value = encode(&key, &stats)?;
        self.backend
            .write_batch(vec![KvWrite::set_ex(key, value, ttl::STATS)])
            .await
    }

    /// Live topics indexed under `platform`, in index order.
    ///
    /// Records that expired, no longer decode, or belong to another platform
    /// are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on backend failure or an undecodable index.
    pub async fn platform_topics(&self, platform: &str) -> StoreResult<Vec<Topic>> {
        let index_key = self.keys.platform_index(platform);
        let Some(raw) = self.backend.get(&index_key).await? else {
            return Ok(Vec::new());
        };
        let index: PlatformIndex = decode(&index_key, &raw)?;

        let mut seen = HashSet::new();
        let topic_keys: Vec<String> = index
            .topic_hashes
            .iter()
            .filter(|hash| seen.insert(hash.as_str()))
            .map(|hash| self.keys.topic(hash))
            .collect();

        let now = self.clock.now();
        let values = self.backend.get_many(&topic_keys).await?;
        let topics = topic_keys
            .iter()
            .zip(values)
            .filter_map(|(key, value)| {
                let raw = value?;
                match decode::<Topic>(key, &raw) {
                    Ok(topic) => Some(topic),
                    Err(e) => {
                        warn!(key = %key, error = %e, "skipping undecodable topic record");
                        None
                    }
                }
            })
            .filter(|topic| topic.platform == platform && !topic.is_expired(now))
            .collect();
        Ok(topics)
    }

    /// Live topics across `platforms`, deduplicated by title hash.
    ///
    /// A platform whose index cannot be read is logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] only when every platform read failed.
    pub async fn topics_for_platforms(&self, platforms: &[String]) -> StoreResult<Vec<Topic>> {
        let mut topics = Vec::new();
        let mut seen = HashSet::new();
        let mut last_error = None;
        let mut any_ok = platforms.is_empty();

        for platform in platforms {
            match self.platform_topics(platform).await {
                Ok(found) => {
                    any_ok = true;
                    for topic in found {
                        if seen.insert(topic.dedup_hash()) {
                            topics.push(topic);
                        }
                    }
                }
                Err(e) => {
                    warn!(platform = %platform, error = %e, "failed to read platform topics");
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if !any_ok => Err(e),
            _ => Ok(topics),
        }
    }

    /// Platforms that currently have a live index, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the key scan fails.
    pub async fn all_platforms(&self) -> StoreResult<Vec<String>> {
        let keys = self
            .backend
            .scan_keys(&self.keys.platform_index_pattern())
            .await?;
        let mut platforms: Vec<String> = keys
            .iter()
            .filter_map(|key| self.keys.platform_from_index_key(key))
            .map(str::to_string)
            .collect();
        platforms.sort();
        platforms.dedup();
        Ok(platforms)
    }

    /// Deletes topic records that are past `expireTime` or fail to decode.
    ///
    /// Safe to run alongside reads and repeatedly; a second run over the
    /// same data deletes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if scanning, reading or deleting fails.
    pub async fn clear_expired(&self) -> StoreResult<ClearReport> {
        let now = self.clock.now();
        let keys = self.backend.scan_keys(&self.keys.topic_pattern()).await?;
        let mut report = ClearReport {
            scanned: keys.len(),
            deleted: 0,
        };

        for chunk in keys.chunks(SWEEP_CHUNK) {
            let values = self.backend.get_many(chunk).await?;
            let stale: Vec<String> = chunk
                .iter()
                .zip(values)
                .filter_map(|(key, value)| {
                    let raw = value?;
                    let expired = match decode::<Topic>(key, &raw) {
                        Ok(topic) => topic.is_expired(now),
                        Err(e) => {
                            warn!(key = %key, error = %e, "removing undecodable topic record");
                            true
                        }
                    };
                    expired.then(|| key.clone())
                })
                .collect();

            if !stale.is_empty() {
                report.deleted += self.backend.delete(&stale).await?;
            }
        }

        debug!(
            scanned = report.scanned,
            deleted = report.deleted,
            "expired topic sweep finished"
        );
        Ok(report)
    }

    /// Cached platform mapping from the primary key, else the backup.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend read fails.
    pub async fn load_platform_config(&self) -> StoreResult<Option<PlatformConfig>> {
        let primary = self.keys.platform_config();
        let backup = self.keys.platform_config_backup();
        let values = self
            .backend
            .get_many(&[primary.clone(), backup.clone()])
            .await?;

        for (key, value) in [primary, backup].iter().zip(values) {
            let Some(raw) = value else { continue };
            match decode::<PlatformConfig>(key, &raw) {
                Ok(config) => return Ok(Some(config)),
                Err(e) => warn!(key = %key, error = %e, "ignoring undecodable platform config"),
            }
        }
        Ok(None)
    }

    /// Writes the mapping to the primary and backup keys in one batch.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if encoding or the write batch fails.
    pub async fn save_platform_config(&self, config: &PlatformConfig) -> StoreResult<()> {
        let primary = self.keys.platform_config();
        let value = encode(&primary, config)?;
        self.backend
            .write_batch(vec![
                KvWrite::set_persistent(primary, value.clone()),
                KvWrite::set_persistent(self.keys.platform_config_backup(), value),
            ])
            .await
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] on backend failure or an undecodable rollup.
    pub async fn stats(&self) -> StoreResult<Option<PlatformStats>> {
        let key = self.keys.stats();
        self.backend
            .get(&key)
            .await?
            .map(|raw| decode(&key, &raw))
            .transpose()
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend is unreachable.
    pub async fn ping(&self) -> StoreResult<()> {
        self.backend.ping().await
    }
}

/// Drops entries for platforms whose index has outlived its TTL, then
/// recomputes the total.
fn prune_stale_stats(stats: &mut PlatformStats, now: i64) {
    let max_age = i64::try_from(ttl::PLATFORM_INDEX).unwrap_or(i64::MAX);
    stats
        .platforms
        .retain(|_, stat| now - stat.update_time < max_age);
    stats.total_topics = stats.platforms.values().map(|s| s.count).sum();
}

fn sorted_unique(names: &[String]) -> Vec<String> {
    names
        .iter()
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn encode<T: Serialize + ?Sized>(key: &str, value: &T) -> StoreResult<String> {
    serde_json::to_string(value).map_err(|source| StoreError::Serialization {
        key: key.to_string(),
        source,
    })
}

fn decode<T: DeserializeOwned>(key: &str, raw: &str) -> StoreResult<T> {
    serde_json::from_str(raw).map_err(|source| StoreError::Serialization {
        key: key.to_string(),
        source,
    })
}
