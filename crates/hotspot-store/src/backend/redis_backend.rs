//! Redis backend over a multiplexed [`ConnectionManager`].

use std::collections::BTreeSet;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, Pipeline};
use tracing::debug;

use super::{KvBackend, KvWrite};
use crate::error::StoreResult;

const SCAN_COUNT: usize = 200;

/// Redis-backed [`KvBackend`].
///
/// `ConnectionManager` reconnects on its own and is cheap to clone, so every
/// operation works on its own clone instead of serializing behind a lock.
#[derive(Clone)]
pub struct RedisBackend {
    conn: ConnectionManager,
}

impl RedisBackend {
    /// Connects to the Redis instance at `redis_url`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Redis`](crate::StoreError::Redis) if the URL is
    /// invalid or the initial connection fails.
    pub async fn connect(redis_url: &str) -> StoreResult<Self> {
        let client = Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }

    #[must_use]
    pub fn from_manager(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl KvBackend for RedisBackend {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn get_many(&self, keys: &[String]) -> StoreResult<Vec<Option<String>>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.conn.clone();
        let values: Vec<Option<String>> = redis::cmd("MGET")
            .arg(keys)
            .query_async(&mut conn)
            .await?;
        Ok(values)
    }

    async fn write_batch(&self, writes: Vec<KvWrite>) -> StoreResult<()> {
        if writes.is_empty() {
            return Ok(());
        }

        let mut pipe = Pipeline::new();
        pipe.atomic();
        for write in &writes {
            match write {
                KvWrite::Set {
                    key,
                    value,
                    ttl_secs,
                    only_if_absent,
                } => {
                    let mut cmd = redis::cmd("SET");
                    cmd.arg(key).arg(value);
                    if let Some(ttl) = ttl_secs {
                        cmd.arg("EX").arg(*ttl);
                    }
                    if *only_if_absent {
                        cmd.arg("NX");
                    }
                    pipe.add_command(cmd).ignore();
                }
                KvWrite::Delete { key } => {
                    pipe.del(key).ignore();
                }
            }
        }

        let mut conn = self.conn.clone();
        pipe.query_async::<_, ()>(&mut conn).await?;
        debug!(count = writes.len(), "redis pipeline committed");
        Ok(())
    }

    async fn scan_keys(&self, pattern: &str) -> StoreResult<Vec<String>> {
        let mut conn = self.conn.clone();
        let mut cursor: u64 = 0;
        // SCAN may return a key more than once across iterations.
        let mut found = BTreeSet::new();

        loop {
            let (next_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(SCAN_COUNT)
                .query_async(&mut conn)
                .await?;

            found.extend(keys);
            cursor = next_cursor;
            if cursor == 0 {
                break;
            }
        }

        Ok(found.into_iter().collect())
    }

    async fn delete(&self, keys: &[String]) -> StoreResult<usize> {
        if keys.is_empty() {
            return Ok(0);
        }
        let mut conn = self.conn.clone();
        let deleted: usize = redis::cmd("DEL").arg(keys).query_async(&mut conn).await?;
        Ok(deleted)
    }

    async fn ping(&self) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}
