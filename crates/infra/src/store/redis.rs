//! Redis-backed hash store.
//!
//! Uses a single `ConnectionManager`: a multiplexed async connection that is
//! shared by every request and re-established transparently after a drop.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, RedisError};
use tracing::instrument;

use registry_core::FieldMap;

use super::{scan_all, HashStore, StoreError, StoreResult};

/// Keys requested per SCAN page.
const SCAN_PAGE_SIZE: usize = 500;

#[derive(Clone)]
pub struct RedisHashStore {
    conn: ConnectionManager,
}

impl core::fmt::Debug for RedisHashStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RedisHashStore").finish_non_exhaustive()
    }
}

impl RedisHashStore {
    /// Open a managed connection to `redis_url` (e.g. "redis://127.0.0.1:6379").
    pub async fn connect(redis_url: &str) -> StoreResult<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        Ok(Self { conn })
    }
}

fn to_store_error(e: RedisError) -> StoreError {
    if e.is_connection_dropped() || e.is_connection_refusal() || e.is_io_error() || e.is_timeout() {
        StoreError::Connection(e.to_string())
    } else {
        StoreError::Command(e.to_string())
    }
}

#[async_trait]
impl HashStore for RedisHashStore {
    #[instrument(skip(self, fields), fields(field_count = fields.len()))]
    async fn set_fields(&self, key: &str, fields: &[(String, String)]) -> StoreResult<()> {
        if fields.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn.clone();
        let _: () = conn.hset_multiple(key, fields).await.map_err(to_store_error)?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_all(&self, key: &str) -> StoreResult<FieldMap> {
        let mut conn = self.conn.clone();
        conn.hgetall(key).await.map_err(to_store_error)
    }

    /// One pipelined round-trip instead of one per key.
    #[instrument(skip(self, keys), fields(key_count = keys.len()))]
    async fn get_all_many(&self, keys: &[String]) -> StoreResult<Vec<FieldMap>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let mut pipe = redis::pipe();
        for key in keys {
            pipe.hgetall(key);
        }
        let mut conn = self.conn.clone();
        pipe.query_async(&mut conn).await.map_err(to_store_error)
    }

    #[instrument(skip(self))]
    async fn delete(&self, key: &str) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        let _: i64 = conn.del(key).await.map_err(to_store_error)?;
        Ok(())
    }

    /// SCAN-based enumeration; never blocks the server the way KEYS does.
    #[instrument(skip(self))]
    async fn keys(&self, pattern: &str) -> StoreResult<Vec<String>> {
        scan_all(|cursor| {
            let mut conn = self.conn.clone();
            let pattern = pattern.to_string();
            async move {
                let page: (u64, Vec<String>) = redis::cmd("SCAN")
                    .arg(cursor)
                    .arg("MATCH")
                    .arg(pattern)
                    .arg("COUNT")
                    .arg(SCAN_PAGE_SIZE)
                    .query_async(&mut conn)
                    .await
                    .map_err(to_store_error)?;
                Ok(page)
            }
        })
        .await
    }

    async fn ping(&self) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(to_store_error)?;
        Ok(())
    }
}
