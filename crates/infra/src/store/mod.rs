//! Key-value hash store abstraction.
//!
//! The service needs only a small capability set from its backing store:
//! set fields in a hash, read a whole hash, delete a key, and enumerate keys by
//! glob pattern. Anything offering those can back the resident repository.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use registry_core::FieldMap;

pub mod in_memory;
#[cfg(feature = "redis")]
pub mod redis;

pub use in_memory::InMemoryHashStore;
#[cfg(feature = "redis")]
pub use self::redis::RedisHashStore;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store connection error: {0}")]
    Connection(String),

    #[error("store command error: {0}")]
    Command(String),
}

#[async_trait]
pub trait HashStore: Send + Sync {
    /// Set the given fields on the hash at `key`, leaving other fields untouched.
    ///
    /// An empty field list is a no-op and does not create the key.
    async fn set_fields(&self, key: &str, fields: &[(String, String)]) -> StoreResult<()>;

    /// All fields of the hash at `key`; empty when the key does not exist.
    async fn get_all(&self, key: &str) -> StoreResult<FieldMap>;

    /// [`HashStore::get_all`] for several keys, results in key order.
    async fn get_all_many(&self, keys: &[String]) -> StoreResult<Vec<FieldMap>> {
        let mut maps = Vec::with_capacity(keys.len());
        for key in keys {
            maps.push(self.get_all(key).await?);
        }
        Ok(maps)
    }

    /// Remove `key` entirely. Removing a missing key succeeds.
    async fn delete(&self, key: &str) -> StoreResult<()>;

    /// Keys matching a glob pattern (`*` and `?`), in no particular order.
    async fn keys(&self, pattern: &str) -> StoreResult<Vec<String>>;

    /// Round-trip check used for health reporting.
    async fn ping(&self) -> StoreResult<()>;
}

#[async_trait]
impl<S> HashStore for Arc<S>
where
    S: HashStore + ?Sized,
{
    async fn set_fields(&self, key: &str, fields: &[(String, String)]) -> StoreResult<()> {
        (**self).set_fields(key, fields).await
    }

    async fn get_all(&self, key: &str) -> StoreResult<FieldMap> {
        (**self).get_all(key).await
    }

    async fn get_all_many(&self, keys: &[String]) -> StoreResult<Vec<FieldMap>> {
        (**self).get_all_many(keys).await
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        (**self).delete(key).await
    }

    async fn keys(&self, pattern: &str) -> StoreResult<Vec<String>> {
        (**self).keys(pattern).await
    }

    async fn ping(&self) -> StoreResult<()> {
        (**self).ping().await
    }
}

/// Drive a cursor-based key scan to completion.
///
/// `fetch_page(cursor)` yields the next cursor and one page of keys; cursor `0`
/// ends the scan. The first failing page fails the whole scan instead of
/// returning the keys gathered so far. Keys reported twice are collapsed.
#[cfg_attr(not(feature = "redis"), allow(dead_code))]
pub(crate) async fn scan_all<F, Fut>(mut fetch_page: F) -> StoreResult<Vec<String>>
where
    F: FnMut(u64) -> Fut,
    Fut: Future<Output = StoreResult<(u64, Vec<String>)>>,
{
    let mut keys = Vec::new();
    let mut cursor = 0;
    loop {
        let (next, page) = fetch_page(cursor).await?;
        keys.extend(page);
        if next == 0 {
            break;
        }
        cursor = next;
    }
    keys.sort_unstable();
    keys.dedup();
    Ok(keys)
}
