//! Facet index store adapter
//!
//! The index store is an external key-value set engine. The core only
//! depends on the [`FacetStore`] capability trait; Redis backs it in
//! production and [`MemoryFacetStore`] backs tests and local runs.
//!
//! Missing keys are never errors: they read as empty sets with
//! cardinality zero. Only transport failures surface, as
//! [`crate::Error::Index`].

use crate::Result;
use async_trait::async_trait;
use redis::AsyncCommands;
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;
use std::time::Duration;

/// Key-value set operations the facet index relies on
#[async_trait]
pub trait FacetStore: Send + Sync {
    /// Delete every key starting with `prefix`
    async fn clear_namespace(&self, prefix: &str) -> Result<()>;

    /// Delete a single key (absent keys are fine)
    async fn delete(&self, key: &str) -> Result<()>;

    /// Add members to the set at `key`, creating it if absent
    async fn add_members(&self, key: &str, members: &[String]) -> Result<()>;

    /// All members of the set at `key`; empty set if the key is absent
    async fn members(&self, key: &str) -> Result<HashSet<String>>;

    /// Cardinality of the set at `key`; 0 if the key is absent
    async fn cardinality(&self, key: &str) -> Result<u64>;

    /// Every existing key starting with `prefix`
    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>>;

    /// Intersection of the sets at `keys`, computed by the store
    ///
    /// Returned directly, never persisted. An empty `keys` slice yields
    /// an empty set.
    async fn intersect(&self, keys: &[String]) -> Result<HashSet<String>>;

    /// Store the union of the sets at `keys` under `dest` and return
    /// its cardinality
    ///
    /// `dest` is an expiring scratch key: any previous value is
    /// replaced, an empty result deletes it, and the store drops it
    /// after `ttl`.
    async fn store_union(&self, dest: &str, keys: &[String], ttl: Duration) -> Result<u64>;

    /// Store the intersection of the sets at `keys` under `dest` and
    /// return its cardinality
    ///
    /// Same scratch-key semantics as [`FacetStore::store_union`]. The
    /// returned cardinality makes counting an intersection a single
    /// store-side operation, without transferring members.
    async fn store_intersection(&self, dest: &str, keys: &[String], ttl: Duration)
        -> Result<u64>;
}

/// Redis-backed facet store
///
/// Holds a multiplexed connection manager; clones share the connection.
#[derive(Clone)]
pub struct RedisFacetStore {
    conn: redis::aio::ConnectionManager,
}

impl RedisFacetStore {
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)?;
        let conn = client.get_connection_manager().await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl FacetStore for RedisFacetStore {
    async fn clear_namespace(&self, prefix: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        // KEYS is acceptable here: the rebuild is an offline batch job
        // and the facet namespace is bounded by the number of distinct
        // facet values.
        let keys: Vec<String> = conn.keys(format!("{prefix}*")).await?;
        if !keys.is_empty() {
            let _: () = conn.del(keys).await?;
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(key).await?;
        Ok(())
    }

    async fn add_members(&self, key: &str, members: &[String]) -> Result<()> {
        if members.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn.clone();
        let _: () = conn.sadd(key, members).await?;
        Ok(())
    }

    async fn members(&self, key: &str) -> Result<HashSet<String>> {
        let mut conn = self.conn.clone();
        let members: HashSet<String> = conn.smembers(key).await?;
        Ok(members)
    }

    async fn cardinality(&self, key: &str) -> Result<u64> {
        let mut conn = self.conn.clone();
        let count: u64 = conn.scard(key).await?;
        Ok(count)
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let mut conn = self.conn.clone();
        let keys: Vec<String> = conn.keys(format!("{prefix}*")).await?;
        Ok(keys)
    }

    async fn intersect(&self, keys: &[String]) -> Result<HashSet<String>> {
        if keys.is_empty() {
            return Ok(HashSet::new());
        }
        let mut conn = self.conn.clone();
        let members: HashSet<String> = conn.sinter(keys).await?;
        Ok(members)
    }

    async fn store_union(&self, dest: &str, keys: &[String], ttl: Duration) -> Result<u64> {
        if keys.is_empty() {
            return Ok(0);
        }
        let mut conn = self.conn.clone();
        // SUNIONSTORE deletes dest when the result is empty
        let count: u64 = conn.sunionstore(dest, keys).await?;
        if count > 0 {
            let _: () = conn.expire(dest, ttl.as_secs() as i64).await?;
        }
        Ok(count)
    }

    async fn store_intersection(
        &self,
        dest: &str,
        keys: &[String],
        ttl: Duration,
    ) -> Result<u64> {
        if keys.is_empty() {
            return Ok(0);
        }
        let mut conn = self.conn.clone();
        // SINTERSTORE deletes dest when the result is empty
        let count: u64 = conn.sinterstore(dest, keys).await?;
        if count > 0 {
            let _: () = conn.expire(dest, ttl.as_secs() as i64).await?;
        }
        Ok(count)
    }
}

/// In-memory facet store for tests and local development
#[derive(Default)]
pub struct MemoryFacetStore {
    sets: RwLock<HashMap<String, HashSet<String>>>,
}

impl MemoryFacetStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<String, HashSet<String>>>> {
        self.sets
            .write()
            .map_err(|_| crate::Error::Internal("facet store lock poisoned".to_string()))
    }
}

#[async_trait]
impl FacetStore for MemoryFacetStore {
    async fn clear_namespace(&self, prefix: &str) -> Result<()> {
        self.lock()?.retain(|key, _| !key.starts_with(prefix));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }

    async fn add_members(&self, key: &str, members: &[String]) -> Result<()> {
        if members.is_empty() {
            return Ok(());
        }
        self.lock()?
            .entry(key.to_string())
            .or_default()
            .extend(members.iter().cloned());
        Ok(())
    }

    async fn members(&self, key: &str) -> Result<HashSet<String>> {
        Ok(self.lock()?.get(key).cloned().unwrap_or_default())
    }

    async fn cardinality(&self, key: &str) -> Result<u64> {
        Ok(self.lock()?.get(key).map_or(0, |s| s.len() as u64))
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let mut keys: Vec<String> = self
            .lock()?
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn intersect(&self, keys: &[String]) -> Result<HashSet<String>> {
        let sets = self.lock()?;
        Ok(intersection_of(&sets, keys))
    }

    async fn store_union(&self, dest: &str, keys: &[String], _ttl: Duration) -> Result<u64> {
        let mut sets = self.lock()?;
        let mut union: HashSet<String> = HashSet::new();
        for key in keys {
            if let Some(set) = sets.get(key) {
                union.extend(set.iter().cloned());
            }
        }
        let count = union.len() as u64;
        // Mirror Redis: an empty result deletes the destination key.
        // The in-memory store never expires scratch keys.
        if union.is_empty() {
            sets.remove(dest);
        } else {
            sets.insert(dest.to_string(), union);
        }
        Ok(count)
    }

    async fn store_intersection(
        &self,
        dest: &str,
        keys: &[String],
        _ttl: Duration,
    ) -> Result<u64> {
        let mut sets = self.lock()?;
        let result = intersection_of(&sets, keys);
        let count = result.len() as u64;
        if result.is_empty() {
            sets.remove(dest);
        } else {
            sets.insert(dest.to_string(), result);
        }
        Ok(count)
    }
}

fn intersection_of(
    sets: &HashMap<String, HashSet<String>>,
    keys: &[String],
) -> HashSet<String> {
    let mut iter = keys.iter();
    let Some(first) = iter.next() else {
        return HashSet::new();
    };
    let mut result = sets.get(first).cloned().unwrap_or_default();
    for key in iter {
        let Some(set) = sets.get(key) else {
            return HashSet::new();
        };
        result.retain(|id| set.contains(id));
        if result.is_empty() {
            break;
        }
    }
    result
}
