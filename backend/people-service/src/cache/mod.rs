//! Read-through cache for the REST API surface
//!
//! Cache-aside over Redis: the collection view and per-person detail views
//! store their serialized JSON under fixed keys with bounded TTLs, and
//! every write to the underlying rows fires the invalidation hooks. Cache
//! failures degrade to the database path; they never fail a request.

use redis::{aio::ConnectionManager, AsyncCommands};
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::Result;

/// Collection representation expiry
pub const LIST_TTL: Duration = Duration::from_secs(15 * 60);
/// Per-person representation expiry
pub const DETAIL_TTL: Duration = Duration::from_secs(30 * 60);

pub fn person_list_key() -> String {
    "api:person:list".to_string()
}

pub fn person_key(id: Uuid) -> String {
    format!("api:person:{}", id)
}

#[derive(Clone)]
pub struct ApiCache {
    redis: ConnectionManager,
}

impl ApiCache {
    pub fn new(redis: ConnectionManager) -> Self {
        Self { redis }
    }

    /// Return the cached representation under `key`, or compute it with
    /// `loader`, store it for `ttl`, and return it.
    pub async fn get_or_set<T, F, Fut>(&self, key: &str, ttl: Duration, loader: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut conn = self.redis.clone();

        match conn.get::<_, Option<String>>(key).await {
            Ok(Some(data)) => {
                if let Ok(value) = serde_json::from_str::<T>(&data) {
                    debug!("cache HIT for {}", key);
                    return Ok(value);
                }
                warn!("cache entry for {} failed to deserialize, recomputing", key);
            }
            Ok(None) => {
                debug!("cache MISS for {}", key);
            }
            Err(e) => {
                warn!("redis read error for {}: {}", key, e);
            }
        }

        let value = loader().await?;

        match serde_json::to_string(&value) {
            Ok(data) => {
                if let Err(e) = conn
                    .set_ex::<_, _, ()>(key, data, ttl.as_secs())
                    .await
                {
                    warn!("cache write for {} failed: {}", key, e);
                }
            }
            Err(e) => warn!("cache serialization for {} failed: {}", key, e),
        }

        Ok(value)
    }

    async fn delete(&self, keys: Vec<String>) {
        if keys.is_empty() {
            return;
        }
        let mut conn = self.redis.clone();
        if let Err(e) = conn.del::<_, ()>(keys.clone()).await {
            warn!("cache invalidation for {:?} failed: {}", keys, e);
        } else {
            debug!("cache INVALIDATE {:?}", keys);
        }
    }

    /// Invalidation hook fired on every write touching one or more persons.
    pub async fn invalidate_persons(&self, ids: &[Uuid]) {
        let mut keys: Vec<String> = ids.iter().map(|id| person_key(*id)).collect();
        keys.push(person_list_key());
        self.delete(keys).await;
    }

    /// Drop only the collection representation (bulk writes).
    pub async fn invalidate_list(&self) {
        self.delete(vec![person_list_key()]).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_builders() {
        let id = Uuid::nil();
        assert_eq!(person_list_key(), "api:person:list");
        assert_eq!(
            person_key(id),
            "api:person:00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn test_ttls() {
        assert_eq!(LIST_TTL.as_secs(), 900);
        assert_eq!(DETAIL_TTL.as_secs(), 1800);
    }
}
