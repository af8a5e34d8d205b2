//! In-memory, key-addressed cache of query results.
//!
//! Each key holds one value plus bookkeeping (`version`, `updated_at`). Every
//! write is a single replace performed under the write lock and is announced
//! on a broadcast channel so views can re-render.

use std::{borrow::Cow, collections::HashMap, fmt, sync::Arc};

use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, RwLock};
use tracing::debug;

const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey(Cow<'static, str>);

impl QueryKey {
    pub const fn from_static(key: &'static str) -> Self {
        Self(Cow::Borrowed(key))
    }

    pub fn new(key: impl Into<String>) -> Self {
        Self(Cow::Owned(key.into()))
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheEventKind {
    Set,
    Updated,
    Removed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEvent {
    pub key: QueryKey,
    pub version: u64,
    pub kind: CacheEventKind,
}

#[derive(Debug, Clone)]
pub struct CachedQuery<V> {
    pub data: Arc<V>,
    pub version: u64,
    pub updated_at: DateTime<Utc>,
}

struct Inner<V> {
    entries: HashMap<QueryKey, CachedQuery<V>>,
    next_version: u64,
}

impl<V> Inner<V> {
    fn bump(&mut self) -> u64 {
        self.next_version += 1;
        self.next_version
    }
}

pub struct QueryCache<V> {
    inner: RwLock<Inner<V>>,
    events: broadcast::Sender<CacheEvent>,
}

impl<V> Default for QueryCache<V> {
    fn default() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: RwLock::new(Inner {
                entries: HashMap::new(),
                next_version: 0,
            }),
            events,
        }
    }
}

impl<V> QueryCache<V> {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.events.subscribe()
    }

    pub async fn get_query_data(&self, key: &QueryKey) -> Option<Arc<V>> {
        let guard = self.inner.read().await;
        guard.entries.get(key).map(|entry| Arc::clone(&entry.data))
    }

    pub async fn get_query(&self, key: &QueryKey) -> Option<CachedQuery<V>> {
        let guard = self.inner.read().await;
        guard.entries.get(key).map(|entry| CachedQuery {
            data: Arc::clone(&entry.data),
            version: entry.version,
            updated_at: entry.updated_at,
        })
    }

    pub async fn contains(&self, key: &QueryKey) -> bool {
        self.inner.read().await.entries.contains_key(key)
    }

    /// Replaces whatever is stored under `key`. Returns the new entry version.
    pub async fn set_query_data(&self, key: &QueryKey, data: V) -> u64 {
        let version = {
            let mut guard = self.inner.write().await;
            let version = guard.bump();
            guard.entries.insert(
                key.clone(),
                CachedQuery {
                    data: Arc::new(data),
                    version,
                    updated_at: Utc::now(),
                },
            );
            version
        };
        self.publish(key, version, CacheEventKind::Set);
        version
    }

    /// Derives a new value from the current one and stores it atomically.
    ///
    /// The updater only runs when `key` holds data; otherwise nothing is
    /// written and `None` is returned.
    pub async fn update_query_data<F>(&self, key: &QueryKey, updater: F) -> Option<u64>
    where
        F: FnOnce(&V) -> V,
    {
        let version = {
            let mut guard = self.inner.write().await;
            let next = {
                let current = guard.entries.get(key)?;
                updater(&current.data)
            };
            let version = guard.bump();
            guard.entries.insert(
                key.clone(),
                CachedQuery {
                    data: Arc::new(next),
                    version,
                    updated_at: Utc::now(),
                },
            );
            version
        };
        self.publish(key, version, CacheEventKind::Updated);
        Some(version)
    }

    pub async fn remove_query(&self, key: &QueryKey) -> bool {
        let version = {
            let mut guard = self.inner.write().await;
            if guard.entries.remove(key).is_none() {
                return false;
            }
            guard.bump()
        };
        self.publish(key, version, CacheEventKind::Removed);
        true
    }

    fn publish(&self, key: &QueryKey, version: u64, kind: CacheEventKind) {
        debug!(key = %key, version, ?kind, "query cache write");
        // No subscribers is fine.
        let _ = self.events.send(CacheEvent {
            key: key.clone(),
            version,
            kind,
        });
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
