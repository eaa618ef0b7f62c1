//! Bundle cache — pluggable memoization of generated bundles keyed on the
//! serialized profile.
//!
//! Default: `MokaBundleCache` (in-process, TTL + capacity bound).
//! `NoopCache` disables memoization (`CACHE_MAX_CAPACITY=0`).
//!
//! `AppState` holds an `Arc<dyn BundleCache>`. The generator never sees it.

use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;

use crate::retention::generator::RetentionBundle;

#[async_trait]
pub trait BundleCache: Send + Sync {
    async fn get(&self, key: &str) -> Option<RetentionBundle>;
    async fn insert(&self, key: String, bundle: RetentionBundle);
}

pub struct MokaBundleCache {
    inner: Cache<String, RetentionBundle>,
}

impl MokaBundleCache {
    pub fn new(ttl: Duration, max_capacity: u64) -> Self {
        Self {
            inner: Cache::builder()
                .time_to_live(ttl)
                .max_capacity(max_capacity)
                .build(),
        }
    }
}

#[async_trait]
impl BundleCache for MokaBundleCache {
    async fn get(&self, key: &str) -> Option<RetentionBundle> {
        self.inner.get(key).await
    }

    async fn insert(&self, key: String, bundle: RetentionBundle) {
        self.inner.insert(key, bundle).await;
    }
}

pub struct NoopCache;

#[async_trait]
impl BundleCache for NoopCache {
    async fn get(&self, _key: &str) -> Option<RetentionBundle> {
        None
    }

    async fn insert(&self, _key: String, _bundle: RetentionBundle) {}
}
