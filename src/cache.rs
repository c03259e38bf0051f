//! Time-bounded cache of walked tables.
//!
//! Entries are keyed by column and target and expire passively: an entry
//! older than the caller's TTL is treated as absent and replaced by the next
//! fetch. Two callers missing on the same key at the same time both fetch
//! and the later write wins; the cache reduces load on devices, it does not
//! deduplicate in-flight walks.

use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;

use crate::error::Result;
use crate::oid::Oid;
use crate::table::OidTable;

/// Default entry lifetime.
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Identifies one column on one device.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub subtree: Oid,
    pub target: SocketAddr,
}

impl CacheKey {
    pub fn new(subtree: Oid, target: SocketAddr) -> Self {
        Self { subtree, target }
    }
}

struct CacheEntry {
    table: Arc<OidTable>,
    fetched_at: Instant,
}

/// Process-local table cache shared between discoveries.
#[derive(Default)]
pub struct ResultCache {
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached table for `key` if it is younger than `ttl`,
    /// otherwise run `fetch` and store its result.
    ///
    /// With `bypass` set the cached entry is ignored and always replaced.
    /// A failed fetch leaves any existing entry untouched.
    pub async fn get_or_fetch<F, Fut>(
        &self,
        key: CacheKey,
        ttl: Duration,
        bypass: bool,
        fetch: F,
    ) -> Result<Arc<OidTable>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<OidTable>>,
    {
        if !bypass && let Some(table) = self.lookup(&key, ttl) {
            tracing::debug!(
                cache.subtree = %key.subtree,
                cache.target = %key.target,
                cache.hit = true,
                "table served from cache"
            );
            return Ok(table);
        }

        tracing::debug!(
            cache.subtree = %key.subtree,
            cache.target = %key.target,
            cache.hit = false,
            cache.bypass = bypass,
            "fetching table"
        );
        let table = Arc::new(fetch().await?);
        self.entries.lock().unwrap().insert(
            key,
            CacheEntry {
                table: table.clone(),
                fetched_at: Instant::now(),
            },
        );
        Ok(table)
    }

    fn lookup(&self, key: &CacheKey, ttl: Duration) -> Option<Arc<OidTable>> {
        let entries = self.entries.lock().unwrap();
        let entry = entries.get(key)?;
        (entry.fetched_at.elapsed() < ttl).then(|| entry.table.clone())
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop entries older than `ttl`; returns how many were removed.
    pub fn purge_expired(&self, ttl: Duration) -> usize {
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|_, entry| entry.fetched_at.elapsed() < ttl);
        before - entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::oid;
    use crate::value::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn key() -> CacheKey {
        CacheKey::new(
            oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 3),
            "192.0.2.1:161".parse().unwrap(),
        )
    }

    /// Fetch stub that counts its calls and returns a one-row table.
    fn counting(calls: &AtomicUsize) -> impl Future<Output = Result<OidTable>> + '_ {
        async move {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(OidTable::from_entries(
                key().subtree,
                [(1, Value::Integer(n as i64))],
            ))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetches_once_within_ttl() {
        let cache = ResultCache::new();
        let calls = AtomicUsize::new(0);
        let ttl = Duration::from_secs(60);

        let first = cache
            .get_or_fetch(key(), ttl, false, || counting(&calls))
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(59)).await;
        let second = cache
            .get_or_fetch(key(), ttl, false, || counting(&calls))
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_is_refetched() {
        let cache = ResultCache::new();
        let calls = AtomicUsize::new(0);
        let ttl = Duration::from_secs(60);

        cache
            .get_or_fetch(key(), ttl, false, || counting(&calls))
            .await
            .unwrap();
        tokio::time::advance(ttl).await;
        let table = cache
            .get_or_fetch(key(), ttl, false, || counting(&calls))
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(table.get(1), Some(&Value::Integer(2)));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_bypass_fetches_every_time() {
        let cache = ResultCache::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            cache
                .get_or_fetch(key(), DEFAULT_TTL, true, || counting(&calls))
                .await
                .unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        // The bypassed result is stored for non-bypass readers.
        let table = cache
            .get_or_fetch(key(), DEFAULT_TTL, false, || counting(&calls))
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(table.get(1), Some(&Value::Integer(3)));
    }

    #[tokio::test]
    async fn test_failed_fetch_is_not_stored() {
        let cache = ResultCache::new();
        let result = cache
            .get_or_fetch(key(), DEFAULT_TTL, false, || async {
                Err(Error::Timeout {
                    target: None,
                    elapsed: Duration::from_secs(5),
                    request_id: 1,
                    retries: 0,
                })
            })
            .await;
        assert!(result.is_err());
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_keys_distinguish_targets() {
        let cache = ResultCache::new();
        let calls = AtomicUsize::new(0);
        let other = CacheKey::new(key().subtree, "192.0.2.2:161".parse().unwrap());

        cache
            .get_or_fetch(key(), DEFAULT_TTL, false, || counting(&calls))
            .await
            .unwrap();
        cache
            .get_or_fetch(other, DEFAULT_TTL, false, || counting(&calls))
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired() {
        let cache = ResultCache::new();
        let calls = AtomicUsize::new(0);
        cache
            .get_or_fetch(key(), DEFAULT_TTL, false, || counting(&calls))
            .await
            .unwrap();

        assert_eq!(cache.purge_expired(Duration::from_secs(10)), 0);
        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(cache.purge_expired(Duration::from_secs(10)), 1);
        assert!(cache.is_empty());
    }
}
