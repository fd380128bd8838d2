//! Controller Module
//!
//! Orchestrates the three caching behaviors on top of key derivation, the
//! codec and a store client:
//!
//! - **cache**: return the stored result, or compute, store with a TTL and
//!   return it.
//! - **update**: always compute and overwrite.
//! - **delete**: compute, then remove the stored entry.
//!
//! Concurrent misses on one key are not coalesced; both callers compute and
//! the last write wins.

mod stats;
mod wrapped;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::codec::Cacheable;
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::key::{Args, CacheKey, KeyBuilder};
use crate::store::StoreClient;

use stats::StatsRecorder;

pub use stats::CacheStats;
pub use wrapped::{CachedFn, DeleteFn, UpdateFn};

// == Cache Controller ==
/// Shared handle for cached calls against one store and namespace.
///
/// Cloning is cheap; clones share the store connection and counters.
#[derive(Clone)]
pub struct CacheController {
    store: Arc<dyn StoreClient>,
    keys: KeyBuilder,
    default_ttl: Option<u64>,
    timeout: Option<Duration>,
    stats: Arc<StatsRecorder>,
}

impl CacheController {
    // == Constructors ==
    pub fn new(store: Arc<dyn StoreClient>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            keys: KeyBuilder::new(prefix),
            default_ttl: None,
            timeout: None,
            stats: Arc::new(StatsRecorder::default()),
        }
    }

    /// Uses the configured prefix, default TTL and store timeout.
    pub fn from_config(store: Arc<dyn StoreClient>, config: &Config) -> Self {
        Self::new(store, config.prefix.clone())
            .with_default_ttl(config.default_ttl())
            .with_timeout(config.timeout())
    }

    /// TTL for cache calls that do not specify one.
    pub fn with_default_ttl(mut self, ttl: Option<u64>) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Upper bound for each store call; exceeding it is `StoreUnavailable`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn store(&self) -> &Arc<dyn StoreClient> {
        &self.store
    }

    pub fn prefix(&self) -> &str {
        self.keys.prefix()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot()
    }

    /// Derives the key a call of `function` with `args` is stored under.
    pub fn key_for(&self, function: &str, args: &Args) -> Result<CacheKey> {
        self.keys.build(function, args)
    }

    // == Wrappers ==
    /// Wraps `f` with cache-or-compute behavior.
    ///
    /// `ttl` of `None` falls back to the controller's default TTL.
    pub fn cache<F>(&self, function: impl Into<String>, ttl: Option<u64>, f: F) -> CachedFn<F> {
        CachedFn::new(self.clone(), function.into(), ttl, f)
    }

    /// Wraps `f` with compute-and-overwrite behavior.
    pub fn update<F>(&self, function: impl Into<String>, f: F) -> UpdateFn<F> {
        UpdateFn::new(self.clone(), function.into(), f)
    }

    /// Wraps `f` with compute-then-delete behavior.
    pub fn delete<F>(&self, function: impl Into<String>, f: F) -> DeleteFn<F> {
        DeleteFn::new(self.clone(), function.into(), f)
    }

    // == Get Or Compute ==
    /// Returns the stored result for this call, computing and storing it on
    /// a miss. Errors from `compute` are returned unchanged and nothing is
    /// written.
    pub async fn get_or_compute<T, E, F, Fut>(
        &self,
        function: &str,
        args: &Args,
        ttl: Option<u64>,
        compute: F,
    ) -> std::result::Result<T, E>
    where
        T: Cacheable,
        E: From<CacheError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        let key = self.key_for(function, args)?;

        let cached = self
            .guarded("GET", key.as_str(), self.store.get(key.as_str()))
            .await?;
        if let Some(bytes) = cached {
            self.stats.record_hit();
            debug!(key = %key, bytes = bytes.len(), "Cache hit");
            return Ok(T::decode(&bytes)?);
        }

        self.stats.record_miss();
        debug!(key = %key, "Cache miss, computing");

        let value = compute().await?;
        let bytes = value.encode()?;
        let ttl = ttl.or(self.default_ttl);
        self.guarded("SET", key.as_str(), self.store.set(key.as_str(), &bytes, ttl))
            .await?;
        self.stats.record_write();
        debug!(key = %key, bytes = bytes.len(), ttl = ?ttl, "Stored computed result");

        Ok(value)
    }

    // == Compute And Store ==
    /// Computes the result and overwrites whatever is stored for this call.
    ///
    /// Returns `true` once the store acknowledged the write.
    pub async fn compute_and_store<T, E, F, Fut>(
        &self,
        function: &str,
        args: &Args,
        ttl: Option<u64>,
        compute: F,
    ) -> std::result::Result<bool, E>
    where
        T: Cacheable,
        E: From<CacheError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        let key = self.key_for(function, args)?;

        let value = compute().await?;
        let bytes = value.encode()?;
        self.guarded("SET", key.as_str(), self.store.set(key.as_str(), &bytes, ttl))
            .await?;
        self.stats.record_write();
        debug!(key = %key, bytes = bytes.len(), "Updated cached result");

        Ok(true)
    }

    // == Compute And Delete ==
    /// Runs the wrapped computation, then removes the entry for this call.
    ///
    /// Returns whether an entry existed. If `compute` fails nothing is
    /// deleted.
    pub async fn compute_and_delete<T, E, F, Fut>(
        &self,
        function: &str,
        args: &Args,
        compute: F,
    ) -> std::result::Result<bool, E>
    where
        E: From<CacheError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        let key = self.key_for(function, args)?;
        compute().await?;
        Ok(self.remove(&key).await?)
    }

    // == Invalidate ==
    /// Removes the entry for this call without computing anything.
    pub async fn invalidate(&self, function: &str, args: &Args) -> Result<bool> {
        let key = self.key_for(function, args)?;
        self.remove(&key).await
    }

    /// Removes every entry in the store's database.
    pub async fn flush_all(&self) -> Result<()> {
        self.guarded("FLUSH", "*", self.store.flush_all()).await
    }

    async fn remove(&self, key: &CacheKey) -> Result<bool> {
        let existed = self
            .guarded("DEL", key.as_str(), self.store.delete(key.as_str()))
            .await?;
        if existed {
            self.stats.record_delete();
        }
        debug!(key = %key, existed, "Deleted cached result");
        Ok(existed)
    }

    /// Applies the store timeout and logs failures.
    async fn guarded<T, Fut>(&self, op: &'static str, key: &str, call: Fut) -> Result<T>
    where
        Fut: Future<Output = Result<T>>,
    {
        let outcome = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(outcome) => outcome,
                Err(_) => Err(CacheError::StoreUnavailable(format!(
                    "{} timed out after {}ms",
                    op,
                    limit.as_millis()
                ))),
            },
            None => call.await,
        };

        outcome.map_err(|err| {
            warn!(store = self.store.name(), op, key, error = %err, "Store call failed");
            err
        })
    }
}

impl std::fmt::Debug for CacheController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheController")
            .field("store", &self.store.name())
            .field("prefix", &self.keys.prefix())
            .field("default_ttl", &self.default_ttl)
            .field("timeout", &self.timeout)
            .finish()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::value::{Record, RecordSet};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn controller() -> (CacheController, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (CacheController::new(store.clone(), "demo"), store)
    }

    fn rows(n: i64) -> RecordSet {
        (0..n).map(|i| Record::new().with("i", i)).collect()
    }

    #[tokio::test]
    async fn test_get_or_compute_miss_then_hit() {
        let (controller, _) = controller();
        let calls = AtomicUsize::new(0);
        let counter = &calls;
        let args = Args::new().kwarg("rows", 3i64);

        for _ in 0..2 {
            let result: std::result::Result<RecordSet, CacheError> = controller
                .get_or_compute("f", &args, Some(60), move || async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(rows(3))
                })
                .await;
            assert_eq!(result.unwrap(), rows(3));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let stats = controller.stats();
        assert_eq!((stats.hits, stats.misses, stats.writes), (1, 1, 1));
    }

    #[tokio::test]
    async fn test_compute_error_is_not_cached() {
        let (controller, store) = controller();
        let args = Args::new();

        let result: std::result::Result<Record, CacheError> = controller
            .get_or_compute("f", &args, None, || async {
                Err(CacheError::InvalidArgument("boom".to_string()))
            })
            .await;

        assert_eq!(result, Err(CacheError::InvalidArgument("boom".to_string())));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_default_ttl_applied() {
        let store = Arc::new(MemoryStore::new());
        let controller = CacheController::new(store.clone(), "demo").with_default_ttl(Some(30));
        let args = Args::new();

        let _: Record = controller
            .get_or_compute("f", &args, None, || async { Ok::<_, CacheError>(Record::new()) })
            .await
            .unwrap();

        let key = controller.key_for("f", &args).unwrap();
        let remaining = store.ttl_remaining_ms(key.as_str()).await.unwrap();
        assert!(remaining > 29_000 && remaining <= 30_000);
    }

    #[tokio::test]
    async fn test_corrupt_entry_surfaces_decode_error() {
        let (controller, store) = controller();
        let args = Args::new();
        let key = controller.key_for("f", &args).unwrap();
        store.set(key.as_str(), b"garbage", None).await.unwrap();

        let result: std::result::Result<Record, CacheError> = controller
            .get_or_compute("f", &args, None, || async { Ok(Record::new()) })
            .await;

        assert!(matches!(result, Err(CacheError::Decode(_))));
        assert!(store.exists(key.as_str()).await.unwrap(), "corrupt entry is kept");
    }

    #[tokio::test]
    async fn test_compute_and_delete_skips_delete_on_error() {
        let (controller, store) = controller();
        let args = Args::new();
        let key = controller.key_for("f", &args).unwrap();
        store.set(key.as_str(), b"x", None).await.unwrap();

        let result = controller
            .compute_and_delete("f", &args, || async {
                Err::<Record, _>(CacheError::InvalidArgument("boom".to_string()))
            })
            .await;

        assert!(result.is_err());
        assert!(store.exists(key.as_str()).await.unwrap());
    }

    #[tokio::test]
    async fn test_invalidate() {
        let (controller, store) = controller();
        let args = Args::new().arg(1i64);
        let key = controller.key_for("f", &args).unwrap();
        store.set(key.as_str(), b"x", None).await.unwrap();

        assert!(controller.invalidate("f", &args).await.unwrap());
        assert!(!controller.invalidate("f", &args).await.unwrap());
        assert_eq!(controller.stats().deletes, 1);
    }

    struct StalledStore;

    #[async_trait]
    impl StoreClient for StalledStore {
        async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>> {
            std::future::pending().await
        }
        async fn set(&self, _key: &str, _value: &[u8], _ttl: Option<u64>) -> Result<()> {
            std::future::pending().await
        }
        async fn delete(&self, _key: &str) -> Result<bool> {
            std::future::pending().await
        }
        async fn exists(&self, _key: &str) -> Result<bool> {
            std::future::pending().await
        }
        async fn expire(&self, _key: &str, _ttl: u64) -> Result<bool> {
            std::future::pending().await
        }
        async fn flush_all(&self) -> Result<()> {
            std::future::pending().await
        }
        fn name(&self) -> &'static str {
            "stalled"
        }
    }

    #[tokio::test]
    async fn test_store_timeout_is_store_unavailable() {
        let controller = CacheController::new(Arc::new(StalledStore), "demo")
            .with_timeout(Duration::from_millis(50));
        let calls = AtomicUsize::new(0);
        let counter = &calls;

        let result: std::result::Result<Record, CacheError> = controller
            .get_or_compute("f", &Args::new(), None, move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Record::new())
            })
            .await;

        assert!(matches!(result, Err(CacheError::StoreUnavailable(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 0, "timeout is not a miss");
    }
}
