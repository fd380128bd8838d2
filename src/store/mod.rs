//! Store Module
//!
//! The key-value store contract the cache controller relies on, with a
//! Redis implementation and an in-process one.

mod entry;
mod memory;
mod remote;

use async_trait::async_trait;

use crate::error::Result;

pub(crate) use entry::StoreEntry;
pub use memory::MemoryStore;
pub use remote::RedisStore;

// == Store Client ==
/// Minimal key-value store contract.
///
/// A TTL of `None` or `Some(0)` stores without expiry. Implementations must
/// be safe to share between concurrent callers.
#[async_trait]
pub trait StoreClient: Send + Sync {
    /// Returns the stored bytes, `None` when absent or expired.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Stores `value`, overwriting any previous entry and its TTL.
    async fn set(&self, key: &str, value: &[u8], ttl: Option<u64>) -> Result<()>;

    /// Removes a key, returning whether it existed.
    async fn delete(&self, key: &str) -> Result<bool>;

    async fn exists(&self, key: &str) -> Result<bool>;

    /// Sets a TTL on an existing key, returning whether the key existed.
    async fn expire(&self, key: &str, ttl: u64) -> Result<bool>;

    /// Removes every key in the store's database.
    async fn flush_all(&self) -> Result<()>;

    /// Short backend name for logs.
    fn name(&self) -> &'static str;
}

/// TTL normalization shared by implementations.
pub(crate) fn effective_ttl(ttl: Option<u64>) -> Option<u64> {
    ttl.filter(|secs| *secs > 0)
}
