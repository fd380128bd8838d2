//! Memo Cache - function-result caching over a key-value store
//!
//! Wraps expensive functions so their results are stored under keys derived
//! from the function identity and call arguments, with TTL expiry, forced
//! recomputation and explicit invalidation. Results are records of typed
//! values encoded by a width- and offset-preserving binary codec.

pub mod codec;
pub mod config;
pub mod controller;
pub mod error;
pub mod key;
pub mod store;
pub mod tasks;
pub mod value;

pub use codec::Cacheable;
pub use config::{Backend, Config};
pub use controller::{CacheController, CacheStats, CachedFn, DeleteFn, UpdateFn};
pub use error::{CacheError, Result};
pub use key::{Args, CacheKey, KeyBuilder, Signature};
pub use store::{MemoryStore, RedisStore, StoreClient};
pub use tasks::spawn_cleanup_task;
pub use value::{Payload, Record, RecordSet, TypedValue, ZonedTime};
