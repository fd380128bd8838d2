//! Error types for the caching layer
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for key derivation, the codec and store access.
///
/// A missing key is never an error: lookups report absence through
/// `Option`/`bool` return values.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CacheError {
    /// Value cannot be fingerprinted or encoded
    #[error("Unsupported type: {0}")]
    UnsupportedType(String),

    /// Stored bytes are corrupt, truncated or from another format version
    #[error("Decode error: {0}")]
    Decode(String),

    /// Network, timeout or connection failure talking to the store
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Malformed call arguments (bad keyword names, duplicate bindings)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        CacheError::StoreUnavailable(err.to_string())
    }
}

// == Result Type Alias ==
/// Convenience Result type for the caching layer.
pub type Result<T> = std::result::Result<T, CacheError>;
