//! Wrapped functions
//!
//! Each wrapper holds a target function, the identity its entries are
//! stored under, and optionally its parameter names. Wrappers that share an
//! identity address the same entries, so a cache wrapper and an update
//! wrapper around different closures can cooperate on one key.

use std::future::Future;

use crate::codec::Cacheable;
use crate::controller::CacheController;
use crate::error::{CacheError, Result};
use crate::key::{Args, CacheKey, Signature};

/// Identity and signature shared by all wrapper kinds.
#[derive(Debug, Clone)]
struct Target {
    function: String,
    signature: Option<Signature>,
}

impl Target {
    fn bind(&self, args: &Args) -> Result<Args> {
        match &self.signature {
            Some(signature) => signature.bind(args),
            None => Ok(args.clone()),
        }
    }
}

// == Cached Fn ==
/// Cache-or-compute wrapper created by [`CacheController::cache`].
pub struct CachedFn<F> {
    controller: CacheController,
    target: Target,
    ttl: Option<u64>,
    f: F,
}

impl<F> CachedFn<F> {
    pub(crate) fn new(controller: CacheController, function: String, ttl: Option<u64>, f: F) -> Self {
        Self {
            controller,
            target: Target {
                function,
                signature: None,
            },
            ttl,
            f,
        }
    }

    /// Declares parameter names so positional and keyword calls share keys.
    pub fn with_signature(mut self, signature: Signature) -> Self {
        self.target.signature = Some(signature);
        self
    }

    pub fn function(&self) -> &str {
        &self.target.function
    }

    /// Key a call with `args` reads and writes.
    pub fn key(&self, args: &Args) -> Result<CacheKey> {
        let bound = self.target.bind(args)?;
        self.controller.key_for(&self.target.function, &bound)
    }

    pub async fn call<T, E, Fut>(&self, args: Args) -> std::result::Result<T, E>
    where
        F: Fn(Args) -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        T: Cacheable,
        E: From<CacheError>,
    {
        let bound = self.target.bind(&args)?;
        self.controller
            .get_or_compute(&self.target.function, &bound, self.ttl, || (self.f)(args))
            .await
    }
}

// == Update Fn ==
/// Compute-and-overwrite wrapper created by [`CacheController::update`].
pub struct UpdateFn<F> {
    controller: CacheController,
    target: Target,
    ttl: Option<u64>,
    f: F,
}

impl<F> UpdateFn<F> {
    pub(crate) fn new(controller: CacheController, function: String, f: F) -> Self {
        Self {
            controller,
            target: Target {
                function,
                signature: None,
            },
            ttl: None,
            f,
        }
    }

    pub fn with_signature(mut self, signature: Signature) -> Self {
        self.target.signature = Some(signature);
        self
    }

    /// Expiry for written entries; without it they never expire.
    pub fn with_ttl(mut self, ttl: u64) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn function(&self) -> &str {
        &self.target.function
    }

    pub fn key(&self, args: &Args) -> Result<CacheKey> {
        let bound = self.target.bind(args)?;
        self.controller.key_for(&self.target.function, &bound)
    }

    /// Always runs the target and overwrites the stored entry.
    pub async fn call<T, E, Fut>(&self, args: Args) -> std::result::Result<bool, E>
    where
        F: Fn(Args) -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        T: Cacheable,
        E: From<CacheError>,
    {
        let bound = self.target.bind(&args)?;
        self.controller
            .compute_and_store(&self.target.function, &bound, self.ttl, || (self.f)(args))
            .await
    }
}

// == Delete Fn ==
/// Compute-then-delete wrapper created by [`CacheController::delete`].
pub struct DeleteFn<F> {
    controller: CacheController,
    target: Target,
    f: F,
}

impl<F> DeleteFn<F> {
    pub(crate) fn new(controller: CacheController, function: String, f: F) -> Self {
        Self {
            controller,
            target: Target {
                function,
                signature: None,
            },
            f,
        }
    }

    pub fn with_signature(mut self, signature: Signature) -> Self {
        self.target.signature = Some(signature);
        self
    }

    pub fn function(&self) -> &str {
        &self.target.function
    }

    pub fn key(&self, args: &Args) -> Result<CacheKey> {
        let bound = self.target.bind(args)?;
        self.controller.key_for(&self.target.function, &bound)
    }

    /// Runs the target, then deletes the entry. Returns whether it existed.
    pub async fn call<T, E, Fut>(&self, args: Args) -> std::result::Result<bool, E>
    where
        F: Fn(Args) -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: From<CacheError>,
    {
        let bound = self.target.bind(&args)?;
        self.controller
            .compute_and_delete(&self.target.function, &bound, || (self.f)(args))
            .await
    }
}
