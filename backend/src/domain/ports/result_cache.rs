//! Driven port for memoising serialised discovery responses.
//!
//! The cache is best effort: callers treat every error as a miss and fall
//! through to live computation.

use std::time::Duration;

use async_trait::async_trait;

use super::{DiscoveryCacheKey, define_port_error};

define_port_error! {
    /// Errors surfaced by cache adapters.
    pub enum ResultCacheError {
        /// Backend unavailable or poisoned.
        Backend { message: String } => "result cache backend failure: {message}",
    }
}

/// TTL-bounded key/value store for JSON payloads.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResultCache: Send + Sync {
    /// Payload stored under `key` unless absent or expired.
    async fn get(&self, key: &DiscoveryCacheKey) -> Result<Option<String>, ResultCacheError>;

    /// Store `payload` under `key` for `ttl`.
    async fn put(
        &self,
        key: &DiscoveryCacheKey,
        payload: String,
        ttl: Duration,
    ) -> Result<(), ResultCacheError>;
}

/// Fixture cache that never remembers anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureResultCache;

#[async_trait]
impl ResultCache for FixtureResultCache {
    async fn get(&self, _key: &DiscoveryCacheKey) -> Result<Option<String>, ResultCacheError> {
        Ok(None)
    }

    async fn put(
        &self,
        _key: &DiscoveryCacheKey,
        _payload: String,
        _ttl: Duration,
    ) -> Result<(), ResultCacheError> {
        Ok(())
    }
}
