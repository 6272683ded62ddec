/// Persistence gateway
///
/// The coordinator only ever asks two things of storage:
/// - has this dedup key been stored?
/// - store this posting, unless the key exists
///
/// Backends:
/// - `RedisStore`: production; one JSON document per key, written
///   with `SET NX` (index update in the same script) so a concurrent
///   duplicate loses harmlessly
/// - `MemoryStore`: demo mode and tests
///
/// The store handle is created once in `main` and shared by `Arc`
/// with everything that needs it.
pub mod memory;
pub mod redis;
pub mod seed;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::schema::NormalizedPosting;

pub use self::memory::MemoryStore;
pub use self::redis::RedisStore;

/// Result of a successful insert call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,

    /// The dedup key was already taken, possibly by a concurrent run
    Duplicate,
}

#[async_trait]
pub trait PostingStore: Send + Sync {
    async fn exists(&self, dedup_key: &str) -> Result<bool, StoreError>;

    /// Insert-if-absent on `posting.dedup_key`. Never overwrites.
    async fn insert(&self, posting: &NormalizedPosting) -> Result<InsertOutcome, StoreError>;

    async fn count(&self) -> Result<usize, StoreError>;
}
