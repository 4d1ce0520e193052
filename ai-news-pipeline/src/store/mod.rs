use crate::types::{CacheEntry, Cohort, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub mod memory;
pub mod postgres;

pub use memory::MemoryCacheStore;
pub use postgres::PostgresCacheStore;

/// Append-only row store holding classified batches per cohort.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Append a new entry. Existing entries are never touched.
    async fn insert(&self, entry: &CacheEntry) -> Result<()>;

    /// Newest entry for `generation` created at or after `threshold`.
    /// No matching rows is `Ok(None)`, not an error.
    async fn latest_since(&self, generation: Cohort, threshold: DateTime<Utc>) -> Result<Option<CacheEntry>>;

    /// All entries for `generation`, newest first.
    async fn entries(&self, generation: Cohort) -> Result<Vec<CacheEntry>>;
}
