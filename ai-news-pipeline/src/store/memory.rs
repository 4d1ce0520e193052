use super::CacheStore;
use crate::types::{CacheEntry, Cohort, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-process store for tests and local runs without a database.
#[derive(Debug, Clone, Default)]
pub struct MemoryCacheStore {
    entries: Arc<RwLock<Vec<CacheEntry>>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn insert(&self, entry: &CacheEntry) -> Result<()> {
        self.entries.write().await.push(entry.clone());
        Ok(())
    }

    async fn latest_since(&self, generation: Cohort, threshold: DateTime<Utc>) -> Result<Option<CacheEntry>> {
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .filter(|entry| entry.generation == generation && entry.created_at >= threshold)
            .max_by_key(|entry| entry.created_at)
            .cloned())
    }

    async fn entries(&self, generation: Cohort) -> Result<Vec<CacheEntry>> {
        let entries = self.entries.read().await;
        let mut matching: Vec<CacheEntry> = entries
            .iter()
            .filter(|entry| entry.generation == generation)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matching)
    }
}
