use crate::config::CacheConfig;
use crate::store::CacheStore;
use crate::types::{CacheEntry, ClassifiedArticle, Cohort, PipelineError, Result};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};

/// Freshness-windowed view over an append-only [`CacheStore`].
#[derive(Clone)]
pub struct CacheGateway {
    store: Arc<dyn CacheStore>,
    freshness_window: chrono::Duration,
}

impl CacheGateway {
    pub fn new(store: Arc<dyn CacheStore>, config: CacheConfig) -> Self {
        Self {
            store,
            freshness_window: config.freshness_window,
        }
    }

    pub fn freshness_window(&self) -> chrono::Duration {
        self.freshness_window
    }

    /// Articles from the newest entry inside the freshness window, if any.
    pub async fn read(&self, generation: Cohort) -> Result<Option<Vec<ClassifiedArticle>>> {
        let threshold = Utc::now().checked_sub_signed(self.freshness_window).ok_or_else(|| {
            PipelineError::Configuration(format!("cache freshness window {} is out of range", self.freshness_window))
        })?;
        let entry = self.store.latest_since(generation, threshold).await?;

        match entry {
            Some(entry) => {
                debug!(
                    "Cache entry {} for {} from {} ({} articles)",
                    entry.id,
                    generation,
                    entry.created_at,
                    entry.articles.len()
                );
                Ok(Some(entry.articles))
            }
            None => {
                debug!("No cache entry for {} since {}", generation, threshold);
                Ok(None)
            }
        }
    }

    pub async fn write(&self, generation: Cohort, articles: &[ClassifiedArticle]) -> Result<()> {
        let entry = CacheEntry::new(generation, articles.to_vec(), Utc::now());
        self.store.insert(&entry).await?;
        info!("Cached {} articles for {}", articles.len(), generation);
        Ok(())
    }
}
