use crate::cache::CacheGateway;
use crate::classifier::OpenAiClassifier;
use crate::config::PipelineConfig;
use crate::processing::BatchProcessor;
use crate::retry::ResilientCaller;
use crate::sources::NewsApiSource;
use crate::store::CacheStore;
use crate::traits::NewsSource;
use crate::types::{ClassifiedArticle, Cohort, Result};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Where the articles of a successful run came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultOrigin {
    Cache,
    Fresh,
}

#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub articles: Vec<ClassifiedArticle>,
    pub origin: ResultOrigin,
}

/// Step a run was in when it stopped; used for failure logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    CacheCheck,
    Fetch,
    Classify,
    CacheWrite,
}

/// Cache check, then fetch → classify → cache on a miss.
pub struct NewsPipeline {
    source: Arc<dyn NewsSource>,
    processor: BatchProcessor,
    cache: CacheGateway,
}

impl NewsPipeline {
    pub fn new(source: Arc<dyn NewsSource>, processor: BatchProcessor, cache: CacheGateway) -> Self {
        Self {
            source,
            processor,
            cache,
        }
    }

    /// Wires the HTTP-backed source and classifier from `config`.
    /// Credentials are checked here, before any network call.
    pub fn from_config(config: &PipelineConfig, store: Arc<dyn CacheStore>) -> Result<Self> {
        config.validate()?;

        let caller = ResilientCaller::new(&config.http, config.retry.clone())?;
        let source = NewsApiSource::new(config.news.clone(), config.news_api_key.as_str(), caller.clone())?;
        let classifier = OpenAiClassifier::new(config.classifier.clone(), config.openai_api_key.as_str(), caller)?;

        let processor = BatchProcessor::new(Arc::new(classifier), config.batch.clone());
        let cache = CacheGateway::new(store, config.cache.clone());

        Ok(Self::new(Arc::new(source), processor, cache))
    }

    pub async fn run(&self, generation: Cohort) -> Result<PipelineOutcome> {
        info!("Pipeline run for {} started", generation);

        let mut stage = PipelineStage::CacheCheck;
        let result = self.advance(generation, &mut stage).await;

        match &result {
            Ok(outcome) => info!(
                "Pipeline run for {} finished with {} articles ({:?})",
                generation,
                outcome.articles.len(),
                outcome.origin
            ),
            Err(e) => error!("Pipeline run for {} failed during {:?}: {}", generation, stage, e),
        }
        result
    }

    async fn advance(&self, generation: Cohort, stage: &mut PipelineStage) -> Result<PipelineOutcome> {
        if let Some(articles) = self.cache.read(generation).await? {
            info!("Cache hit for {}", generation);
            return Ok(PipelineOutcome {
                articles,
                origin: ResultOrigin::Cache,
            });
        }
        info!("Cache miss for {}, fetching from {}", generation, self.source.source_name());

        *stage = PipelineStage::Fetch;
        let candidates = self.source.fetch_candidates().await?;

        *stage = PipelineStage::Classify;
        let articles = self.processor.process_all(candidates).await?;

        if !articles.is_empty() {
            *stage = PipelineStage::CacheWrite;
            // The batch is still valid for this response even if caching fails.
            if let Err(e) = self.cache.write(generation, &articles).await {
                warn!("Failed to cache {} articles for {}: {}", articles.len(), generation, e);
            }
        }

        Ok(PipelineOutcome {
            articles,
            origin: ResultOrigin::Fresh,
        })
    }
}
