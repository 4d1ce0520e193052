use crate::types::{CandidateArticle, GenerationRelevance, Result};
use async_trait::async_trait;

/// A provider of recent, pre-filtered AI news candidates.
#[async_trait]
pub trait NewsSource: Send + Sync {
    /// Human-readable name for logs
    fn source_name(&self) -> String;

    /// Fetch one bounded batch of candidates that passed the relevance filter.
    /// An empty batch means nothing qualified; a provider returning no
    /// results at all is an error.
    async fn fetch_candidates(&self) -> Result<Vec<CandidateArticle>>;
}

/// Labels an article's relevance to each generational cohort.
#[async_trait]
pub trait GenerationClassifier: Send + Sync {
    fn classifier_name(&self) -> String;

    async fn classify(&self, article: &CandidateArticle) -> Result<GenerationRelevance>;
}
