use crate::config::BatchConfig;
use crate::traits::GenerationClassifier;
use crate::types::{CandidateArticle, ClassifiedArticle, PipelineError, Result};
use futures::stream::{self, StreamExt};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};

/// What to do when every candidate in a non-empty batch fails classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmptyBatchPolicy {
    /// Fail with `BatchExhausted`.
    #[default]
    Fail,
    /// Return an empty batch.
    ReturnEmpty,
}

impl FromStr for EmptyBatchPolicy {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail" => Ok(EmptyBatchPolicy::Fail),
            "empty" | "return-empty" => Ok(EmptyBatchPolicy::ReturnEmpty),
            other => Err(PipelineError::Configuration(format!(
                "EMPTY_BATCH_POLICY must be 'fail' or 'empty', got {}",
                other
            ))),
        }
    }
}

/// Classifies a batch of candidates concurrently, dropping individual failures.
pub struct BatchProcessor {
    classifier: Arc<dyn GenerationClassifier>,
    config: BatchConfig,
}

impl BatchProcessor {
    pub fn new(classifier: Arc<dyn GenerationClassifier>, config: BatchConfig) -> Self {
        Self { classifier, config }
    }

    pub fn policy(&self) -> EmptyBatchPolicy {
        self.config.empty_policy
    }

    /// Results come back in completion order, not input order.
    pub async fn process_all(&self, candidates: Vec<CandidateArticle>) -> Result<Vec<ClassifiedArticle>> {
        let attempted = candidates.len();
        if attempted == 0 {
            return Ok(Vec::new());
        }

        info!(
            "Classifying {} candidates with {}",
            attempted,
            self.classifier.classifier_name()
        );

        let classifier = &self.classifier;
        let classified: Vec<ClassifiedArticle> = stream::iter(candidates)
            .map(|candidate| async move {
                match classifier.classify(&candidate).await {
                    Ok(relevance) => Some(ClassifiedArticle::new(candidate, relevance)),
                    Err(e) => {
                        warn!("Dropping {:?} after classification failure: {}", candidate.title, e);
                        None
                    }
                }
            })
            .buffer_unordered(self.config.max_concurrency.max(1))
            .filter_map(|result| async move { result })
            .collect()
            .await;

        info!("Classified {}/{} candidates", classified.len(), attempted);

        if classified.is_empty() && self.config.empty_policy == EmptyBatchPolicy::Fail {
            return Err(PipelineError::BatchExhausted { attempted });
        }
        Ok(classified)
    }
}
