#![allow(dead_code)]

use ai_news_pipeline::{
    CacheEntry, CacheStore, CandidateArticle, Cohort, GenerationClassifier, GenerationRelevance, NewsSource,
    PipelineError, Result,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Once;

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .try_init()
            .ok();
    });
}

pub const GEN_Z_ONLY: &str = "1. Gen Z: Yes\n2. Millennials: No\n3. Gen X: No\n4. Boomers: No";

pub fn candidate(title: &str) -> CandidateArticle {
    CandidateArticle {
        title: title.to_string(),
        description: format!("{} - new machine learning software for developers", title),
        url: format!("https://example.com/{}", title.to_lowercase().replace(' ', "-")),
        source: "Example News".to_string(),
    }
}

pub fn newsapi_article(title: &str, description: &str) -> serde_json::Value {
    serde_json::json!({
        "source": { "id": null, "name": "Tech Daily" },
        "author": "Staff",
        "title": title,
        "description": description,
        "url": format!("https://techdaily.example/{}", title.to_lowercase().replace(' ', "-")),
        "publishedAt": "2024-05-01T10:00:00Z"
    })
}

pub fn chat_completion(content: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    })
}

/// Classifier double: answers `GEN_Z_ONLY` unless the title is in `failing`.
pub struct StubClassifier {
    failing: HashSet<String>,
    calls: AtomicUsize,
}

impl StubClassifier {
    pub fn new() -> Self {
        Self::failing_on(&[])
    }

    pub fn failing_on(titles: &[&str]) -> Self {
        Self {
            failing: titles.iter().map(|t| t.to_string()).collect(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerationClassifier for StubClassifier {
    fn classifier_name(&self) -> String {
        "stub".to_string()
    }

    async fn classify(&self, article: &CandidateArticle) -> Result<GenerationRelevance> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(&article.title) {
            return Err(PipelineError::Upstream(format!("stub failure for {}", article.title)));
        }
        GenerationRelevance::parse(GEN_Z_ONLY)
    }
}

/// News source double returning a fixed batch, or an error when `fail` is set.
pub struct StubSource {
    candidates: Vec<CandidateArticle>,
    fail: bool,
    calls: AtomicUsize,
}

impl StubSource {
    pub fn new(candidates: Vec<CandidateArticle>) -> Self {
        Self {
            candidates,
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            candidates: Vec::new(),
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NewsSource for StubSource {
    fn source_name(&self) -> String {
        "stub".to_string()
    }

    async fn fetch_candidates(&self) -> Result<Vec<CandidateArticle>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(PipelineError::EmptyResult("stub source has nothing".to_string()));
        }
        Ok(self.candidates.clone())
    }
}

/// Store double whose writes (and optionally reads) always fail.
pub struct FailingStore {
    pub fail_reads: bool,
}

#[async_trait]
impl CacheStore for FailingStore {
    async fn insert(&self, _entry: &CacheEntry) -> Result<()> {
        Err(PipelineError::Storage(sqlx::Error::PoolTimedOut))
    }

    async fn latest_since(&self, _generation: Cohort, _threshold: DateTime<Utc>) -> Result<Option<CacheEntry>> {
        if self.fail_reads {
            return Err(PipelineError::Storage(sqlx::Error::PoolTimedOut));
        }
        Ok(None)
    }

    async fn entries(&self, _generation: Cohort) -> Result<Vec<CacheEntry>> {
        Ok(Vec::new())
    }
}
