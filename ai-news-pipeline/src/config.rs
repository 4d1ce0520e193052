use crate::processing::EmptyBatchPolicy;
use crate::retry::RetryPolicy;
use crate::types::{PipelineError, Result};
use std::str::FromStr;
use std::time::Duration;
use url::Url;

pub const MAX_LOOKBACK_DAYS: i64 = 3650;
pub const MAX_FRESHNESS_DAYS: i64 = 365;

#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: "AI-News-Pipeline/1.0".to_string(),
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewsSourceConfig {
    pub base_url: String,
    pub language: String,
    pub lookback_days: i64,
    pub page_size: u32,
    pub max_candidates: usize,
}

impl Default for NewsSourceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://newsapi.org".to_string(),
            language: "en".to_string(),
            lookback_days: 7,
            page_size: 30,
            max_candidates: 15,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.1,
            max_tokens: 100,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub max_concurrency: usize,
    pub empty_policy: EmptyBatchPolicy,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 15,
            empty_policy: EmptyBatchPolicy::Fail,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub freshness_window: chrono::Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            freshness_window: chrono::Duration::hours(1),
        }
    }
}

/// Everything the pipeline needs, resolved once at startup.
#[derive(Clone)]
pub struct PipelineConfig {
    pub database_url: String,
    pub news_api_key: String,
    pub openai_api_key: String,
    pub http: HttpConfig,
    pub retry: RetryPolicy,
    pub news: NewsSourceConfig,
    pub classifier: ClassifierConfig,
    pub batch: BatchConfig,
    pub cache: CacheConfig,
}

impl std::fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("database_url", &"<redacted>")
            .field("news_api_key", &"<redacted>")
            .field("openai_api_key", &"<redacted>")
            .field("http", &self.http)
            .field("retry", &self.retry)
            .field("news", &self.news)
            .field("classifier", &self.classifier)
            .field("batch", &self.batch)
            .field("cache", &self.cache)
            .finish()
    }
}

impl PipelineConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// Required credentials must be present and non-blank; optional
    /// overrides fall back to the component defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let database_url = require(get("DATABASE_URL"), "DATABASE_URL")?;
        let news_api_key = require(get("NEWS_API_KEY"), "NEWS_API_KEY")?;
        let openai_api_key = require(get("OPENAI_API_KEY"), "OPENAI_API_KEY")?;

        let mut news = NewsSourceConfig::default();
        if let Some(base_url) = get("NEWS_API_BASE_URL") {
            news.base_url = base_url;
        }
        if let Some(days) = get("NEWS_LOOKBACK_DAYS") {
            news.lookback_days = parse_var("NEWS_LOOKBACK_DAYS", &days)?;
        }
        if let Some(size) = get("NEWS_PAGE_SIZE") {
            news.page_size = parse_var("NEWS_PAGE_SIZE", &size)?;
        }
        if let Some(max) = get("NEWS_MAX_CANDIDATES") {
            news.max_candidates = parse_var("NEWS_MAX_CANDIDATES", &max)?;
        }

        let mut classifier = ClassifierConfig::default();
        if let Some(base_url) = get("OPENAI_BASE_URL") {
            classifier.base_url = base_url;
        }
        if let Some(model) = get("OPENAI_MODEL") {
            classifier.model = model;
        }

        let mut cache = CacheConfig::default();
        if let Some(minutes) = get("CACHE_FRESHNESS_MINUTES") {
            let minutes: i64 = parse_var("CACHE_FRESHNESS_MINUTES", &minutes)?;
            cache.freshness_window = chrono::Duration::try_minutes(minutes).ok_or_else(|| {
                PipelineError::Configuration(format!("CACHE_FRESHNESS_MINUTES is out of range: {}", minutes))
            })?;
        }

        let mut batch = BatchConfig::default();
        if let Some(policy) = get("EMPTY_BATCH_POLICY") {
            batch.empty_policy = policy.parse()?;
        }

        let mut retry = RetryPolicy::default();
        if let Some(attempts) = get("RETRY_MAX_ATTEMPTS") {
            retry.max_attempts = parse_var("RETRY_MAX_ATTEMPTS", &attempts)?;
        }
        if let Some(delay) = get("RETRY_BASE_DELAY_MS") {
            retry.base_delay = Duration::from_millis(parse_var("RETRY_BASE_DELAY_MS", &delay)?);
        }

        let config = Self {
            database_url,
            news_api_key,
            openai_api_key,
            http: HttpConfig::default(),
            retry,
            news,
            classifier,
            batch,
            cache,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.news.base_url)?;
        Url::parse(&self.classifier.base_url)?;

        if self.news.lookback_days <= 0 || self.news.lookback_days > MAX_LOOKBACK_DAYS {
            return Err(PipelineError::Configuration(format!(
                "NEWS_LOOKBACK_DAYS must be between 1 and {}",
                MAX_LOOKBACK_DAYS
            )));
        }
        if self.news.page_size == 0 || self.news.max_candidates == 0 {
            return Err(PipelineError::Configuration(
                "news page size and candidate limit must be positive".to_string(),
            ));
        }
        if self.cache.freshness_window <= chrono::Duration::zero()
            || self.cache.freshness_window > chrono::Duration::days(MAX_FRESHNESS_DAYS)
        {
            return Err(PipelineError::Configuration(format!(
                "cache freshness window must be positive and at most {} days",
                MAX_FRESHNESS_DAYS
            )));
        }
        Ok(())
    }
}

fn require(value: Option<String>, key: &str) -> Result<String> {
    value.ok_or_else(|| PipelineError::Configuration(format!("{} is missing or blank", key)))
}

fn parse_var<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| PipelineError::Configuration(format!("{} has an invalid value: {}", key, value)))
}

/// Resolves `path` under `base`, keeping any path prefix on `base`
/// (`https://proxy.example/newsapi` + `v2/everything`).
pub fn endpoint_url(base: &str, path: &str) -> Result<Url> {
    let mut base = Url::parse(base)?;
    if !base.path().ends_with('/') {
        let prefixed = format!("{}/", base.path());
        base.set_path(&prefixed);
    }
    Ok(base.join(path.trim_start_matches('/'))?)
}
