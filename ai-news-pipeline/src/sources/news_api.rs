use crate::config::{endpoint_url, NewsSourceConfig};
use crate::relevance::RelevanceFilter;
use crate::retry::ResilientCaller;
use crate::traits::NewsSource;
use crate::types::{CandidateArticle, PipelineError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};
use url::Url;

const UNKNOWN_SOURCE: &str = "Unknown";

#[derive(Debug, Deserialize)]
struct RawArticle {
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    source: Option<RawSource>,
}

#[derive(Debug, Deserialize)]
struct RawSource {
    name: Option<String>,
}

/// News search adapter for a NewsAPI-compatible `/v2/everything` endpoint.
pub struct NewsApiSource {
    config: NewsSourceConfig,
    api_key: String,
    endpoint: Url,
    caller: ResilientCaller,
    filter: RelevanceFilter,
}

impl NewsApiSource {
    pub fn new(config: NewsSourceConfig, api_key: impl Into<String>, caller: ResilientCaller) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(PipelineError::Configuration("news API key is missing or blank".to_string()));
        }

        let endpoint = endpoint_url(&config.base_url, "v2/everything")?;

        Ok(Self {
            config,
            api_key,
            endpoint,
            caller,
            filter: RelevanceFilter::default(),
        })
    }

    pub fn with_filter(mut self, filter: RelevanceFilter) -> Self {
        self.filter = filter;
        self
    }

    /// OR-joined primary terms, multi-word terms quoted.
    pub fn search_query(&self) -> String {
        self.filter
            .primary_terms()
            .iter()
            .map(|term| if term.contains(' ') { format!("\"{}\"", term) } else { term.clone() })
            .collect::<Vec<_>>()
            .join(" OR ")
    }

    pub fn from_date(&self, now: DateTime<Utc>) -> Result<String> {
        let days = self.config.lookback_days;
        Duration::try_days(days)
            .and_then(|lookback| now.checked_sub_signed(lookback))
            .map(|from| from.format("%Y-%m-%d").to_string())
            .ok_or_else(|| PipelineError::Configuration(format!("news lookback of {} days is out of range", days)))
    }

    fn parse_response(&self, body: Value) -> Result<Vec<CandidateArticle>> {
        let object = body
            .as_object()
            .ok_or_else(|| PipelineError::Upstream("news response is not a JSON object".to_string()))?;

        let status = object.get("status").and_then(Value::as_str).unwrap_or("missing");
        if status != "ok" {
            let message = object
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("news provider returned status {}", status));
            return Err(PipelineError::Upstream(message));
        }

        let raw_articles = object
            .get("articles")
            .and_then(Value::as_array)
            .ok_or_else(|| PipelineError::Upstream("news response has no articles array".to_string()))?;

        if raw_articles.is_empty() {
            return Err(PipelineError::EmptyResult("news provider returned no articles".to_string()));
        }

        let total = raw_articles.len();
        let candidates: Vec<CandidateArticle> = raw_articles
            .iter()
            .filter_map(|item| match serde_json::from_value::<RawArticle>(item.clone()) {
                Ok(raw) => Some(raw),
                Err(e) => {
                    debug!("Skipping malformed news item: {}", e);
                    None
                }
            })
            .filter(|raw| self.filter.qualifies(raw.title.as_deref(), raw.description.as_deref()))
            .filter_map(into_candidate)
            .take(self.config.max_candidates)
            .collect();

        info!("{} of {} news items qualified as AI candidates", candidates.len(), total);
        Ok(candidates)
    }
}

fn into_candidate(raw: RawArticle) -> Option<CandidateArticle> {
    let title = raw.title?.trim().to_string();
    let description = raw.description?.trim().to_string();
    if title.is_empty() || description.is_empty() {
        return None;
    }

    let source = raw
        .source
        .and_then(|s| s.name)
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| UNKNOWN_SOURCE.to_string());

    Some(CandidateArticle {
        title,
        description,
        url: raw.url.unwrap_or_default(),
        source,
    })
}

#[async_trait]
impl NewsSource for NewsApiSource {
    fn source_name(&self) -> String {
        format!("NewsAPI ({})", self.endpoint.host_str().unwrap_or("unknown host"))
    }

    async fn fetch_candidates(&self) -> Result<Vec<CandidateArticle>> {
        let query = self.search_query();
        let from = self.from_date(Utc::now())?;
        let page_size = self.config.page_size.to_string();

        debug!("Searching news since {} with query {}", from, query);

        let response = self
            .caller
            .send("news search", |client| {
                client.get(self.endpoint.clone()).query(&[
                    ("apiKey", self.api_key.as_str()),
                    ("q", query.as_str()),
                    ("language", self.config.language.as_str()),
                    ("pageSize", page_size.as_str()),
                    ("sortBy", "publishedAt"),
                    ("from", from.as_str()),
                ])
            })
            .await?;

        let body: Value = response
            .json()
            .await
            .map_err(|e| PipelineError::Upstream(format!("news response is not valid JSON: {}", e)))?;

        self.parse_response(body)
    }
}
