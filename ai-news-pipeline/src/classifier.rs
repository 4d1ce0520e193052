use crate::config::{endpoint_url, ClassifierConfig};
use crate::retry::ResilientCaller;
use crate::traits::GenerationClassifier;
use crate::types::{CandidateArticle, GenerationRelevance, PipelineError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;
use url::Url;

const SYSTEM_PROMPT: &str = "You are a technology news analyst. You judge whether news articles \
are about artificial intelligence and which generations they matter to. \
Answer only in the exact format requested.";

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// Builds the per-article user prompt.
pub fn build_prompt(article: &CandidateArticle) -> String {
    format!(
        "Analyze this news article:\n\
         Title: {title}\n\
         Description: {description}\n\n\
         For each generation below, answer whether the article is primarily about AI or AI \
         technology AND relevant to how that generation uses technology. Articles that only \
         mention AI in a finance, stock market or earnings context do not count.\n\n\
         Respond with exactly four lines, \"Yes\" or \"No\" only, in this format:\n\
         1. Gen Z: Yes/No\n\
         2. Millennials: Yes/No\n\
         3. Gen X: Yes/No\n\
         4. Boomers: Yes/No",
        title = article.title,
        description = article.description,
    )
}

/// Chat-completions classifier (OpenAI-compatible API).
pub struct OpenAiClassifier {
    config: ClassifierConfig,
    api_key: String,
    endpoint: Url,
    caller: ResilientCaller,
}

impl fmt::Debug for OpenAiClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiClassifier")
            .field("model", &self.config.model)
            .field("endpoint", &self.endpoint.as_str())
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl OpenAiClassifier {
    pub fn new(config: ClassifierConfig, api_key: impl Into<String>, caller: ResilientCaller) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(PipelineError::Configuration("text-generation API key is missing or blank".to_string()));
        }

        let endpoint = endpoint_url(&config.base_url, "v1/chat/completions")?;

        Ok(Self {
            config,
            api_key,
            endpoint,
            caller,
        })
    }

    fn request_body(&self, article: &CandidateArticle) -> ChatRequest<'_> {
        ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: build_prompt(article),
                },
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        }
    }
}

#[async_trait]
impl GenerationClassifier for OpenAiClassifier {
    fn classifier_name(&self) -> String {
        format!("OpenAI ({})", self.config.model)
    }

    async fn classify(&self, article: &CandidateArticle) -> Result<GenerationRelevance> {
        if article.title.trim().is_empty() || article.description.trim().is_empty() {
            return Err(PipelineError::InvalidInput(format!(
                "article {:?} is missing a title or description",
                article.url
            )));
        }

        let body = self.request_body(article);
        let response = self
            .caller
            .send("classification", |client| {
                client
                    .post(self.endpoint.clone())
                    .bearer_auth(&self.api_key)
                    .json(&body)
            })
            .await?;

        let completion: ChatResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::Upstream(format!("classification response is not valid JSON: {}", e)))?;

        let text = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| PipelineError::Upstream("classification response has no completion text".to_string()))?;

        debug!("Classified {:?}: {:?}", article.title, text);
        GenerationRelevance::parse(&text)
    }
}
