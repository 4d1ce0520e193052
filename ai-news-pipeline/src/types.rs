use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// One of the four generational cohorts an article is classified against.
///
/// Serialized as its kebab-case id; parsing (serde and `FromStr`) ignores
/// case and surrounding whitespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", try_from = "String")]
pub enum Cohort {
    GenZ,
    Millennials,
    GenX,
    Boomers,
}

impl Cohort {
    /// All cohorts in the fixed order used by the relevance text.
    pub const ALL: [Cohort; 4] = [Cohort::GenZ, Cohort::Millennials, Cohort::GenX, Cohort::Boomers];

    /// Wire identifier, e.g. `gen-z`.
    pub fn id(&self) -> &'static str {
        match self {
            Cohort::GenZ => "gen-z",
            Cohort::Millennials => "millennials",
            Cohort::GenX => "gen-x",
            Cohort::Boomers => "boomers",
        }
    }

    /// 1-based position of this cohort's line in the relevance text.
    pub fn ordinal(&self) -> usize {
        match self {
            Cohort::GenZ => 1,
            Cohort::Millennials => 2,
            Cohort::GenX => 3,
            Cohort::Boomers => 4,
        }
    }

    /// Name as it appears in the classifier's answer lines.
    pub fn name(&self) -> &'static str {
        match self {
            Cohort::GenZ => "Gen Z",
            Cohort::Millennials => "Millennials",
            Cohort::GenX => "Gen X",
            Cohort::Boomers => "Boomers",
        }
    }

    // Display-only metadata for front ends.
    pub fn label(&self) -> &'static str {
        match self {
            Cohort::GenZ => "Generation Z",
            Cohort::Millennials => "Millennials",
            Cohort::GenX => "Generation X",
            Cohort::Boomers => "Baby Boomers",
        }
    }

    pub fn age_range(&self) -> &'static str {
        match self {
            Cohort::GenZ => "Born 1997-2012",
            Cohort::Millennials => "Born 1981-1996",
            Cohort::GenX => "Born 1965-1980",
            Cohort::Boomers => "Born 1946-1964",
        }
    }
}

impl fmt::Display for Cohort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Cohort {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        Cohort::ALL
            .into_iter()
            .find(|cohort| cohort.id().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| PipelineError::InvalidInput(format!("unknown generation: {}", s)))
    }
}

impl TryFrom<String> for Cohort {
    type Error = PipelineError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

/// A news item that passed the relevance filter but has not been classified yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateArticle {
    pub title: String,
    pub description: String,
    pub url: String,
    pub source: String,
}

/// Per-cohort relevance verdicts returned by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GenerationRelevance {
    pub gen_z: bool,
    pub millennials: bool,
    pub gen_x: bool,
    pub boomers: bool,
}

impl GenerationRelevance {
    pub fn for_cohort(&self, cohort: Cohort) -> bool {
        match cohort {
            Cohort::GenZ => self.gen_z,
            Cohort::Millennials => self.millennials,
            Cohort::GenX => self.gen_x,
            Cohort::Boomers => self.boomers,
        }
    }

    fn set(&mut self, cohort: Cohort, relevant: bool) {
        match cohort {
            Cohort::GenZ => self.gen_z = relevant,
            Cohort::Millennials => self.millennials = relevant,
            Cohort::GenX => self.gen_x = relevant,
            Cohort::Boomers => self.boomers = relevant,
        }
    }

    /// Renders the canonical four-line form, e.g. `1. Gen Z: Yes`.
    pub fn to_relevance_text(&self) -> String {
        Cohort::ALL
            .iter()
            .map(|cohort| {
                let answer = if self.for_cohort(*cohort) { "Yes" } else { "No" };
                format!("{}. {}: {}", cohort.ordinal(), cohort.name(), answer)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Validates the classifier's four-line answer.
    ///
    /// Line `n` must start with ordinal `n` followed by the cohort name and
    /// end in a yes/no token. Case and trailing punctuation are ignored.
    pub fn parse(text: &str) -> Result<Self> {
        let lines: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();

        if lines.len() != Cohort::ALL.len() {
            return Err(PipelineError::Upstream(format!(
                "expected {} relevance lines, got {}",
                Cohort::ALL.len(),
                lines.len()
            )));
        }

        let mut relevance = GenerationRelevance::default();
        for (cohort, line) in Cohort::ALL.iter().zip(lines) {
            let relevant = parse_relevance_line(*cohort, line)?;
            relevance.set(*cohort, relevant);
        }
        Ok(relevance)
    }
}

fn parse_relevance_line(cohort: Cohort, line: &str) -> Result<bool> {
    let malformed = || PipelineError::Upstream(format!("malformed relevance line for {}: {:?}", cohort.name(), line));

    let rest = line
        .strip_prefix(&cohort.ordinal().to_string())
        .map(|rest| rest.trim_start_matches(['.', ')']).trim_start())
        .ok_or_else(malformed)?;

    let name = cohort.name();
    let has_name = rest
        .get(..name.len())
        .map(|prefix| prefix.eq_ignore_ascii_case(name))
        .unwrap_or(false);
    if !has_name {
        return Err(malformed());
    }

    let answer = rest
        .split(|c: char| c.is_whitespace() || c == ':')
        .filter(|token| !token.is_empty())
        .last()
        .map(|token| token.trim_matches(|c: char| !c.is_alphanumeric()).to_ascii_lowercase())
        .ok_or_else(malformed)?;

    match answer.as_str() {
        "yes" => Ok(true),
        "no" => Ok(false),
        _ => Err(malformed()),
    }
}

/// A candidate article with its generation relevance attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedArticle {
    pub title: String,
    pub description: String,
    pub url: String,
    pub source: String,
    /// Canonical four-line relevance text kept for positional consumers.
    pub generation_relevance: String,
    pub relevance: GenerationRelevance,
}

impl ClassifiedArticle {
    pub fn new(article: CandidateArticle, relevance: GenerationRelevance) -> Self {
        Self {
            title: article.title,
            description: article.description,
            url: article.url,
            source: article.source,
            generation_relevance: relevance.to_relevance_text(),
            relevance,
        }
    }

    pub fn is_relevant_to(&self, cohort: Cohort) -> bool {
        self.relevance.for_cohort(cohort)
    }
}

/// One append-only cache row: a classified batch for a cohort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub id: Uuid,
    pub generation: Cohort,
    pub articles: Vec<ClassifiedArticle>,
    pub created_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(generation: Cohort, articles: Vec<ClassifiedArticle>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            generation,
            articles,
            created_at,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Request failed after {attempts} attempts: {last_error}")]
    TransportExhausted { attempts: u32, last_error: String },

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("No results: {0}")]
    EmptyResult(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("All {attempted} candidate articles failed classification")]
    BatchExhausted { attempted: usize },

    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl PipelineError {
    /// Short user-facing message; `Display` carries the detail.
    pub fn summary(&self) -> &'static str {
        match self {
            PipelineError::Configuration(_) | PipelineError::InvalidUrl(_) => "Server is not configured correctly",
            PipelineError::TransportExhausted { .. } => "Upstream service unavailable",
            PipelineError::Upstream(_) => "Upstream service returned an invalid response",
            PipelineError::EmptyResult(_) => "No news articles found",
            PipelineError::InvalidInput(_) => "Invalid request",
            PipelineError::BatchExhausted { .. } => "Failed to classify news articles",
            PipelineError::Storage(_) | PipelineError::Serialization(_) => "Failed to access news cache",
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
