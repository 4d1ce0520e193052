//! Keyword relevance filter applied to raw search results before any
//! paid classification happens.

use tracing::debug;

pub const PRIMARY_AI_TERMS: &[&str] = &[
    "artificial intelligence",
    "machine learning",
    "chatgpt",
    "large language model",
    "llm",
    "deep learning",
    "generative ai",
    "neural network",
    "openai",
];

pub const CONTEXT_TERMS: &[&str] = &[
    "technology",
    "tech",
    "software",
    "research",
    "startup",
    "platform",
    "developer",
    "computing",
    "innovation",
    "app",
    "tool",
    "product",
];

/// Why an article was kept or dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterVerdict {
    Accepted,
    MissingFields,
    /// Bare "AI" with no real AI term, e.g. tickers or initials.
    IncidentalAi,
    NoPrimaryTerm,
    NoContextTerm,
}

impl FilterVerdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, FilterVerdict::Accepted)
    }
}

#[derive(Debug, Clone)]
pub struct RelevanceFilter {
    primary_terms: Vec<String>,
    context_terms: Vec<String>,
}

impl Default for RelevanceFilter {
    fn default() -> Self {
        Self::new(PRIMARY_AI_TERMS, CONTEXT_TERMS)
    }
}

impl RelevanceFilter {
    pub fn new(primary_terms: &[&str], context_terms: &[&str]) -> Self {
        Self {
            primary_terms: primary_terms.iter().map(|t| normalize(t)).collect(),
            context_terms: context_terms.iter().map(|t| normalize(t)).collect(),
        }
    }

    pub fn primary_terms(&self) -> &[String] {
        &self.primary_terms
    }

    pub fn evaluate(&self, title: Option<&str>, description: Option<&str>) -> FilterVerdict {
        let (title, description) = match (non_blank(title), non_blank(description)) {
            (Some(t), Some(d)) => (t, d),
            _ => return FilterVerdict::MissingFields,
        };

        let text = format!(" {} ", normalize(&format!("{} {}", title, description)));

        if !contains_any(&text, &self.primary_terms) {
            if text.contains(" ai ") {
                return FilterVerdict::IncidentalAi;
            }
            return FilterVerdict::NoPrimaryTerm;
        }
        if !contains_any(&text, &self.context_terms) {
            return FilterVerdict::NoContextTerm;
        }
        FilterVerdict::Accepted
    }

    pub fn qualifies(&self, title: Option<&str>, description: Option<&str>) -> bool {
        let verdict = self.evaluate(title, description);
        if !verdict.is_accepted() {
            debug!("Filtered out {:?}: {:?}", title.unwrap_or("<untitled>"), verdict);
        }
        verdict.is_accepted()
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Lowercases and collapses everything that is not alphanumeric into
/// single spaces so terms can be matched at word starts.
fn normalize(text: &str) -> String {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

// `text` is space-padded; a term matches when it begins at a word start.
fn contains_any(text: &str, terms: &[String]) -> bool {
    terms.iter().any(|term| text.contains(&format!(" {}", term)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_punctuation() {
        assert_eq!(normalize("ChatGPT-powered, LLMs!"), "chatgpt powered llms");
    }

    #[test]
    fn test_terms_match_at_word_start_only() {
        let filter = RelevanceFilter::default();
        assert!(filter.qualifies(Some("LLMs reshape research"), Some("Labs publish results")));
        // "tool" inside "stool" must not count as context.
        assert_eq!(
            filter.evaluate(Some("Machine learning stool"), Some("A chair story")),
            FilterVerdict::NoContextTerm
        );
    }
}
