// src/relevance.rs
//! Relevance gate: case-insensitive keyword substring matching over title + body.
//!
//! Matching is deliberately naive (no word boundaries), so `"ai"` also hits
//! `"maintain"`. Keep the keyword list specific if that matters.

use anyhow::{bail, Result};
use tracing::debug;

/// Keywords used when the config does not provide any.
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "ai",
    "artificial intelligence",
    "machine learning",
    "ml",
    "deep learning",
    "neural network",
    "gpt",
    "llm",
    "large language model",
    "chatgpt",
    "openai",
    "anthropic",
    "transformer",
    "nlp",
    "computer vision",
    "reinforcement learning",
];

/// Ordered, lowercased keyword set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordFilter {
    keywords: Vec<String>,
}

impl KeywordFilter {
    /// Build a filter from a keyword list. Blank entries are dropped; at least
    /// one keyword must remain.
    pub fn new<I, S>(keywords: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords: Vec<String> = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        if keywords.is_empty() {
            bail!("keyword list must contain at least one non-empty keyword");
        }
        Ok(Self { keywords })
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// True iff any keyword occurs in the lowercased `"{title} {body}"`.
    pub fn is_relevant(&self, title: &str, body: &str) -> bool {
        let haystack = combined_lowercase(title, body);
        self.keywords.iter().any(|k| haystack.contains(k.as_str()))
    }

    /// Keywords that matched, in configured order. Used for debug logging.
    pub fn matched(&self, title: &str, body: &str) -> Vec<&str> {
        let haystack = combined_lowercase(title, body);
        let hits: Vec<&str> = self
            .keywords
            .iter()
            .filter(|k| haystack.contains(k.as_str()))
            .map(String::as_str)
            .collect();
        if !hits.is_empty() {
            debug!(target: "relevance", matched = ?hits, "keyword hit");
        }
        hits
    }
}

impl Default for KeywordFilter {
    fn default() -> Self {
        Self {
            keywords: DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
        }
    }
}

fn combined_lowercase(title: &str, body: &str) -> String {
    format!("{title} {body}").to_lowercase()
}
