// src/config/mod.rs
//! Static run configuration, loaded once at startup from `config/digest.toml`.

pub mod ai;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::pipeline::OverflowPolicy;
use crate::relevance::{KeywordFilter, DEFAULT_KEYWORDS};

pub use ai::AiConfig;

pub const DEFAULT_DIGEST_CONFIG_PATH: &str = "config/digest.toml";
pub const ENV_DIGEST_CONFIG_PATH: &str = "DIGEST_CONFIG_PATH";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DigestConfig {
    pub filter: FilterSection,
    pub enrich: EnrichSection,
    pub ai: AiConfig,
    pub source: SourceSection,
    pub output: OutputSection,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FilterSection {
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EnrichSection {
    /// Max items sent to the summarizer per run.
    pub quota: usize,
    /// Minimum delay between two summarizer calls.
    pub pacing_ms: u64,
    pub overflow: OverflowPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    HnApi,
    HnHtml,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SourceSection {
    pub kinds: Vec<SourceKind>,
    /// How many top stories the API provider inspects.
    pub max_stories: usize,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    pub record_path: PathBuf,
    pub template_path: PathBuf,
    pub site_dir: PathBuf,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            filter: FilterSection::default(),
            enrich: EnrichSection::default(),
            ai: AiConfig::default(),
            source: SourceSection::default(),
            output: OutputSection::default(),
        }
    }
}

impl Default for FilterSection {
    fn default() -> Self {
        Self {
            keywords: DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
        }
    }
}

impl Default for EnrichSection {
    fn default() -> Self {
        Self {
            quota: 10,
            pacing_ms: 1_000,
            overflow: OverflowPolicy::Drop,
        }
    }
}

impl Default for SourceSection {
    fn default() -> Self {
        Self {
            kinds: vec![SourceKind::HnApi],
            max_stories: 100,
            timeout_secs: 10,
        }
    }
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            record_path: PathBuf::from("ai_news.json"),
            template_path: PathBuf::from("templates/index.html"),
            site_dir: PathBuf::from("dist"),
        }
    }
}

impl DigestConfig {
    /// Parse a TOML file and sanitize values.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading digest config from {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("parsing {}", path.display()))
    }

    /// Load config using env var + fallbacks:
    /// 1) $DIGEST_CONFIG_PATH (must exist)
    /// 2) config/digest.toml
    /// 3) built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_DIGEST_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from(&pb);
            }
            return Err(anyhow!("{ENV_DIGEST_CONFIG_PATH} points to non-existent path"));
        }
        let default_p = PathBuf::from(DEFAULT_DIGEST_CONFIG_PATH);
        if default_p.exists() {
            return Self::load_from(&default_p);
        }
        tracing::info!("no digest config found, using built-in defaults");
        Ok(Self::default())
    }

    pub fn parse(s: &str) -> Result<Self> {
        let cfg: DigestConfig = toml::from_str(s)?;
        Ok(cfg.sanitized())
    }

    fn sanitized(mut self) -> Self {
        if self.source.kinds.is_empty() {
            self.source.kinds = SourceSection::default().kinds;
        }
        if self.source.timeout_secs == 0 {
            self.source.timeout_secs = SourceSection::default().timeout_secs;
        }
        // first mention wins
        let mut seen = HashSet::new();
        self.source.kinds.retain(|k| seen.insert(*k));
        self
    }

    /// Build the relevance filter from `[filter] keywords`.
    pub fn keyword_filter(&self) -> Result<KeywordFilter> {
        KeywordFilter::new(&self.filter.keywords).context("invalid [filter] keywords")
    }

    pub fn pacing_interval(&self) -> Duration {
        Duration::from_millis(self.enrich.pacing_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let cfg = DigestConfig::parse("").unwrap();
        assert_eq!(cfg, DigestConfig::default());
        assert_eq!(cfg.enrich.quota, 10);
        assert_eq!(cfg.pacing_interval(), Duration::from_secs(1));
        assert_eq!(cfg.ai.timeout_secs, 30);
    }

    #[test]
    fn sections_override_defaults() {
        let toml = r#"
[filter]
keywords = ["gpt", "llm"]

[enrich]
quota = 2
pacing_ms = 0
overflow = "pass_through"

[ai]
provider = "openai"
model = "gpt-4o-mini"

[source]
kinds = ["hn_html", "hn_api", "hn_html", "hn_api"]
max_stories = 30
"#;
        let cfg = DigestConfig::parse(toml).unwrap();
        assert_eq!(cfg.filter.keywords, vec!["gpt", "llm"]);
        assert_eq!(cfg.enrich.quota, 2);
        assert_eq!(cfg.enrich.overflow, OverflowPolicy::PassThrough);
        assert_eq!(cfg.ai.provider, "openai");
        assert_eq!(cfg.ai.model.as_deref(), Some("gpt-4o-mini"));
        assert_eq!(cfg.source.kinds, vec![SourceKind::HnHtml, SourceKind::HnApi]);
        assert_eq!(cfg.source.max_stories, 30);
        assert_eq!(cfg.output.record_path, PathBuf::from("ai_news.json"));
    }

    #[test]
    fn blank_keyword_list_is_rejected_at_filter_build() {
        let cfg = DigestConfig::parse("[filter]\nkeywords = [\"\"]").unwrap();
        assert!(cfg.keyword_filter().is_err());
    }

    #[test]
    fn unknown_source_kind_fails_to_parse() {
        assert!(DigestConfig::parse("[source]\nkinds = [\"rss\"]").is_err());
    }
}
