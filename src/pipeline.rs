// src/pipeline.rs
//! Relevance filter → quota-bounded enrichment → record assembly.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::analyze::ai_adapter::Summarize;
use crate::analyze::enrich::{Enricher, Pacing};
use crate::config::DigestConfig;
use crate::ingest::types::{RawItem, SourceProvider};
use crate::record::{assemble, write_record, EnrichedItem, OutputRecord};
use crate::relevance::KeywordFilter;

/// Summary text for relevant items kept past the quota.
pub const NOT_SUMMARIZED: &str = "Not summarized (quota reached).";

/// What happens to relevant items beyond the enrichment quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    #[default]
    Drop,
    /// Keep them, unsummarized, after the enriched items.
    PassThrough,
}

pub struct Pipeline<S: Summarize> {
    filter: KeywordFilter,
    enricher: Enricher<S>,
    quota: usize,
    overflow: OverflowPolicy,
}

impl<S: Summarize> Pipeline<S> {
    pub fn new(
        filter: KeywordFilter,
        enricher: Enricher<S>,
        quota: usize,
        overflow: OverflowPolicy,
    ) -> Self {
        Self {
            filter,
            enricher,
            quota,
            overflow,
        }
    }

    pub fn from_config(cfg: &DigestConfig, summarizer: S) -> Result<Self> {
        Ok(Self::new(
            cfg.keyword_filter()?,
            Enricher::new(summarizer, Pacing::new(cfg.pacing_interval())),
            cfg.enrich.quota,
            cfg.enrich.overflow,
        ))
    }

    pub fn filter(&self) -> &KeywordFilter {
        &self.filter
    }

    pub fn enricher(&self) -> &Enricher<S> {
        &self.enricher
    }

    /// Relevant items only, in input order.
    pub fn select(&self, raw: Vec<RawItem>) -> Vec<RawItem> {
        raw.into_iter()
            .filter(|it| self.filter.is_relevant(&it.title, it.body_str()))
            .collect()
    }

    /// Enrich already-relevant items and assemble the record.
    pub async fn process(&self, mut relevant: Vec<RawItem>) -> OutputRecord {
        let overflow = if relevant.len() > self.quota {
            relevant.split_off(self.quota)
        } else {
            Vec::new()
        };

        let mut items = self.enricher.enrich(relevant, self.quota).await;

        if !overflow.is_empty() {
            match self.overflow {
                OverflowPolicy::Drop => {
                    info!(target: "pipeline", dropped = overflow.len(), "items beyond quota dropped");
                }
                OverflowPolicy::PassThrough => {
                    info!(target: "pipeline", kept = overflow.len(), "items beyond quota passed through");
                    items.extend(overflow.into_iter().map(pass_through));
                }
            }
        }

        assemble(items)
    }

    /// Filter, enrich and assemble from an in-memory item list.
    pub async fn run(&self, raw: Vec<RawItem>) -> OutputRecord {
        let relevant = self.select(raw);
        self.process(relevant).await
    }

    /// Fetch from providers (failures are logged and skipped), then process.
    pub async fn run_from_sources(&self, providers: &[Box<dyn SourceProvider>]) -> OutputRecord {
        let (kept, filtered, dedup) = crate::ingest::run_once(providers, &self.filter).await;
        info!(
            target: "pipeline",
            kept = kept.len(),
            filtered = filtered,
            dedup = dedup,
            "ingest finished"
        );
        self.process(kept).await
    }

    /// Full run ending in a written record file.
    pub async fn run_and_write(
        &self,
        providers: &[Box<dyn SourceProvider>],
        record_path: &Path,
    ) -> Result<OutputRecord> {
        let record = self.run_from_sources(providers).await;
        write_record(record_path, &record)?;
        info!(
            target: "pipeline",
            items = record.items.len(),
            path = %record_path.display(),
            "record written"
        );
        Ok(record)
    }
}

fn pass_through(item: RawItem) -> EnrichedItem {
    let localized_title = if item.title.trim().is_empty() {
        "(untitled)".to_string()
    } else {
        item.title.clone()
    };
    EnrichedItem {
        item,
        localized_title,
        summary: NOT_SUMMARIZED.to_string(),
    }
}
