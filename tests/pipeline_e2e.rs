// tests/pipeline_e2e.rs
// End-to-end: raw items → filter → enrich (quota) → record, including the
// always-failing summarizer and a dead upstream.

use ai_news_digest::ai_adapter::{
    Provider, Summarize, Summarizer, SummaryFailure, SummaryResult, SUMMARY_FAILED,
};
use ai_news_digest::analyze::{Enricher, Pacing};
use ai_news_digest::ingest::providers::hn_api::HnApiProvider;
use ai_news_digest::ingest::types::{RawItem, SourceProvider};
use ai_news_digest::record::read_record;
use ai_news_digest::relevance::KeywordFilter;
use ai_news_digest::{OverflowPolicy, Pipeline};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct Tracking {
    seen: Mutex<Vec<String>>,
}

#[async_trait]
impl Summarize for Tracking {
    async fn summarize(&self, title: &str, url: &str) -> SummaryResult {
        self.seen.lock().unwrap().push(url.to_string());
        SummaryResult {
            localized_title: format!("翻訳: {title}"),
            summary: format!("{title} の要約"),
        }
    }
}

struct AlwaysDown;

#[async_trait]
impl Provider for AlwaysDown {
    async fn complete(&self, _prompt: &str) -> Result<String, SummaryFailure> {
        Err(SummaryFailure::Transport("dns error".into()))
    }
    fn name(&self) -> &'static str {
        "down"
    }
}

struct BrokenSource;

#[async_trait]
impl SourceProvider for BrokenSource {
    async fn fetch_latest(&self) -> Result<Vec<RawItem>> {
        Err(anyhow!("upstream 503"))
    }
    fn name(&self) -> &'static str {
        "broken"
    }
}

fn scenario_items() -> Vec<RawItem> {
    vec![
        RawItem::new("New GPT model released", "u1"),
        RawItem::new("Recipe for bread", "u2"),
        RawItem::new("LLM benchmark results", "u3"),
    ]
}

fn filter() -> KeywordFilter {
    KeywordFilter::new(["gpt", "llm"]).unwrap()
}

#[tokio::test]
async fn relevant_items_are_enriched_in_order() {
    let pipeline = Pipeline::new(
        filter(),
        Enricher::new(Tracking::default(), Pacing::none()),
        2,
        OverflowPolicy::Drop,
    );
    let record = pipeline.run(scenario_items()).await;

    assert_eq!(record.items.len(), 2);
    assert_eq!(record.items[0].item.url, "u1");
    assert_eq!(record.items[1].item.url, "u3");
    assert_eq!(record.items[0].localized_title, "翻訳: New GPT model released");
    assert!(record.items.iter().all(|i| !i.summary.is_empty()));
    assert_eq!(
        *pipeline.enricher().summarizer().seen.lock().unwrap(),
        vec!["u1", "u3"]
    );
    assert!(!record.generated_at.is_empty());
}

#[tokio::test]
async fn failing_summarizer_still_produces_full_record() {
    let summarizer = Summarizer::new(Arc::new(AlwaysDown), Duration::from_secs(30), "Japanese");
    let pipeline = Pipeline::new(
        filter(),
        Enricher::new(summarizer, Pacing::none()),
        2,
        OverflowPolicy::Drop,
    );
    let record = pipeline.run(scenario_items()).await;

    assert_eq!(record.items.len(), 2);
    for it in &record.items {
        assert_eq!(it.summary, SUMMARY_FAILED);
        assert!(it.localized_title.contains(&it.item.title));
    }
}

#[tokio::test]
async fn dead_upstream_writes_empty_record() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ai_news.json");
    let pipeline = Pipeline::new(
        filter(),
        Enricher::new(Tracking::default(), Pacing::none()),
        5,
        OverflowPolicy::Drop,
    );
    let sources: Vec<Box<dyn SourceProvider>> = vec![Box::new(BrokenSource)];

    let record = pipeline.run_and_write(&sources, &path).await.unwrap();
    assert!(record.items.is_empty());

    let on_disk = read_record(&path).unwrap();
    assert_eq!(on_disk, record);
    assert!(pipeline.enricher().summarizer().seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn fixture_source_flows_into_written_record() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ai_news.json");
    let fixture = include_str!("fixtures/hn_items.json");
    let sources: Vec<Box<dyn SourceProvider>> = vec![
        Box::new(BrokenSource),
        Box::new(HnApiProvider::from_fixture(fixture, 100)),
    ];
    let pipeline = Pipeline::new(
        KeywordFilter::new(["gpt", "llm", "reinforcement learning"]).unwrap(),
        Enricher::new(Tracking::default(), Pacing::none()),
        2,
        OverflowPolicy::PassThrough,
    );

    let record = pipeline.run_and_write(&sources, &path).await.unwrap();
    let titles: Vec<_> = record.items.iter().map(|i| i.item.title.as_str()).collect();
    assert_eq!(
        titles,
        vec![
            "OpenAI releases a new GPT model",
            "LLM benchmark results for Q3",
            "Ask HN: Weekend projects?",
        ]
    );
    assert_eq!(record.items[2].summary, ai_news_digest::pipeline::NOT_SUMMARIZED);

    let json = std::fs::read_to_string(&path).unwrap();
    assert!(json.trim_start().starts_with("{\n  \"generated_at\""));
    assert!(!json.contains("\"body\""));
}
