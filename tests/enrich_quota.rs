// tests/enrich_quota.rs
// Quota bound, ordering and strict sequencing of summarizer calls.

use ai_news_digest::ai_adapter::{Summarize, SummaryResult};
use ai_news_digest::analyze::{Enricher, Pacing};
use ai_news_digest::ingest::types::RawItem;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Records call order and the max number of calls in flight at once.
#[derive(Default)]
struct Recorder {
    calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

#[async_trait]
impl Summarize for Recorder {
    async fn summarize(&self, title: &str, _url: &str) -> SummaryResult {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(5)).await;
        self.calls.lock().unwrap().push(title.to_string());
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        SummaryResult {
            localized_title: format!("[ja] {title}"),
            summary: format!("summary of {title}"),
        }
    }
}

fn items(n: usize) -> Vec<RawItem> {
    (0..n)
        .map(|i| RawItem::new(format!("story {i}"), format!("https://x/{i}")))
        .collect()
}

#[tokio::test]
async fn limit_zero_returns_nothing_for_non_empty_input() {
    let e = Enricher::new(Recorder::default(), Pacing::none());
    assert!(e.enrich(items(4), 0).await.is_empty());
    assert!(e.summarizer().calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn output_length_is_min_of_limit_and_input() {
    for (limit, len) in [(1, 5), (3, 3), (5, 2), (2, 0)] {
        let e = Enricher::new(Recorder::default(), Pacing::none());
        let out = e.enrich(items(len), limit).await;
        assert_eq!(out.len(), limit.min(len), "limit={limit} len={len}");
        let titles: Vec<_> = out.iter().map(|i| i.item.title.clone()).collect();
        let expected: Vec<_> = (0..limit.min(len)).map(|i| format!("story {i}")).collect();
        assert_eq!(titles, expected);
    }
}

#[tokio::test(start_paused = true)]
async fn calls_are_sequential_and_paced() {
    let e = Enricher::new(Recorder::default(), Pacing::new(Duration::from_millis(1_000)));
    let t0 = tokio::time::Instant::now();
    let out = e.enrich(items(4), 4).await;

    assert_eq!(out.len(), 4);
    assert_eq!(e.summarizer().max_in_flight.load(Ordering::SeqCst), 1);
    assert_eq!(
        *e.summarizer().calls.lock().unwrap(),
        vec!["story 0", "story 1", "story 2", "story 3"]
    );
    // three gaps of 1s plus four 5ms calls
    assert!(t0.elapsed() >= Duration::from_millis(3_020));
}

#[tokio::test]
async fn enriched_items_keep_raw_fields() {
    let mut raw = items(1);
    raw[0].id = Some(7);
    raw[0].score = Some(99);
    let e = Enricher::new(Recorder::default(), Pacing::none());
    let out = e.enrich(raw, 1).await;
    assert_eq!(out[0].item.id, Some(7));
    assert_eq!(out[0].item.score, Some(99));
    assert_eq!(out[0].item.url, "https://x/0");
    assert_eq!(out[0].localized_title, "[ja] story 0");
}
