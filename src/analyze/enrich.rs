//! Quota-bounded enrichment: sequential summarizer calls with pacing.

use std::time::{Duration, Instant};

use metrics::{counter, histogram};
use tracing::info;

use crate::analyze::ai_adapter::{Summarize, SummaryOutcome};
use crate::ingest::types::RawItem;
use crate::record::EnrichedItem;

/// Minimum delay enforced between two consecutive summarizer calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    min_interval: Duration,
}

impl Pacing {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

    pub fn new(min_interval: Duration) -> Self {
        Self { min_interval }
    }

    /// No delay at all (tests, local runs against a stub).
    pub fn none() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Block for the interval. Called between calls, regardless of the
    /// previous call's outcome.
    pub async fn wait(&self) {
        if !self.min_interval.is_zero() {
            tokio::time::sleep(self.min_interval).await;
        }
    }
}

impl Default for Pacing {
    fn default() -> Self {
        Self::new(Self::DEFAULT_INTERVAL)
    }
}

pub struct Enricher<S: Summarize> {
    summarizer: S,
    pacing: Pacing,
}

impl<S: Summarize> Enricher<S> {
    pub fn new(summarizer: S, pacing: Pacing) -> Self {
        Self { summarizer, pacing }
    }

    pub fn summarizer(&self) -> &S {
        &self.summarizer
    }

    /// Summarize the first `limit` items, one at a time, in input order.
    /// Items past `limit` are not part of the output.
    pub async fn enrich(&self, items: Vec<RawItem>, limit: usize) -> Vec<EnrichedItem> {
        let selected: Vec<RawItem> = items.into_iter().take(limit).collect();
        let total = selected.len();
        let mut out = Vec::with_capacity(total);

        for (i, item) in selected.into_iter().enumerate() {
            if i > 0 {
                self.pacing.wait().await;
            }
            let t0 = Instant::now();
            let outcome = self
                .summarizer
                .summarize_outcome(&item.title, &item.url)
                .await;
            histogram!("enrich_item_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
            if matches!(outcome, SummaryOutcome::Failure(_)) {
                counter!("enrich_fallback_total").increment(1);
            }
            let result = outcome.into_result(&item.title);
            info!(target: "enrich", "summarized {}/{}: {}", i + 1, total, item.title);
            out.push(EnrichedItem::merge(item, result));
        }

        counter!("enrich_items_total").increment(out.len() as u64);
        out
    }
}
