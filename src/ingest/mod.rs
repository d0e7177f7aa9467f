// src/ingest/mod.rs
pub mod providers;
pub mod types;

use crate::ingest::types::{RawItem, SourceProvider};
use crate::relevance::KeywordFilter;
use metrics::{counter, describe_counter, describe_histogram};
use once_cell::sync::OnceCell;
use std::collections::HashSet;

/// One-time metrics registration.
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("ingest_items_total", "Total items returned by providers.");
        describe_counter!("ingest_kept_total", "Relevant items kept after filtering.");
        describe_counter!(
            "ingest_filtered_total",
            "Items dropped as irrelevant or empty."
        );
        describe_counter!("ingest_dedup_total", "Items removed as duplicate URLs.");
        describe_counter!(
            "ingest_provider_errors_total",
            "Provider fetch/parse errors."
        );
        describe_histogram!("ingest_fetch_ms", "Provider fetch time in milliseconds.");
    });
}

/// Normalize title text: decode entities, strip tags, collapse whitespace.
pub fn normalize_text(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();

    out.trim().to_string()
}

/// Normalize titles, drop empty/irrelevant items, then dedup by URL
/// (first occurrence wins). Order is preserved.
/// Returns (kept, filtered_count, dedup_count).
pub fn normalize_filter_dedup(
    raw_items: Vec<RawItem>,
    filter: &KeywordFilter,
) -> (Vec<RawItem>, usize, usize) {
    let mut filtered_out = 0usize;
    let mut dedup_out = 0usize;
    let mut seen_urls: HashSet<String> = HashSet::new();
    let mut keep = Vec::with_capacity(raw_items.len());

    for mut item in raw_items {
        item.title = normalize_text(&item.title);
        if item.title.is_empty() || !filter.is_relevant(&item.title, item.body_str()) {
            filtered_out += 1;
            continue;
        }
        // Text posts without an external link share the empty url; keep them all.
        if !item.url.is_empty() && !seen_urls.insert(item.url.clone()) {
            dedup_out += 1;
            continue;
        }
        tracing::info!(
            target: "ingest",
            title = %item.title,
            matched = ?filter.matched(&item.title, item.body_str()),
            "found AI story"
        );
        keep.push(item);
    }

    (keep, filtered_out, dedup_out)
}

/// Fetch from every provider in order, then normalize, filter and dedup.
/// A failing provider is logged and skipped; the result may be empty.
/// Returns (kept, filtered_count, dedup_count).
pub async fn run_once(
    providers: &[Box<dyn SourceProvider>],
    filter: &KeywordFilter,
) -> (Vec<RawItem>, usize, usize) {
    ensure_metrics_described();

    let mut raw = Vec::new();
    for p in providers {
        match p.fetch_latest().await {
            Ok(mut v) => {
                counter!("ingest_items_total").increment(v.len() as u64);
                raw.append(&mut v);
            }
            Err(e) => {
                tracing::warn!(error = ?e, provider = p.name(), "provider error");
                counter!("ingest_provider_errors_total").increment(1);
            }
        }
    }

    let (kept, filtered_cnt, dedup_cnt) = normalize_filter_dedup(raw, filter);

    counter!("ingest_kept_total").increment(kept.len() as u64);
    counter!("ingest_filtered_total").increment(filtered_cnt as u64);
    counter!("ingest_dedup_total").increment(dedup_cnt as u64);

    (kept, filtered_cnt, dedup_cnt)
}
