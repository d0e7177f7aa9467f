// src/ingest/providers/hn_api.rs
//! Hacker News Firebase API: top story ids, then one request per item.

use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::{counter, histogram};
use serde::Deserialize;
use std::time::Duration;

use crate::ingest::normalize_text;
use crate::ingest::types::{RawItem, SourceProvider};

pub const HN_API_BASE: &str = "https://hacker-news.firebaseio.com/v0";

#[derive(Debug, Clone, Deserialize)]
pub struct HnItem {
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub title: Option<String>,
    pub url: Option<String>,
    pub score: Option<u32>,
    pub by: Option<String>,
    pub time: Option<i64>,
    pub descendants: Option<u32>,
    pub text: Option<String>,
}

impl HnItem {
    fn is_story(&self) -> bool {
        self.kind.as_deref() == Some("story")
    }

    fn into_raw(self) -> RawItem {
        RawItem {
            id: Some(self.id),
            title: self.title.unwrap_or_default(),
            url: self.url.unwrap_or_default(),
            score: Some(self.score.unwrap_or(0)),
            author: Some(self.by.unwrap_or_default()),
            time: Some(self.time.unwrap_or(0)),
            descendants: Some(self.descendants.unwrap_or(0)),
            body: self.text.as_deref().map(normalize_text),
        }
    }
}

pub struct HnApiProvider {
    mode: Mode,
    max_stories: usize,
}

enum Mode {
    /// JSON array of items in top-story order.
    Fixture(String),
    Http {
        base_url: String,
        client: reqwest::Client,
    },
}

impl HnApiProvider {
    pub fn from_fixture(json: &str, max_stories: usize) -> Self {
        Self {
            mode: Mode::Fixture(json.to_string()),
            max_stories,
        }
    }

    pub fn from_url(base_url: &str, max_stories: usize, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(super::USER_AGENT)
            .connect_timeout(Duration::from_secs(4))
            .timeout(timeout)
            .build()
            .context("building hn api client")?;
        Ok(Self {
            mode: Mode::Http {
                base_url: base_url.trim_end_matches('/').to_string(),
                client,
            },
            max_stories,
        })
    }

    fn collect_stories(items: impl IntoIterator<Item = HnItem>) -> Vec<RawItem> {
        items
            .into_iter()
            .filter(HnItem::is_story)
            .map(HnItem::into_raw)
            .collect()
    }

    async fn fetch_http(
        &self,
        base_url: &str,
        client: &reqwest::Client,
    ) -> Result<Vec<RawItem>> {
        let ids: Vec<u64> = client
            .get(format!("{base_url}/topstories.json"))
            .send()
            .await
            .context("hn topstories get()")?
            .error_for_status()
            .context("hn topstories non-2xx")?
            .json()
            .await
            .context("hn topstories json")?;

        let ids: Vec<u64> = ids.into_iter().take(self.max_stories).collect();
        let total = ids.len();
        let mut items = Vec::with_capacity(total);

        for (i, id) in ids.into_iter().enumerate() {
            match fetch_item(client, base_url, id).await {
                Ok(Some(item)) => items.push(item),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(error = ?e, story_id = id, "error fetching story");
                    counter!("ingest_provider_errors_total").increment(1);
                }
            }
            if (i + 1) % 10 == 0 {
                tracing::info!(target: "ingest", "processed {}/{} stories", i + 1, total);
            }
        }

        Ok(Self::collect_stories(items))
    }
}

async fn fetch_item(client: &reqwest::Client, base_url: &str, id: u64) -> Result<Option<HnItem>> {
    let item = client
        .get(format!("{base_url}/item/{id}.json"))
        .send()
        .await?
        .error_for_status()?
        .json::<Option<HnItem>>()
        .await?;
    Ok(item)
}

#[async_trait]
impl SourceProvider for HnApiProvider {
    async fn fetch_latest(&self) -> Result<Vec<RawItem>> {
        let t0 = std::time::Instant::now();
        let out = match &self.mode {
            Mode::Fixture(s) => {
                let items: Vec<HnItem> =
                    serde_json::from_str(s).context("parsing hn item fixture")?;
                Self::collect_stories(items.into_iter().take(self.max_stories))
            }
            Mode::Http { base_url, client } => self.fetch_http(base_url, client).await?,
        };
        histogram!("ingest_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "hn_api"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"[
        {"id": 1, "type": "story", "title": "GPT-5 is here", "url": "https://a", "score": 10, "by": "alice", "time": 1700000000, "descendants": 3},
        {"id": 2, "type": "job", "title": "Hiring ML engineers"},
        {"id": 3, "type": "story", "title": "Ask HN: LLM tips?", "text": "<p>What&#x27;s your setup?</p>"}
    ]"#;

    #[tokio::test]
    async fn fixture_keeps_stories_and_fills_defaults() {
        let p = HnApiProvider::from_fixture(FIXTURE, 100);
        let items = p.fetch_latest().await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].author.as_deref(), Some("alice"));
        assert_eq!(items[1].url, "");
        assert_eq!(items[1].score, Some(0));
        assert_eq!(items[1].body.as_deref(), Some("What's your setup?"));
    }

    #[tokio::test]
    async fn max_stories_truncates_before_type_filter() {
        let p = HnApiProvider::from_fixture(FIXTURE, 2);
        let items = p.fetch_latest().await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, Some(1));
    }
}
