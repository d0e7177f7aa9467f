// src/ingest/providers/hn_html.rs
//! Front-page scrape: title + link from each `titleline` span.

use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::histogram;
use once_cell::sync::OnceCell;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;

use crate::ingest::types::{RawItem, SourceProvider};

pub const HN_FRONT_PAGE: &str = "https://news.ycombinator.com/";

pub struct HnFrontPageProvider {
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http {
        url: String,
        client: reqwest::Client,
    },
}

impl HnFrontPageProvider {
    pub fn from_fixture(html: &str) -> Self {
        Self {
            mode: Mode::Fixture(html.to_string()),
        }
    }

    pub fn from_url(url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(super::USER_AGENT)
            .connect_timeout(Duration::from_secs(4))
            .timeout(timeout)
            .build()
            .context("building hn front page client")?;
        Ok(Self {
            mode: Mode::Http {
                url: url.to_string(),
                client,
            },
        })
    }
}

fn titleline_links() -> &'static Selector {
    static SEL: OnceCell<Selector> = OnceCell::new();
    SEL.get_or_init(|| Selector::parse("span.titleline > a").unwrap())
}

/// Extract `(title, url)` pairs in page order. Site-relative links
/// (`item?id=..`) are made absolute. The story id comes from the enclosing
/// `<tr class="athing" id="..">` row when there is one.
pub fn parse_front_page(html: &str) -> Vec<RawItem> {
    let doc = Html::parse_document(html);

    doc.select(titleline_links())
        .filter_map(|a| {
            let title = collapse_ws(&a.text().collect::<String>());
            if title.is_empty() {
                return None;
            }
            let href = a.value().attr("href").unwrap_or_default();
            let mut item = RawItem::new(title, absolutize(href.trim()));
            item.id = story_id(a);
            Some(item)
        })
        .collect()
}

fn story_id(link: ElementRef<'_>) -> Option<u64> {
    link.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "tr")
        .and_then(|tr| tr.value().attr("id"))
        .and_then(|id| id.trim().parse().ok())
}

fn collapse_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn absolutize(href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") || href.is_empty() {
        href.to_string()
    } else {
        format!("{HN_FRONT_PAGE}{}", href.trim_start_matches('/'))
    }
}

#[async_trait]
impl SourceProvider for HnFrontPageProvider {
    async fn fetch_latest(&self) -> Result<Vec<RawItem>> {
        let t0 = std::time::Instant::now();
        let out = match &self.mode {
            Mode::Fixture(s) => parse_front_page(s),
            Mode::Http { url, client } => {
                let body = client
                    .get(url)
                    .send()
                    .await
                    .context("hn front page get()")?
                    .error_for_status()
                    .context("hn front page non-2xx")?
                    .text()
                    .await
                    .context("hn front page .text()")?;
                parse_front_page(&body)
            }
        };
        histogram!("ingest_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "hn_html"
    }
}
