// src/ingest/providers/mod.rs
pub mod hn_api;
pub mod hn_html;

use anyhow::Result;
use std::time::Duration;

use crate::config::{SourceKind, SourceSection};
use crate::ingest::types::SourceProvider;

pub(crate) const USER_AGENT: &str = "ai-news-digest/0.1";

/// Build the HTTP-backed providers named in `[source] kinds`, in that order.
pub fn from_config(cfg: &SourceSection) -> Result<Vec<Box<dyn SourceProvider>>> {
    let timeout = Duration::from_secs(cfg.timeout_secs);
    let mut out: Vec<Box<dyn SourceProvider>> = Vec::with_capacity(cfg.kinds.len());
    for kind in &cfg.kinds {
        match kind {
            SourceKind::HnApi => out.push(Box::new(hn_api::HnApiProvider::from_url(
                hn_api::HN_API_BASE,
                cfg.max_stories,
                timeout,
            )?)),
            SourceKind::HnHtml => out.push(Box::new(hn_html::HnFrontPageProvider::from_url(
                hn_html::HN_FRONT_PAGE,
                timeout,
            )?)),
        }
    }
    Ok(out)
}
