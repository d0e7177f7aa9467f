// src/record.rs
//! Output record: the single JSON artifact handed to the site builder.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;

use crate::analyze::ai_adapter::SummaryResult;
use crate::ingest::types::RawItem;

/// Fixed, lexically sortable UTC format for `generated_at`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Raw item plus generated fields. Serializes flat, raw fields first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnrichedItem {
    #[serde(flatten)]
    pub item: RawItem,
    pub localized_title: String,
    pub summary: String,
}

impl EnrichedItem {
    pub fn merge(item: RawItem, result: SummaryResult) -> Self {
        Self {
            item,
            localized_title: result.localized_title,
            summary: result.summary,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutputRecord {
    pub generated_at: String,
    pub items: Vec<EnrichedItem>,
}

/// Wrap items with the current UTC time.
pub fn assemble(items: Vec<EnrichedItem>) -> OutputRecord {
    assemble_at(Utc::now(), items)
}

pub fn assemble_at(now: DateTime<Utc>, items: Vec<EnrichedItem>) -> OutputRecord {
    OutputRecord {
        generated_at: now.format(TIMESTAMP_FORMAT).to_string(),
        items,
    }
}

/// Pretty UTF-8 JSON, written to a temp file and renamed into place.
pub fn write_record(path: &Path, record: &OutputRecord) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(record).context("serializing output record")?;
    let tmp = path.with_extension("json.tmp");
    let mut f = fs::File::create(&tmp).with_context(|| format!("creating {}", tmp.display()))?;
    f.write_all(json.as_bytes())?;
    f.write_all(b"\n")?;
    fs::rename(&tmp, path).with_context(|| format!("renaming into {}", path.display()))?;
    Ok(())
}

pub fn read_record(path: &Path) -> Result<OutputRecord> {
    let s = fs::read_to_string(path)
        .with_context(|| format!("reading record from {}", path.display()))?;
    serde_json::from_str(&s).with_context(|| format!("invalid record JSON in {}", path.display()))
}
