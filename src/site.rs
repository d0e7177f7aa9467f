// src/site.rs
//! Static page rendering by placeholder substitution.
//!
//! Template syntax:
//! - `{{generated_at}}` (alias `{{last_updated_utc}}`), `{{item_count}}`
//! - `{{#items}}...{{/items}}` repeated per item, with `{{title}}`, `{{url}}`,
//!   `{{localized_title}}`, `{{summary}}`, `{{score}}`, `{{author}}`, `{{comments}}`
//! - `{{#empty}}...{{/empty}}` rendered only when there are no items
//!
//! Every substituted value is HTML-escaped. Unknown placeholders render empty.

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::record::{read_record, EnrichedItem, OutputRecord};

pub const OUTPUT_FILE: &str = "index.html";

/// Block and variable tokens in one alternation, so a single pass substitutes
/// the template and never rescans inserted values.
fn re_token() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?s)\{\{#items\}\}(?P<items>.*?)\{\{/items\}\}|\{\{#empty\}\}(?P<empty>.*?)\{\{/empty\}\}|\{\{\s*(?P<var>[a-z_]+)\s*\}\}",
        )
        .unwrap()
    })
}

fn re_var() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"\{\{\s*([a-z_]+)\s*\}\}").unwrap())
}

fn lookup(vars: &HashMap<&str, String>, name: &str) -> String {
    match vars.get(name) {
        Some(v) => html_escape::encode_double_quoted_attribute(v).to_string(),
        None => {
            tracing::debug!(target: "site", placeholder = name, "unknown placeholder");
            String::new()
        }
    }
}

fn fill(fragment: &str, vars: &HashMap<&str, String>) -> String {
    re_var()
        .replace_all(fragment, |caps: &Captures| lookup(vars, &caps[1]))
        .to_string()
}

fn top_vars(record: &OutputRecord) -> HashMap<&'static str, String> {
    HashMap::from([
        ("generated_at", record.generated_at.clone()),
        ("last_updated_utc", record.generated_at.clone()),
        ("item_count", record.items.len().to_string()),
    ])
}

fn item_vars(it: &EnrichedItem) -> HashMap<&'static str, String> {
    let comments_url = it
        .item
        .id
        .map(|id| format!("https://news.ycombinator.com/item?id={id}"))
        .unwrap_or_default();
    HashMap::from([
        ("title", it.item.title.clone()),
        ("url", it.item.url.clone()),
        ("localized_title", it.localized_title.clone()),
        ("summary", it.summary.clone()),
        (
            "score",
            it.item.score.map(|s| s.to_string()).unwrap_or_default(),
        ),
        ("author", it.item.author.clone().unwrap_or_default()),
        ("comments", comments_url),
    ])
}

/// Render `template` with the record's data. Item blocks see the top-level
/// variables too; item fields win on a name clash.
pub fn render(template: &str, record: &OutputRecord) -> String {
    let top = top_vars(record);

    re_token()
        .replace_all(template, |caps: &Captures| {
            if let Some(body) = caps.name("items") {
                record
                    .items
                    .iter()
                    .map(|it| {
                        let mut vars = top.clone();
                        vars.extend(item_vars(it));
                        fill(body.as_str(), &vars)
                    })
                    .collect::<String>()
            } else if let Some(body) = caps.name("empty") {
                if record.items.is_empty() {
                    fill(body.as_str(), &top)
                } else {
                    String::new()
                }
            } else {
                lookup(&top, &caps["var"])
            }
        })
        .to_string()
}

/// Read the record and template, render, write `<site_dir>/index.html`.
pub fn build_site(record_path: &Path, template_path: &Path, site_dir: &Path) -> Result<PathBuf> {
    tracing::info!(target: "site", path = %record_path.display(), "loading record");
    let record = read_record(record_path)?;

    tracing::info!(target: "site", path = %template_path.display(), "loading template");
    let template = fs::read_to_string(template_path)
        .with_context(|| format!("reading template {}", template_path.display()))?;

    let html = render(&template, &record);

    fs::create_dir_all(site_dir).with_context(|| format!("creating {}", site_dir.display()))?;
    let out = site_dir.join(OUTPUT_FILE);
    fs::write(&out, html).with_context(|| format!("writing {}", out.display()))?;
    tracing::info!(target: "site", path = %out.display(), "site generated");
    Ok(out)
}
