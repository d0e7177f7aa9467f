//! Digest collector: fetch stories, keep the AI-related ones, summarize up to
//! the quota, and write the record file for `build-site`.

use ai_news_digest::ai_adapter::Summarizer;
use ai_news_digest::config::DigestConfig;
use ai_news_digest::ingest::providers;
use ai_news_digest::pipeline::Pipeline;
use anyhow::Context;
use tracing::info;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    ai_news_digest::init_tracing();

    // Everything fatal happens before the first network call.
    let cfg = DigestConfig::load_default()?;
    let ai = cfg
        .ai
        .clone()
        .resolve()
        .context("AI credential/config is required before the pipeline can start")?;
    info!(
        "AI cfg loaded: provider={}, model={:?}, key_len={}",
        ai.provider,
        ai.model,
        ai.api_key.len()
    );

    let summarizer = Summarizer::from_config(&ai)?;
    let pipeline = Pipeline::from_config(&cfg, summarizer)?;
    let sources = providers::from_config(&cfg.source)?;

    info!(
        quota = cfg.enrich.quota,
        pacing_ms = cfg.enrich.pacing_ms,
        sources = sources.len(),
        "starting digest run"
    );
    let record = pipeline
        .run_and_write(&sources, &cfg.output.record_path)
        .await?;

    info!(
        items = record.items.len(),
        generated_at = %record.generated_at,
        "done"
    );
    Ok(())
}
