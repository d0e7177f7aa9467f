//! Renders the digest record into `<site_dir>/index.html`.

use ai_news_digest::config::DigestConfig;
use ai_news_digest::site::build_site;

fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    ai_news_digest::init_tracing();

    let cfg = DigestConfig::load_default()?;
    let out = &cfg.output;
    if let Err(e) = build_site(&out.record_path, &out.template_path, &out.site_dir) {
        tracing::error!(error = ?e, "site build failed");
        return Err(e);
    }
    Ok(())
}
