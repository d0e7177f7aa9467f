// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod analyze;
pub mod config;
pub mod ingest;
pub mod pipeline;
pub mod record;
pub mod relevance;
pub mod site;

// ---- Re-exports for stable public API ----
pub use analyze::ai_adapter;
pub use config::DigestConfig;
pub use pipeline::{OverflowPolicy, Pipeline};
pub use record::{assemble, EnrichedItem, OutputRecord};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Used when `RUST_LOG` is unset: our targets at info, HTTP stack quiet.
pub const DEFAULT_LOG_FILTER: &str = "info,hyper=warn,hyper_util=warn,reqwest=warn,rustls=warn";

/// Compact tracing to stderr. `RUST_LOG` overrides the default filter.
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .try_init();
}
