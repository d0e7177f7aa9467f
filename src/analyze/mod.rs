//! Analysis stage: summarizer adapter and the quota-bounded enricher built on it.

pub mod ai_adapter;
pub mod enrich;

pub use ai_adapter::{Summarize, SummaryFailure, SummaryOutcome, SummaryResult, Summarizer};
pub use enrich::{Enricher, Pacing};
