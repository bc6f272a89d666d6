// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod analyze;
pub mod config;
pub mod digest;
pub mod ingest;
pub mod logging;
pub mod metrics;
pub mod notify;
pub mod relevance;

// ---- Re-exports for stable public API ----
pub use analyze::ai_adapter;
pub use analyze::{enrich_all, EnrichedItem};
pub use config::DigestConfig;
pub use digest::{run_digest, run_digest_with, RunDeps, RunSummary};
pub use ingest::types::{FeedItem, FeedSource};
pub use notify::{DigestContext, DigestSink, NotifierMux};
pub use relevance::{filter_and_score, filter_and_score_at, ScoredItem};
