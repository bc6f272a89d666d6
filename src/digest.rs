// src/digest.rs
//! One digest run: fetch → filter/score → truncate → enrich → sinks.

use anyhow::Result;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use metrics::gauge;
use serde::Serialize;
use tracing::{info, warn};

use crate::analyze::{build_provider, enrich_all, CompletionProvider, DynProvider};
use crate::config::DigestConfig;
use crate::ingest::types::{FeedSource, SourceOutcome};
use crate::ingest::{fetch_all, sources_from_config};
use crate::notify::{DigestContext, NotifierMux, SinkReport};
use crate::relevance::filter_and_score_at;

/// `YYYY-MM-DD` of `now` in `tz`.
pub fn date_slug(now: DateTime<Utc>, tz: Tz) -> String {
    now.with_timezone(&tz).format("%Y-%m-%d").to_string()
}

/// `{base_url without trailing '/'}/{slug}`
pub fn page_url(base_url: &str, slug: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), slug)
}

/// First `max` items, order kept.
pub fn select_top<T>(mut items: Vec<T>, max: usize) -> Vec<T> {
    items.truncate(max);
    items
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub slug: String,
    pub fetched: usize,
    pub sources: Vec<SourceOutcome>,
    /// Items that passed the recency/keyword filter.
    pub relevant: usize,
    /// Items handed to the sinks.
    pub published: usize,
    pub enriched_by_ai: usize,
    pub sinks: Vec<SinkReport>,
}

impl RunSummary {
    pub fn failed_sinks(&self) -> usize {
        self.sinks.iter().filter(|r| r.is_failed()).count()
    }
}

/// Explicit collaborators for a run; tests and the demo build these by hand.
pub struct RunDeps<'a> {
    pub sources: &'a [Box<dyn FeedSource>],
    pub provider: Option<&'a dyn CompletionProvider>,
    pub mux: &'a NotifierMux,
}

/// Build the configured collaborators and run.
pub async fn run_digest(cfg: &DigestConfig, now: DateTime<Utc>) -> Result<RunSummary> {
    let sources = sources_from_config(cfg)?;
    let provider: Option<DynProvider> = match cfg.ai.as_ref() {
        Some(ai) => match build_provider(ai) {
            Ok(p) => Some(p),
            Err(e) => {
                warn!(error = %format!("{e:#}"), "AI provider unavailable, continuing without enrichment");
                None
            }
        },
        None => None,
    };
    let mux = NotifierMux::from_config(cfg, provider.clone());
    let deps = RunDeps {
        sources: &sources,
        provider: provider.as_deref(),
        mux: &mux,
    };
    run_digest_with(cfg, now, deps).await
}

pub async fn run_digest_with(cfg: &DigestConfig, now: DateTime<Utc>, deps: RunDeps<'_>) -> Result<RunSummary> {
    let slug = date_slug(now, cfg.tz()?);
    info!(%slug, feeds = deps.sources.len(), "starting digest run");

    let report = fetch_all(deps.sources).await;
    let fetched = report.items.len();
    let sources = report.outcomes;

    let ranked = filter_and_score_at(report.items, &cfg.keywords, cfg.window_hours, now);
    let relevant = ranked.len();
    let top = select_top(ranked, cfg.max_items);

    let items = enrich_all(top, deps.provider, &cfg.keywords, cfg.enrich_top_k()).await;
    let enriched_by_ai = items.iter().filter(|e| e.enriched_by_ai).count();
    gauge!("digest_items").set(items.len() as f64);

    let ctx = DigestContext {
        page_url: page_url(&cfg.output.base_url, &slug),
        slug: slug.clone(),
        generated_at: now,
        title: cfg.output.title.clone(),
        items,
    };
    let sinks = deps.mux.dispatch(&ctx).await;

    let summary = RunSummary {
        slug,
        fetched,
        sources,
        relevant,
        published: ctx.items.len(),
        enriched_by_ai,
        sinks,
    };
    info!(
        slug = %summary.slug,
        fetched = summary.fetched,
        relevant = summary.relevant,
        published = summary.published,
        enriched = summary.enriched_by_ai,
        failed_sinks = summary.failed_sinks(),
        "digest complete"
    );
    Ok(summary)
}
