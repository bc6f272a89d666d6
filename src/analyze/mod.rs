// src/analyze/mod.rs
//! Enrichment pipeline: a summary and two 0-100 scores per ranked item.
//!
//! Every request is fault tolerant on its own. A failed summary falls back to
//! [`scoring::fallback_summary`], a failed score to 0, so a batch always yields
//! one `EnrichedItem` per input item, in input order.

pub mod ai_adapter;
pub mod prompts;
pub mod scoring;

use futures::future::join_all;
use metrics::counter;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::ingest::types::FeedItem;
use crate::relevance::ScoredItem;

pub use ai_adapter::{build_provider, CompletionProvider, DynProvider, MockProvider};
pub use scoring::{fallback_summary, parse_score};

/// Describe enrichment metrics once.
pub fn ensure_metrics_described() {
    use once_cell::sync::OnceCell;
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        metrics::describe_counter!("ai_requests_total", "Completion requests sent to the AI provider.");
        metrics::describe_counter!("ai_failures_total", "Completion requests that failed or came back empty.");
    });
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EnrichedItem {
    pub scored: ScoredItem,
    pub summary: String,
    pub viability_score: u8,
    pub technical_score: u8,
    /// False when the item skipped the model (no provider, or beyond top-K).
    pub enriched_by_ai: bool,
}

impl EnrichedItem {
    /// Degraded record: fallback summary, zero scores.
    pub fn without_ai(scored: ScoredItem) -> Self {
        let summary = fallback_summary(&scored.item);
        Self {
            scored,
            summary,
            viability_score: 0,
            technical_score: 0,
            enriched_by_ai: false,
        }
    }

    pub fn item(&self) -> &FeedItem {
        &self.scored.item
    }
}

fn short_title(item: &FeedItem) -> String {
    item.title.chars().take(50).collect()
}

async fn ask(provider: &dyn CompletionProvider, system: &str, user: &str, what: &str, item: &FeedItem) -> Option<String> {
    counter!("ai_requests_total").increment(1);
    match provider.complete(system, user).await {
        Ok(text) if !text.trim().is_empty() => Some(text),
        Ok(_) => {
            counter!("ai_failures_total").increment(1);
            warn!(title = %short_title(item), request = what, "empty answer from AI provider");
            None
        }
        Err(e) => {
            counter!("ai_failures_total").increment(1);
            warn!(title = %short_title(item), request = what, error = %e, "AI request failed");
            None
        }
    }
}

async fn summarize(provider: &dyn CompletionProvider, item: &FeedItem) -> String {
    match ask(provider, prompts::SUMMARY_SYSTEM, &prompts::summary_user(item), "summary", item).await {
        Some(text) => {
            debug!(title = %short_title(item), "generated summary");
            text.trim().to_string()
        }
        None => fallback_summary(item),
    }
}

async fn score_viability(provider: &dyn CompletionProvider, item: &FeedItem) -> u8 {
    let answer = ask(provider, prompts::VIABILITY_SYSTEM, &prompts::viability_user(item), "viability", item).await;
    let score = answer.as_deref().map(parse_score).unwrap_or(0);
    debug!(title = %short_title(item), score, "business viability");
    score
}

async fn score_technical(provider: &dyn CompletionProvider, item: &FeedItem, keywords: &[String]) -> u8 {
    let system = prompts::technical_system(keywords);
    let answer = ask(provider, &system, &prompts::technical_user(item), "technical", item).await;
    let score = answer.as_deref().map(parse_score).unwrap_or(0);
    debug!(title = %short_title(item), score, "technical relevance");
    score
}

/// Enrich one item: the three requests run concurrently.
pub async fn analyze_item(provider: &dyn CompletionProvider, scored: ScoredItem, keywords: &[String]) -> EnrichedItem {
    let (summary, viability_score, technical_score) = {
        let item = &scored.item;
        tokio::join!(
            summarize(provider, item),
            score_viability(provider, item),
            score_technical(provider, item, keywords),
        )
    };
    EnrichedItem {
        scored,
        summary,
        viability_score,
        technical_score,
        enriched_by_ai: true,
    }
}

/// Enrich the first `top_k` items concurrently; the rest (or all of them,
/// without a provider) get the degraded record. Output order = input order.
pub async fn enrich_all(
    items: Vec<ScoredItem>,
    provider: Option<&dyn CompletionProvider>,
    keywords: &[String],
    top_k: usize,
) -> Vec<EnrichedItem> {
    ensure_metrics_described();
    let Some(provider) = provider else {
        info!(count = items.len(), "AI not configured, using simple summarization");
        return items.into_iter().map(EnrichedItem::without_ai).collect();
    };

    let mut head = items;
    let tail = if head.len() > top_k { head.split_off(top_k) } else { Vec::new() };

    info!(count = head.len(), provider = provider.name(), "analyzing articles with AI");
    let mut out = join_all(head.into_iter().map(|s| analyze_item(provider, s, keywords))).await;
    info!(enriched = out.len(), untouched = tail.len(), "AI analysis complete");

    out.extend(tail.into_iter().map(EnrichedItem::without_ai));
    out
}
