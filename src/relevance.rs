// src/relevance.rs
//! Relevance filter & scorer: recency window, case-insensitive keyword
//! containment, and the `matches + recency` ranking score.
//!
//! Score = number of distinct matched keywords + recency bonus, where the
//! bonus is `max(0, window - age_hours) / window` and lies in `[0, 1]`.
//! Keyword breadth therefore always dominates; recency only orders items with
//! the same match count. Ties keep fetch order (stable sort).

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use tracing::info;

use crate::ingest::types::FeedItem;

/// A feed item that passed the filter, with its ranking score.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ScoredItem {
    pub item: FeedItem,
    pub relevance_score: f64,
    /// Distinct configured keywords found in the item, in config order.
    pub matched_keywords: Vec<String>,
}

/// Lowercase, trim, drop blanks and case-insensitive duplicates (order kept).
pub fn prepare_keywords<S: AsRef<str>>(keywords: &[S]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(keywords.len());
    for k in keywords {
        let k = k.as_ref().trim().to_lowercase();
        if !k.is_empty() && !out.contains(&k) {
            out.push(k);
        }
    }
    out
}

/// Keywords (already prepared) that occur as substrings of `text_lower`.
/// Plain containment: "ai" matches "maintain".
pub fn matched_keywords(text_lower: &str, keywords: &[String]) -> Vec<String> {
    keywords
        .iter()
        .filter(|k| text_lower.contains(k.as_str()))
        .cloned()
        .collect()
}

/// `max(0, window - age) / window`; 0 for a zero window.
pub fn recency_bonus(age_hours: f64, window_hours: u32) -> f64 {
    if window_hours == 0 {
        return 0.0;
    }
    let w = f64::from(window_hours);
    ((w - age_hours).max(0.0) / w).clamp(0.0, 1.0)
}

#[derive(Debug, Default, Clone, Copy)]
struct DropCounts {
    undated: usize,
    future: usize,
    stale: usize,
    no_match: usize,
}

/// Filter and rank against the wall clock.
pub fn filter_and_score<S: AsRef<str>>(
    items: Vec<FeedItem>,
    keywords: &[S],
    window_hours: u32,
) -> Vec<ScoredItem> {
    filter_and_score_at(items, keywords, window_hours, Utc::now())
}

/// Filter and rank with an explicit `now`; same inputs give the same output.
pub fn filter_and_score_at<S: AsRef<str>>(
    items: Vec<FeedItem>,
    keywords: &[S],
    window_hours: u32,
    now: DateTime<Utc>,
) -> Vec<ScoredItem> {
    let kw = prepare_keywords(keywords);
    let window = TimeDelta::hours(i64::from(window_hours));
    let total = items.len();
    let mut drops = DropCounts::default();

    let mut out = Vec::new();
    for item in items {
        let Some(published) = item.published_at else {
            drops.undated += 1;
            continue;
        };
        let age = now.signed_duration_since(published);
        if age < TimeDelta::zero() {
            drops.future += 1;
            continue;
        }
        if age > window {
            drops.stale += 1;
            continue;
        }

        let text = item.match_text().to_lowercase();
        let matched = matched_keywords(&text, &kw);
        if matched.is_empty() {
            drops.no_match += 1;
            continue;
        }

        let age_hours = (age.num_seconds() as f64 + f64::from(age.subsec_nanos()) / 1e9) / 3600.0;
        let score = matched.len() as f64 + recency_bonus(age_hours, window_hours);
        out.push(ScoredItem {
            item,
            relevance_score: score,
            matched_keywords: matched,
        });
    }

    // `sort_by` is stable: equal scores keep fetch order.
    out.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));

    info!(
        total,
        kept = out.len(),
        undated = drops.undated,
        future = drops.future,
        stale = drops.stale,
        no_match = drops.no_match,
        window_hours,
        "filtered relevant items"
    );
    out
}
