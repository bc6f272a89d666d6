// src/ingest/mod.rs
pub mod rss;
pub mod types;

use crate::config::digest::DigestConfig;
use crate::ingest::rss::{build_feed_client, HttpFeed};
use crate::ingest::types::{FeedSource, FetchReport, SourceOutcome};
use futures::future::join_all;
use metrics::{counter, describe_counter, describe_histogram};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up in the exported file).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("feeds_fetched_total", "Feed sources fetched successfully.");
        describe_counter!("feed_errors_total", "Feed fetch/parse errors.");
        describe_counter!("feed_items_total", "Items parsed from feeds.");
        describe_histogram!("feed_parse_ms", "Feed parse time in milliseconds.");
    });
}

/// Normalize text: decode entities, strip tags, collapse whitespace.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags; block-level ones still separate words
    static RE_BLOCK: OnceCell<regex::Regex> = OnceCell::new();
    let re_block = RE_BLOCK.get_or_init(|| {
        regex::Regex::new(r"(?i)</?(p|br|div|li|ul|ol|h[1-6]|tr|td|th|table|blockquote|pre|hr)\b[^>]*>")
            .unwrap()
    });
    out = re_block.replace_all(&out, " ").to_string();
    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[a-z!][^>]*>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    // 3) Normalize “ ” ‘ ’ « » to ASCII quotes
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace
    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();
    out = out.trim().to_string();

    // 5) Length cap: 1500 chars
    if out.chars().count() > 1500 {
        out = out.chars().take(1500).collect();
    }

    out
}

/// Build one HTTP source per configured feed, sharing a single client.
pub fn sources_from_config(cfg: &DigestConfig) -> anyhow::Result<Vec<Box<dyn FeedSource>>> {
    let client = build_feed_client(&cfg.fetch.user_agent, cfg.fetch.timeout_secs)?;
    Ok(cfg
        .feeds
        .iter()
        .map(|f| {
            Box::new(HttpFeed::new(f.url.clone(), f.label.clone(), client.clone()))
                as Box<dyn FeedSource>
        })
        .collect())
}

/// Fetch every source concurrently. A failing source contributes zero items
/// and a failed outcome; it never aborts the pass. Output keeps source order,
/// and feed order within each source.
pub async fn fetch_all(sources: &[Box<dyn FeedSource>]) -> FetchReport {
    ensure_metrics_described();

    let results = join_all(sources.iter().map(|s| async move {
        tracing::info!(source = s.label(), "fetching feed");
        (s.label().to_string(), s.fetch_items().await)
    }))
    .await;

    let mut report = FetchReport::default();
    for (label, res) in results {
        match res {
            Ok(mut items) => {
                tracing::info!(source = %label, items = items.len(), "feed ok");
                counter!("feeds_fetched_total").increment(1);
                report.outcomes.push(SourceOutcome {
                    label,
                    result: Ok(items.len()),
                });
                report.items.append(&mut items);
            }
            Err(e) => {
                tracing::warn!(source = %label, error = ?e, "feed failed");
                counter!("feed_errors_total").increment(1);
                report.outcomes.push(SourceOutcome {
                    label,
                    result: Err(format!("{e:#}")),
                });
            }
        }
    }

    tracing::info!(
        items = report.items.len(),
        failed_sources = report.failed_sources(),
        "fetched feeds"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_text_collapses_ws_and_tags() {
        let s = "  <p>Hello,&nbsp;&nbsp; <b>world</b>!</p>  ";
        let out = normalize_text(s);
        assert_eq!(out, "Hello, world!");
    }

    #[test]
    fn block_tags_keep_words_apart() {
        assert_eq!(normalize_text("<p>first</p><p>second</p>"), "first second");
        assert_eq!(normalize_text("line<br/>break and <i>in</i>line"), "line break and inline");
    }

    #[test]
    fn normalize_keeps_comparison_signs() {
        assert_eq!(normalize_text("latency < 5ms"), "latency < 5ms");
    }

    #[test]
    fn length_cap_applies() {
        let s = "y".repeat(2_000);
        assert_eq!(normalize_text(&s).chars().count(), 1_500);
    }
}
