//! Demo that runs one digest over bundled fixture feeds with the canned mock
//! provider and writes only the HTML page (no network, no email/SMS).

use anyhow::{Context, Result};
use chrono::{TimeZone, Utc};
use std::path::PathBuf;

use feed_digest::analyze::MockProvider;
use feed_digest::ingest::rss::FixtureFeed;
use feed_digest::notify::PageWriter;
use feed_digest::{run_digest_with, DigestConfig, FeedSource, NotifierMux, RunDeps};

const TECH_RSS: &str = include_str!("../../tests/fixtures/tech_rss.xml");
const ATOM_FEED: &str = include_str!("../../tests/fixtures/atom_feed.xml");

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let out_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("public/demo"));

    let cfg: DigestConfig = serde_json::from_value(serde_json::json!({
        "feeds": [
            { "url": "fixture://tech", "label": "Tech Wire" },
            { "url": "fixture://research", "label": "Research Log" }
        ],
        "keywords": ["AI", "LLM"],
        "output": { "web_dir": out_dir, "title": "AI Daily Digest (demo)" }
    }))
    .context("demo config")?;

    let sources: Vec<Box<dyn FeedSource>> = vec![
        Box::new(FixtureFeed::new("Tech Wire", TECH_RSS)),
        Box::new(FixtureFeed::new("Research Log", ATOM_FEED)),
    ];
    let provider = MockProvider::canned();
    let mux = NotifierMux::new().with_sink(PageWriter::new(cfg.output.web_dir.clone()));

    // Fixture dates are fixed; pin the clock to match them.
    let now = Utc
        .with_ymd_and_hms(2025, 6, 10, 12, 0, 0)
        .single()
        .context("demo clock")?;

    let summary = run_digest_with(
        &cfg,
        now,
        RunDeps {
            sources: &sources,
            provider: Some(&provider),
            mux: &mux,
        },
    )
    .await?;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    println!("render-demo done");
    Ok(())
}
