// src/ingest/types.rs
use anyhow::Result;
use chrono::{DateTime, Utc};

/// One entry pulled from a feed, normalized to plain text.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    /// `None` when the feed gave no (parseable) date; the relevance filter drops these.
    pub published_at: Option<DateTime<Utc>>,
    pub content: String,
    pub source: String, // channel title, or the feed URL
}

impl FeedItem {
    /// Text the keyword matcher runs against: `title + " " + content`.
    pub fn match_text(&self) -> String {
        format!("{} {}", self.title, self.content)
    }
}

#[async_trait::async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch_items(&self) -> Result<Vec<FeedItem>>;
    fn label(&self) -> &str;
}

/// Per-source result of one fetch pass: item count or failure reason.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct SourceOutcome {
    pub label: String,
    pub result: std::result::Result<usize, String>,
}

impl SourceOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

#[derive(Debug, Clone, Default)]
pub struct FetchReport {
    pub items: Vec<FeedItem>,
    pub outcomes: Vec<SourceOutcome>,
}

impl FetchReport {
    pub fn failed_sources(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_ok()).count()
    }
}
