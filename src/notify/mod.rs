// src/notify/mod.rs
//! Output collaborators ("sinks") for a finished digest, and the multiplexer
//! that runs them. A sink failing never stops the others.

pub mod email;
pub mod page;
pub mod podcast;
pub mod render;
pub mod sms;

use anyhow::Result;
use chrono::{DateTime, Utc};
use metrics::counter;
use serde::Serialize;

use crate::analyze::{DynProvider, EnrichedItem};
use crate::config::DigestConfig;

pub use email::EmailSender;
pub use page::PageWriter;
pub use podcast::PodcastGenerator;
pub use sms::SmsSender;

/// Everything a sink needs about one run.
#[derive(Debug, Clone, Serialize)]
pub struct DigestContext {
    pub slug: String,
    pub generated_at: DateTime<Utc>,
    /// Display title, e.g. "AI Daily Digest".
    pub title: String,
    pub page_url: String,
    pub items: Vec<EnrichedItem>,
}

impl DigestContext {
    /// "{title} – {slug}", shared by page heading and email subject.
    pub fn heading(&self) -> String {
        format!("{} – {}", self.title, self.slug)
    }
}

/// What a sink reports when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Delivered(String),
    Skipped(String),
}

#[async_trait::async_trait]
pub trait DigestSink: Send + Sync {
    fn name(&self) -> &str;
    async fn deliver(&self, ctx: &DigestContext) -> Result<Delivery>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "lowercase")]
pub enum DeliveryOutcome {
    Delivered(String),
    Skipped(String),
    Failed(String),
}

impl DeliveryOutcome {
    fn label(&self) -> &'static str {
        match self {
            Self::Delivered(_) => "delivered",
            Self::Skipped(_) => "skipped",
            Self::Failed(_) => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SinkReport {
    pub sink: String,
    pub outcome: DeliveryOutcome,
}

impl SinkReport {
    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, DeliveryOutcome::Failed(_))
    }
}

/// Runs every configured sink in order, isolating failures.
#[derive(Default)]
pub struct NotifierMux {
    sinks: Vec<Box<dyn DigestSink>>,
}

impl NotifierMux {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sink<S: DigestSink + 'static>(mut self, sink: S) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    pub fn push(&mut self, sink: Box<dyn DigestSink>) {
        self.sinks.push(sink);
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Page, email and SMS are always registered (they skip themselves when
    /// unconfigured); the podcast only when enabled.
    pub fn from_config(cfg: &DigestConfig, provider: Option<DynProvider>) -> Self {
        let mut mux = Self::new()
            .with_sink(PageWriter::new(cfg.output.web_dir.clone()))
            .with_sink(EmailSender::new(cfg.smtp.clone(), cfg.email.clone()))
            .with_sink(SmsSender::new(cfg.twilio.clone()));
        if cfg.podcast.enabled {
            mux.push(Box::new(PodcastGenerator::new(cfg.podcast.clone(), provider)));
        }
        mux
    }

    pub async fn dispatch(&self, ctx: &DigestContext) -> Vec<SinkReport> {
        let mut reports = Vec::with_capacity(self.sinks.len());
        for sink in &self.sinks {
            let outcome = match sink.deliver(ctx).await {
                Ok(Delivery::Delivered(detail)) => {
                    tracing::info!(sink = sink.name(), %detail, "digest delivered");
                    DeliveryOutcome::Delivered(detail)
                }
                Ok(Delivery::Skipped(reason)) => {
                    tracing::info!(sink = sink.name(), %reason, "sink skipped");
                    DeliveryOutcome::Skipped(reason)
                }
                Err(e) => {
                    tracing::error!(sink = sink.name(), error = %format!("{e:#}"), "sink failed");
                    DeliveryOutcome::Failed(format!("{e:#}"))
                }
            };
            counter!(
                "sink_deliveries_total",
                "sink" => sink.name().to_string(),
                "outcome" => outcome.label()
            )
            .increment(1);
            reports.push(SinkReport {
                sink: sink.name().to_string(),
                outcome,
            });
        }
        reports
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    struct Fixed(&'static str, Option<Delivery>);

    #[async_trait::async_trait]
    impl DigestSink for Fixed {
        fn name(&self) -> &str {
            self.0
        }
        async fn deliver(&self, _ctx: &DigestContext) -> Result<Delivery> {
            self.1.clone().ok_or_else(|| anyhow!("boom"))
        }
    }

    fn ctx() -> DigestContext {
        DigestContext {
            slug: "2025-06-10".into(),
            generated_at: Utc::now(),
            title: "Digest".into(),
            page_url: "/2025-06-10".into(),
            items: vec![],
        }
    }

    #[tokio::test]
    async fn failure_does_not_block_later_sinks() {
        let mux = NotifierMux::new()
            .with_sink(Fixed("a", None))
            .with_sink(Fixed("b", Some(Delivery::Delivered("ok".into()))))
            .with_sink(Fixed("c", Some(Delivery::Skipped("off".into()))));
        let reports = mux.dispatch(&ctx()).await;
        assert_eq!(reports.len(), 3);
        assert!(reports[0].is_failed());
        assert_eq!(reports[1].outcome, DeliveryOutcome::Delivered("ok".into()));
        assert_eq!(reports[2].outcome, DeliveryOutcome::Skipped("off".into()));
    }

    #[test]
    fn heading_joins_title_and_slug() {
        assert_eq!(ctx().heading(), "Digest – 2025-06-10");
    }
}
