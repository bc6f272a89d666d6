// src/notify/sms.rs
use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use super::{Delivery, DigestContext, DigestSink};
use crate::analyze::EnrichedItem;
use crate::config::digest::TwilioCfg;

pub const MAX_HEADLINE_CHARS: usize = 90;
pub const MAX_BODY_CHARS: usize = 320;

const TWILIO_API: &str = "https://api.twilio.com/2010-04-01";

/// "{title} ({n} articles)\n\nTop: {headline}{ [💼 N]}\n\n{url}", capped at
/// two SMS segments.
pub fn compose_sms_body(title: &str, items: &[EnrichedItem], page_url: &str) -> String {
    let top = items.first();
    let headline = top
        .map(|e| e.item().title.as_str())
        .filter(|t| !t.trim().is_empty())
        .unwrap_or("Latest AI news");
    let headline = if headline.chars().count() > MAX_HEADLINE_CHARS {
        let cut: String = headline.chars().take(MAX_HEADLINE_CHARS).collect();
        format!("{cut}…")
    } else {
        headline.to_string()
    };
    let score = match top {
        Some(e) if e.viability_score > 0 => format!(" [💼 {}]", e.viability_score),
        _ => String::new(),
    };

    let body = format!(
        "{title} ({} articles)\n\nTop: {headline}{score}\n\n{page_url}",
        items.len()
    );
    if body.chars().count() > MAX_BODY_CHARS {
        let cut: String = body.chars().take(MAX_BODY_CHARS - 3).collect();
        format!("{cut}…")
    } else {
        body
    }
}

/// Twilio Messages API sender.
pub struct SmsSender {
    cfg: TwilioCfg,
    client: Client,
    api_base: String,
}

#[derive(Deserialize)]
struct MessageResponse {
    sid: String,
}

impl SmsSender {
    pub fn new(cfg: TwilioCfg) -> Self {
        Self {
            cfg,
            client: Client::new(),
            api_base: TWILIO_API.to_string(),
        }
    }

    pub fn with_api_base(mut self, url: &str) -> Self {
        self.api_base = url.trim_end_matches('/').to_string();
        self
    }

    pub fn is_configured(&self) -> bool {
        !self.cfg.account_sid.trim().is_empty() && !self.cfg.auth_token.trim().is_empty()
    }

    async fn send(&self, body: &str) -> Result<String> {
        let url = format!(
            "{}/Accounts/{}/Messages.json",
            self.api_base, self.cfg.account_sid
        );
        let form = [
            ("To", self.cfg.to_number.as_str()),
            ("From", self.cfg.from_number.as_str()),
            ("Body", body),
        ];
        let resp = self
            .client
            .post(url)
            .basic_auth(&self.cfg.account_sid, Some(&self.cfg.auth_token))
            .timeout(Duration::from_secs(15))
            .form(&form)
            .send()
            .await
            .context("twilio request")?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(anyhow!("Twilio error ({status}): {text}"));
        }
        let msg: MessageResponse = resp.json().await.context("twilio response body")?;
        Ok(msg.sid)
    }
}

#[async_trait::async_trait]
impl DigestSink for SmsSender {
    fn name(&self) -> &str {
        "sms"
    }

    async fn deliver(&self, ctx: &DigestContext) -> Result<Delivery> {
        if !self.is_configured() {
            return Ok(Delivery::Skipped("Twilio not configured".to_string()));
        }
        let body = compose_sms_body(&self.cfg.title, &ctx.items, &ctx.page_url);
        let sid = self.send(&body).await?;
        Ok(Delivery::Delivered(format!("SMS sent: {sid}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::types::FeedItem;
    use crate::relevance::ScoredItem;

    fn enriched(title: &str, viability: u8) -> EnrichedItem {
        EnrichedItem {
            scored: ScoredItem {
                item: FeedItem {
                    title: title.into(),
                    link: "https://x.example/a".into(),
                    published_at: None,
                    content: String::new(),
                    source: "X".into(),
                },
                relevance_score: 1.0,
                matched_keywords: vec![],
            },
            summary: String::new(),
            viability_score: viability,
            technical_score: 0,
            enriched_by_ai: viability > 0,
        }
    }

    #[test]
    fn body_layout() {
        let items = vec![enriched("New AI model", 72), enriched("Other", 0)];
        let body = compose_sms_body("AI Digest", &items, "https://e.com/2025-06-10");
        assert_eq!(
            body,
            "AI Digest (2 articles)\n\nTop: New AI model [💼 72]\n\nhttps://e.com/2025-06-10"
        );
    }

    #[test]
    fn empty_digest_uses_placeholder_headline() {
        let body = compose_sms_body("AI Digest", &[], "u");
        assert_eq!(body, "AI Digest (0 articles)\n\nTop: Latest AI news\n\nu");
    }

    #[test]
    fn headline_and_body_are_capped() {
        let long = "h".repeat(120);
        let body = compose_sms_body("T", &[enriched(&long, 0)], "u");
        assert!(body.contains(&format!("Top: {}…\n", "h".repeat(90))));

        let url = "x".repeat(400);
        let body = compose_sms_body("T", &[enriched("a", 0)], &url);
        assert_eq!(body.chars().count(), 318);
        assert!(body.ends_with('…'));
    }

    #[tokio::test]
    async fn skipped_without_credentials() {
        let s = SmsSender::new(TwilioCfg::default());
        let ctx = DigestContext {
            slug: "s".into(),
            generated_at: chrono::Utc::now(),
            title: "t".into(),
            page_url: "u".into(),
            items: vec![],
        };
        assert!(matches!(s.deliver(&ctx).await.unwrap(), Delivery::Skipped(_)));
    }
}
