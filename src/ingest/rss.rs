// src/ingest/rss.rs
//! RSS 2.0 / RSS 1.0 (RDF) / Atom parsing into [`FeedItem`]s, plus the two
//! [`FeedSource`] implementations: live HTTP feeds and in-memory fixtures.

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use quick_xml::de::from_str;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Deserialize;
use std::time::Duration;
use time::format_description::well_known::{Rfc2822, Rfc3339};
use time::OffsetDateTime;

use crate::ingest::normalize_text;
use crate::ingest::types::{FeedItem, FeedSource};

/* ----------------------------
RSS 2.0
---------------------------- */

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    title: Option<String>,
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    #[serde(rename = "date", alias = "dc:date")]
    dc_date: Option<String>,
    description: Option<String>,
    #[serde(rename = "encoded", alias = "content:encoded")]
    encoded: Option<String>,
}

/* ----------------------------
RSS 1.0 (RDF): items are siblings of <channel>
---------------------------- */

#[derive(Debug, Deserialize)]
struct Rdf {
    channel: Option<RdfChannel>,
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct RdfChannel {
    title: Option<String>,
}

/* ----------------------------
Atom
---------------------------- */

#[derive(Debug, Deserialize)]
struct AtomFeed {
    title: Option<AtomText>,
    #[serde(rename = "entry", default)]
    entry: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    title: Option<AtomText>,
    #[serde(default)]
    link: Vec<AtomLink>,
    published: Option<String>,
    updated: Option<String>,
    summary: Option<AtomText>,
    content: Option<AtomText>,
}

#[derive(Debug, Deserialize)]
struct AtomText {
    #[serde(rename = "$text", default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: String,
    #[serde(rename = "@rel")]
    rel: Option<String>,
}

/* ----------------------------
Dates
---------------------------- */

fn from_offset(dt: OffsetDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(dt.unix_timestamp(), dt.nanosecond())
}

/// RFC 2822 first (RSS `pubDate`), then RFC 3339 (Atom, `dc:date`).
/// Anything else is treated as "no date" rather than defaulted.
pub fn parse_feed_date(ts: &str) -> Option<DateTime<Utc>> {
    let ts = ts.trim();
    if ts.is_empty() {
        return None;
    }
    OffsetDateTime::parse(ts, &Rfc2822)
        .ok()
        .and_then(from_offset)
        .or_else(|| {
            DateTime::parse_from_rfc2822(ts)
                .ok()
                .map(|dt| dt.with_timezone(&Utc))
        })
        .or_else(|| OffsetDateTime::parse(ts, &Rfc3339).ok().and_then(from_offset))
}

/* ----------------------------
Parsing
---------------------------- */

/// Many feeds embed HTML entities that are not valid XML.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", "&#160;")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&hellip;", "...")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}

/// Local name of the first element, lowercased (`rss`, `feed`, `rdf`).
fn root_element(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                return Ok(String::from_utf8_lossy(e.local_name().as_ref()).to_ascii_lowercase())
            }
            Ok(Event::Eof) => bail!("document has no root element"),
            Ok(_) => continue,
            Err(e) => return Err(anyhow!(e).context("reading feed root element")),
        }
    }
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn rss_item(it: Item, source: &str) -> FeedItem {
    let published_at = it
        .pub_date
        .as_deref()
        .and_then(parse_feed_date)
        .or_else(|| it.dc_date.as_deref().and_then(parse_feed_date));
    let raw_content = non_empty(it.description)
        .or_else(|| non_empty(it.encoded))
        .unwrap_or_default();
    FeedItem {
        title: normalize_text(it.title.as_deref().unwrap_or_default()),
        link: it.link.unwrap_or_default().trim().to_string(),
        published_at,
        content: normalize_text(&raw_content),
        source: source.to_string(),
    }
}

fn atom_entry(e: AtomEntry, source: &str) -> FeedItem {
    let link = e
        .link
        .iter()
        .find(|l| l.rel.as_deref().map_or(true, |r| r == "alternate"))
        .or_else(|| e.link.first())
        .map(|l| l.href.trim().to_string())
        .unwrap_or_default();
    let published_at = e
        .published
        .as_deref()
        .and_then(parse_feed_date)
        .or_else(|| e.updated.as_deref().and_then(parse_feed_date));
    let raw_content = non_empty(e.summary.map(|t| t.text))
        .or_else(|| non_empty(e.content.map(|t| t.text)))
        .unwrap_or_default();
    FeedItem {
        title: normalize_text(&e.title.map(|t| t.text).unwrap_or_default()),
        link,
        published_at,
        content: normalize_text(&raw_content),
        source: source.to_string(),
    }
}

fn label_or(title: Option<String>, fallback: &str) -> String {
    non_empty(title.map(|t| normalize_text(&t))).unwrap_or_else(|| fallback.to_string())
}

/// Parse an RSS or Atom document. Items keep document order.
/// `fallback_label` names the source when the feed has no title.
pub fn parse_feed(xml: &str, fallback_label: &str) -> Result<Vec<FeedItem>> {
    let t0 = std::time::Instant::now();
    let xml_clean = scrub_html_entities_for_xml(xml);

    let items = match root_element(&xml_clean)?.as_str() {
        "rss" => {
            let rss: Rss = from_str(&xml_clean).context("parsing rss xml")?;
            let source = label_or(rss.channel.title, fallback_label);
            rss.channel
                .item
                .into_iter()
                .map(|it| rss_item(it, &source))
                .collect::<Vec<_>>()
        }
        "rdf" => {
            let rdf: Rdf = from_str(&xml_clean).context("parsing rdf xml")?;
            let source = label_or(rdf.channel.and_then(|c| c.title), fallback_label);
            rdf.item
                .into_iter()
                .map(|it| rss_item(it, &source))
                .collect()
        }
        "feed" => {
            let feed: AtomFeed = from_str(&xml_clean).context("parsing atom xml")?;
            let source = label_or(feed.title.map(|t| t.text), fallback_label);
            feed.entry
                .into_iter()
                .map(|e| atom_entry(e, &source))
                .collect()
        }
        other => bail!("unsupported feed root element <{other}>"),
    };

    let ms = t0.elapsed().as_secs_f64() * 1_000.0;
    histogram!("feed_parse_ms").record(ms);
    Ok(items)
}

/* ----------------------------
Sources
---------------------------- */

/// Live feed fetched over HTTP.
pub struct HttpFeed {
    url: String,
    label: String,
    client: reqwest::Client,
}

impl HttpFeed {
    /// `label` overrides the channel title as the item source.
    pub fn new(url: impl Into<String>, label: Option<String>, client: reqwest::Client) -> Self {
        let url = url.into();
        Self {
            label: label.unwrap_or_else(|| url.clone()),
            url,
            client,
        }
    }
}

/// Shared client for all feed sources of one run.
pub fn build_feed_client(user_agent: &str, timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(user_agent)
        .connect_timeout(Duration::from_secs(timeout_secs.min(10)))
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .context("building feed http client")
}

#[async_trait]
impl FeedSource for HttpFeed {
    async fn fetch_items(&self) -> Result<Vec<FeedItem>> {
        let body = self
            .client
            .get(&self.url)
            .send()
            .await
            .with_context(|| format!("GET {}", self.url))?
            .error_for_status()
            .with_context(|| format!("GET {}", self.url))?
            .text()
            .await
            .context("reading feed body")?;
        let mut items = parse_feed(&body, &self.url)?;
        if self.label != self.url {
            for it in &mut items {
                it.source = self.label.clone();
            }
        }
        counter!("feed_items_total").increment(items.len() as u64);
        Ok(items)
    }

    fn label(&self) -> &str {
        &self.label
    }
}

/// Feed document held in memory (tests, demo binary).
pub struct FixtureFeed {
    label: String,
    xml: String,
}

impl FixtureFeed {
    pub fn new(label: impl Into<String>, xml: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            xml: xml.into(),
        }
    }
}

#[async_trait]
impl FeedSource for FixtureFeed {
    async fn fetch_items(&self) -> Result<Vec<FeedItem>> {
        let items = parse_feed(&self.xml, &self.label)?;
        counter!("feed_items_total").increment(items.len() as u64);
        Ok(items)
    }

    fn label(&self) -> &str {
        &self.label
    }
}
