// src/notify/render.rs
//! HTML for the digest page and the email body. Plain string building,
//! every piece of feed text escaped.

use html_escape::{encode_double_quoted_attribute, encode_text};
use sha2::{Digest, Sha256};

use super::DigestContext;
use crate::analyze::EnrichedItem;

/// Badge colour by band: green / blue / orange / gray.
pub fn score_color(score: u8) -> &'static str {
    match score {
        80..=u8::MAX => "#10b981",
        60..=79 => "#3b82f6",
        40..=59 => "#f59e0b",
        _ => "#6b7280",
    }
}

/// Stable short id for an article anchor (first 8 bytes of sha256(link), hex).
pub fn anchor_id(link: &str) -> String {
    let digest = Sha256::digest(link.as_bytes());
    digest[..8].iter().map(|b| format!("{b:02x}")).collect()
}

fn badge(icon: &str, score: u8, style: &str) -> Option<String> {
    (score > 0).then(|| {
        format!(
            r#"<span class="score-badge" style="background:{};{style}">{icon} {score}</span>"#,
            score_color(score)
        )
    })
}

/// Viability + technical badges; empty when both scores are 0.
pub fn badges(e: &EnrichedItem, style: &str) -> String {
    let parts: Vec<String> = [
        badge("💼", e.viability_score, style),
        badge("⚡", e.technical_score, style),
    ]
    .into_iter()
    .flatten()
    .collect();
    if parts.is_empty() {
        String::new()
    } else {
        format!(r#"<div style="margin:0.5rem 0;">{}</div>"#, parts.join(" "))
    }
}

/// "Source · 2025-06-10"
fn byline(e: &EnrichedItem) -> String {
    let item = e.item();
    let mut out = encode_text(&item.source).to_string();
    if let Some(ts) = item.published_at {
        out.push_str(" · ");
        out.push_str(&ts.format("%Y-%m-%d").to_string());
    }
    out
}

fn keyword_line(e: &EnrichedItem) -> String {
    if e.scored.matched_keywords.is_empty() {
        return String::new();
    }
    format!(
        r#"<p class="keywords">{}</p>"#,
        encode_text(&e.scored.matched_keywords.join(" · "))
    )
}

const PAGE_STYLE: &str = "body { background:#0b0c10; color:#e5e5e5; font-family:system-ui; padding:2rem; }
    a { color:#4ea8ff; }
    .score-badge { display:inline-block; color:#fff; padding:2px 10px; border-radius:4px; font-size:0.75rem; margin-right:0.5rem; font-weight:500; }
    .byline { color:#888; font-size:0.85rem; }
    .keywords { color:#666; font-size:0.75rem; }";

pub fn render_page(ctx: &DigestContext) -> String {
    let heading = encode_text(&ctx.heading()).to_string();
    let articles: Vec<String> = ctx
        .items
        .iter()
        .map(|e| {
            let item = e.item();
            format!(
                r#"<article id="a-{id}" style="margin-bottom:1.5rem;">
  <h2><a href="{href}">{title}</a></h2>
  <p class="byline">{byline}</p>
  {badges}
  <p>{summary}</p>
  {keywords}
</article>"#,
                id = anchor_id(&item.link),
                href = encode_double_quoted_attribute(&item.link),
                title = encode_text(&item.title),
                byline = byline(e),
                badges = badges(e, ""),
                summary = encode_text(&e.summary),
                keywords = keyword_line(e),
            )
        })
        .collect();

    let body = if articles.is_empty() {
        "<p>No matching articles today.</p>".to_string()
    } else {
        articles.join("\n")
    };

    format!(
        r#"<!doctype html>
<html>
<head>
  <meta charset="utf-8">
  <title>{heading}</title>
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <style>
    {PAGE_STYLE}
  </style>
</head>
<body>
  <h1>{heading}</h1>
{body}
</body>
</html>
"#
    )
}

pub fn render_email(ctx: &DigestContext) -> String {
    let heading = encode_text(&ctx.heading()).to_string();
    let rows: Vec<String> = ctx
        .items
        .iter()
        .map(|e| {
            let item = e.item();
            format!(
                r#"<tr>
  <td style="padding:12px 0;border-bottom:1px solid #333;">
    <div><a href="{href}" style="color:#4ea8ff;">{title}</a></div>
    <div style="color:#888;font-size:12px;">{byline}</div>
    {badges}
    <div style="font-size:14px;margin-top:4px;">{summary}</div>
  </td>
</tr>"#,
                href = encode_double_quoted_attribute(&item.link),
                title = encode_text(&item.title),
                byline = byline(e),
                badges = badges(e, "color:#fff;padding:2px 8px;border-radius:4px;font-size:11px;"),
                summary = encode_text(&e.summary),
            )
        })
        .collect();

    let url_attr = encode_double_quoted_attribute(&ctx.page_url);
    let url_text = encode_text(&ctx.page_url);
    format!(
        r#"<!doctype html>
<html>
<body style="background:#0b0c10;padding:20px;">
  <table width="600" align="center" style="background:#11141a;padding:20px;border-radius:12px;color:#e5e5e5;font-family:system-ui;">
    <tr><td style="font-weight:bold;font-size:18px;padding-bottom:10px;">{heading}</td></tr>
{rows}
    <tr><td style="color:#777;font-size:12px;padding-top:16px;">View online: <a href="{url_attr}" style="color:#4ea8ff;">{url_text}</a></td></tr>
  </table>
</body>
</html>
"#,
        rows = rows.join("\n"),
    )
}
