//! Hand-picked ranking cases with a pinned clock.

use chrono::{DateTime, Duration, TimeZone, Utc};
use feed_digest::relevance::filter_and_score_at;
use feed_digest::FeedItem;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 10, 12, 0, 0).unwrap()
}

fn item(title: &str, content: &str, hours_old: Option<i64>) -> FeedItem {
    FeedItem {
        title: title.to_string(),
        link: format!("https://news.example/{}", title.to_lowercase().replace(' ', "-")),
        published_at: hours_old.map(|h| now() - Duration::hours(h)),
        content: content.to_string(),
        source: "News".to_string(),
    }
}

fn titles(out: &[feed_digest::ScoredItem]) -> Vec<&str> {
    out.iter().map(|s| s.item.title.as_str()).collect()
}

#[test]
fn single_keyword_drops_unrelated() {
    let items = vec![
        item("New AI model", "", Some(1)),
        item("Sports recap", "", Some(2)),
    ];
    let out = filter_and_score_at(items, &["AI"], 24, now());
    assert_eq!(titles(&out), vec!["New AI model"]);
    // 1 match + (24 - 1) / 24
    assert!((out[0].relevance_score - (1.0 + 23.0 / 24.0)).abs() < 1e-9);
}

#[test]
fn same_breadth_younger_first() {
    let items = vec![
        item("Older AI and LLM piece", "", Some(20)),
        item("Fresh AI and LLM piece", "", Some(1)),
    ];
    let out = filter_and_score_at(items, &["ai", "llm"], 24, now());
    assert_eq!(titles(&out), vec!["Fresh AI and LLM piece", "Older AI and LLM piece"]);
    assert!(out.iter().all(|s| s.matched_keywords.len() == 2));
}

#[test]
fn empty_keywords_drop_everything() {
    let items = vec![item("New AI model", "", Some(1))];
    let none: [&str; 0] = [];
    assert!(filter_and_score_at(items, &none, 24, now()).is_empty());
}

#[test]
fn blank_keywords_count_as_empty() {
    let items = vec![item("New AI model", "", Some(1))];
    assert!(filter_and_score_at(items, &["", "  "], 24, now()).is_empty());
}

#[test]
fn empty_input_is_fine() {
    assert!(filter_and_score_at(Vec::new(), &["ai"], 24, now()).is_empty());
}

#[test]
fn equal_scores_keep_fetch_order() {
    let items = vec![
        item("First AI", "", Some(3)),
        item("Second AI", "", Some(3)),
        item("Third AI", "", Some(3)),
    ];
    let out = filter_and_score_at(items, &["ai"], 24, now());
    assert_eq!(titles(&out), vec!["First AI", "Second AI", "Third AI"]);
}

#[test]
fn case_insensitive_and_duplicates_collapse() {
    let items = vec![item("llm roundup", "", Some(2))];
    let out = filter_and_score_at(items, &["LLM", "llm", "Llm"], 24, now());
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].matched_keywords, vec!["llm"]);
    assert!(out[0].relevance_score < 2.0);
}

#[test]
fn same_input_same_output() {
    let mk = || {
        vec![
            item("AI one", "llm", Some(5)),
            item("AI two", "", Some(1)),
            item("nothing", "", Some(1)),
        ]
    };
    let a = filter_and_score_at(mk(), &["ai", "llm"], 24, now());
    let b = filter_and_score_at(mk(), &["ai", "llm"], 24, now());
    assert_eq!(a, b);
}
