//! Synthetic ranking suite: seeded random feeds checked against the filter's
//! invariants (window, keyword presence, ordering, stability, bonus bounds).

use chrono::{DateTime, Duration, TimeZone, Utc};
use feed_digest::relevance::{filter_and_score_at, prepare_keywords, recency_bonus};
use feed_digest::{FeedItem, ScoredItem};
use rand::{rngs::StdRng, seq::IndexedRandom, Rng, SeedableRng};

const KEYWORDS: [&str; 4] = ["AI", "LLM", "audio", "robotics"];
const FILLER: [&str; 8] = [
    "market", "update", "weekly", "report", "notes", "launch", "sports", "weather",
];

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 10, 12, 0, 0).unwrap()
}

fn synth_items(rng: &mut StdRng, n: usize) -> Vec<FeedItem> {
    (0..n)
        .map(|i| {
            let mut words: Vec<&str> = (0..rng.random_range(2..6))
                .map(|_| *FILLER.choose(rng).unwrap())
                .collect();
            if rng.random_bool(0.6) {
                words.push(*KEYWORDS.choose(rng).unwrap());
            }
            let published_at = if rng.random_bool(0.1) {
                None
            } else {
                // -2h .. +40h old, in minutes
                Some(now() - Duration::minutes(rng.random_range(-120..40 * 60)))
            };
            FeedItem {
                title: format!("{} #{i}", words.join(" ")),
                link: format!("https://synthetic.example/{i}"),
                published_at,
                content: if rng.random_bool(0.3) {
                    KEYWORDS.choose(rng).unwrap().to_uppercase()
                } else {
                    String::new()
                },
                source: "Synthetic".to_string(),
            }
        })
        .collect()
}

fn check_invariants(items: &[FeedItem], out: &[ScoredItem], window: u32) {
    let kw = prepare_keywords(&KEYWORDS);
    for s in out {
        let published = s.item.published_at.expect("undated item survived");
        let age = now() - published;
        assert!(age >= Duration::zero(), "future item survived: {}", s.item.title);
        assert!(age <= Duration::hours(i64::from(window)), "stale item survived: {}", s.item.title);
        let text = s.item.match_text().to_lowercase();
        assert!(kw.iter().any(|k| text.contains(k.as_str())), "no keyword in {}", s.item.title);
        assert!(!s.matched_keywords.is_empty());
        let bonus = s.relevance_score - s.matched_keywords.len() as f64;
        assert!((0.0..=1.0).contains(&bonus), "bonus out of range: {bonus}");
    }
    for pair in out.windows(2) {
        assert!(pair[0].relevance_score >= pair[1].relevance_score);
    }
    // stability: equal scores appear in input order
    let pos = |link: &str| items.iter().position(|i| i.link == link).unwrap();
    for pair in out.windows(2) {
        if pair[0].relevance_score == pair[1].relevance_score {
            assert!(pos(&pair[0].item.link) < pos(&pair[1].item.link));
        }
    }
}

#[test]
fn seeded_feeds_respect_invariants() {
    for seed in 0..20u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let items = synth_items(&mut rng, 120);
        for window in [24u32, 6, 48] {
            let out = filter_and_score_at(items.clone(), &KEYWORDS, window, now());
            check_invariants(&items, &out, window);
            let again = filter_and_score_at(items.clone(), &KEYWORDS, window, now());
            assert_eq!(out, again, "not idempotent for seed {seed}");
        }
    }
}

#[test]
fn bonus_never_increases_with_age() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..500 {
        let window = rng.random_range(1..72u32);
        let a = rng.random_range(0.0..100.0f64);
        let b = a + rng.random_range(0.0..10.0f64);
        assert!(recency_bonus(a, window) >= recency_bonus(b, window));
    }
}
