// src/analyze/prompts.rs
//! System instructions and user prompts for the three enrichment requests.

use crate::ingest::types::FeedItem;

/// Content sent to the model is capped at this many characters.
pub const PROMPT_CONTENT_CHARS: usize = 1000;

pub const SUMMARY_SYSTEM: &str = "You are a technical news analyst specializing in AI, ML, audio/video processing, and emerging technologies.
Generate concise, insightful summaries that capture the key technical points and implications.
Your summaries should be 2-3 sentences maximum and focus on what matters to advanced developers and researchers.";

pub const VIABILITY_SYSTEM: &str = "You are a business analyst evaluating technology opportunities for solo advanced developers.
Rate each article's business viability from 0-100 based on MONETIZATION POTENTIAL.

Consider:
- Realistic revenue opportunity (MRR/ARR) within 12 months
- Market demand and willingness to pay
- Competitive landscape
- Monetization models (SaaS, API, tooling, consulting)

Scoring guide:
- 0-20: No clear monetization path or oversaturated market
- 21-40: Theoretical opportunity but high risk or unclear demand
- 41-60: Moderate opportunity, some validation needed
- 61-80: Strong opportunity with proven demand patterns
- 81-100: Exceptional opportunity with clear path to $5K+ MRR

Return ONLY a number from 0-100, nothing else.";

pub fn technical_system(keywords: &[String]) -> String {
    format!(
        "You are a technical relevance analyst for an expert in AI, ML, audio/video processing, signal processing, and multimodal systems.
Rate each article's technical relevance from 0-100.

Consider:
- Alignment with user's core interests: {}
- Technical depth and novelty
- Practical applicability
- Research vs. product announcements (favor novel research)

Scoring guide:
- 0-20: Tangentially related or marketing fluff
- 21-40: Somewhat relevant but not core interest
- 41-60: Solid match to interests
- 61-80: Highly relevant to core expertise
- 81-100: Breakthrough or directly applicable to current work

Return ONLY a number from 0-100, nothing else.",
        keywords.join(", ")
    )
}

/// First `PROMPT_CONTENT_CHARS` characters of the content, or a placeholder.
pub fn prompt_content(item: &FeedItem) -> String {
    if item.content.trim().is_empty() {
        "No content available".to_string()
    } else {
        item.content.chars().take(PROMPT_CONTENT_CHARS).collect()
    }
}

fn article_block(item: &FeedItem) -> String {
    format!(
        "Title: {}\nContent: {}\nSource: {}",
        item.title,
        prompt_content(item),
        item.source
    )
}

pub fn summary_user(item: &FeedItem) -> String {
    format!(
        "Summarize this article in 2-3 sentences:\n\n{}\n\nFocus on technical details, novel approaches, and practical implications.",
        article_block(item)
    )
}

pub fn viability_user(item: &FeedItem) -> String {
    format!(
        "Rate the business viability of this technology/research:\n\n{}\n\nScore (0-100):",
        article_block(item)
    )
}

pub fn technical_user(item: &FeedItem) -> String {
    format!(
        "Rate the technical relevance:\n\n{}\n\nScore (0-100):",
        article_block(item)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(content: &str) -> FeedItem {
        FeedItem {
            title: "T".into(),
            link: "https://x.example/t".into(),
            published_at: None,
            content: content.into(),
            source: "Src".into(),
        }
    }

    #[test]
    fn content_is_capped_by_chars() {
        let long = "é".repeat(1500);
        assert_eq!(prompt_content(&item(&long)).chars().count(), 1000);
        assert_eq!(prompt_content(&item("  ")), "No content available");
    }

    #[test]
    fn technical_rubric_lists_keywords() {
        let sys = technical_system(&["AI".to_string(), "audio".to_string()]);
        assert!(sys.contains("core interests: AI, audio"));
        assert!(sys.contains("Return ONLY a number"));
        assert!(VIABILITY_SYSTEM.contains("Return ONLY a number"));
    }

    #[test]
    fn user_prompts_carry_source() {
        let p = viability_user(&item("body"));
        assert!(p.contains("Title: T\nContent: body\nSource: Src"));
        assert!(p.ends_with("Score (0-100):"));
    }
}
