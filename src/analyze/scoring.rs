//! Score extraction from free-text model answers, and the non-AI summary.

use once_cell::sync::OnceCell;

use crate::ingest::types::FeedItem;

/// Fallback summaries are cut to this many characters.
pub const FALLBACK_SUMMARY_CHARS: usize = 300;

/// First run of ASCII digits in `text`, clamped to [0,100].
/// No digits gives 0; a run too large for any integer type gives 100.
pub fn parse_score(text: &str) -> u8 {
    static RE_NUM: OnceCell<regex::Regex> = OnceCell::new();
    let re = RE_NUM.get_or_init(|| regex::Regex::new(r"[0-9]+").unwrap());
    let Some(m) = re.find(text) else {
        return 0;
    };
    match m.as_str().parse::<u64>() {
        Ok(n) => n.min(100) as u8,
        // only overflow can fail here
        Err(_) => 100,
    }
}

/// Summary used when no model answer is available.
///
/// Uses the content, or the title when the content is empty. Text of at most
/// `FALLBACK_SUMMARY_CHARS` characters is returned trimmed; longer text is cut
/// at the last whitespace inside the limit and gets a trailing `…`.
pub fn fallback_summary(item: &FeedItem) -> String {
    let text = if item.content.trim().is_empty() {
        item.title.as_str()
    } else {
        item.content.as_str()
    };
    truncate_at_word(text, FALLBACK_SUMMARY_CHARS)
}

pub(crate) fn truncate_at_word(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.trim().to_string();
    }
    let slice: String = text.chars().take(max_chars).collect();
    let cut = match slice.rfind(char::is_whitespace) {
        Some(ix) if ix > 0 => slice[..ix].trim_end(),
        _ => slice.as_str(),
    };
    format!("{cut}…")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(title: &str, content: &str) -> FeedItem {
        FeedItem {
            title: title.into(),
            link: "https://x.example/a".into(),
            published_at: None,
            content: content.into(),
            source: "X".into(),
        }
    }

    #[test]
    fn parse_score_cases() {
        assert_eq!(parse_score("72"), 72);
        assert_eq!(parse_score("Score: 85/100"), 85);
        assert_eq!(parse_score("The score is 150"), 100);
        assert_eq!(parse_score("no idea"), 0);
        // only ASCII digits count
        assert_eq!(parse_score("Score: ８５"), 0);
        assert_eq!(parse_score("٥ out of ten, call it 40"), 40);
        assert_eq!(parse_score(""), 0);
        assert_eq!(parse_score("-5"), 5);
        assert_eq!(parse_score("99999999999999999999999"), 100);
    }

    #[test]
    fn short_text_is_kept_whole() {
        assert_eq!(fallback_summary(&item("T", "  short body  ")), "short body");
        assert_eq!(fallback_summary(&item("Only title", "")), "Only title");
    }

    #[test]
    fn long_text_is_cut_at_word_boundary() {
        let body = "word ".repeat(100);
        let s = fallback_summary(&item("T", &body));
        assert!(s.ends_with('…'));
        let head = s.trim_end_matches('…');
        assert!(head.chars().count() <= 300);
        assert!(head.ends_with("word"));
        assert!(body.starts_with(head));
    }

    #[test]
    fn unbroken_text_is_hard_cut() {
        let body = "x".repeat(400);
        let s = fallback_summary(&item("T", &body));
        assert_eq!(s.chars().count(), 301);
    }
}
