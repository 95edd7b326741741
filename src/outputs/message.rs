//! Rendering and chunking of LINE text messages.
//!
//! Two thresholds are in play and both are kept as-is:
//!
//! - [`SINGLE_MESSAGE_LIMIT`] (5000 chars) decides *whether* a rendered
//!   message is split at all;
//! - [`CHUNK_LIMIT`] (4000 chars) bounds each chunk body once it is split.
//!
//! Lengths are counted in `char`s.

use crate::models::EnrichedArticle;
use crate::utils::truncate_chars;
use chrono::NaiveDate;

pub const SINGLE_MESSAGE_LIMIT: usize = 5000;
pub const CHUNK_LIMIT: usize = 4000;

const SEPARATOR_WIDTH: usize = 30;

/// Render an enriched article under `title` (the caller may add a `News i:` prefix).
///
/// ```text
/// 📰 {title}
/// ──────────────────────────────
/// 📝 Summary:
/// {summary}
///
/// 💬 Advanced Phrases & Expressions:
/// 1. {phrase}
/// ...
///
/// 🔗 {url}
/// ```
pub fn render_article(title: &str, article: &EnrichedArticle) -> String {
    let mut message = String::new();
    message.push_str(&format!("📰 {title}\n"));
    message.push_str(&"─".repeat(SEPARATOR_WIDTH));
    message.push('\n');
    message.push_str("📝 Summary:\n");
    message.push_str(&format!("{}\n\n", article.summary()));
    message.push_str("💬 Advanced Phrases & Expressions:\n");
    for (i, phrase) in article.phrases().iter().enumerate() {
        message.push_str(&format!("{}. {phrase}\n", i + 1));
    }
    message.push_str(&format!("\n🔗 {}", article.url()));
    message
}

/// The opening message announcing the day's batch.
pub fn render_intro(count: usize, date: NaiveDate) -> String {
    format!(
        "📚 Daily News Summary - {}\n\n本日は{count}件のニュースをお届けします。\n各ニュースの要約とAdvancedレベルの英語フレーズ・表現をご確認ください。\n",
        date.format("%Y年%m月%d日")
    )
}

/// Marker line placed in front of every chunk after the first.
pub fn continuation_marker(part: usize, total: usize) -> String {
    format!("(continued {part}/{total})\n\n")
}

/// Split `message` on line boundaries into bodies of at most [`CHUNK_LIMIT`] chars.
///
/// Every line is emitted followed by `\n`, so concatenating the bodies yields
/// `message` plus one trailing newline. A line that cannot fit even in an
/// empty chunk is cut at character boundaries.
pub fn split_message(message: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in message.split('\n') {
        let line_len = line.chars().count();
        if current_len + line_len + 1 <= CHUNK_LIMIT {
            current.push_str(line);
            current.push('\n');
            current_len += line_len + 1;
            continue;
        }

        if !current.is_empty() {
            parts.push(std::mem::take(&mut current));
        }

        let mut rest = line;
        let mut rest_len = line_len;
        while rest_len + 1 > CHUNK_LIMIT {
            let head = truncate_chars(rest, CHUNK_LIMIT);
            parts.push(head.to_string());
            rest = &rest[head.len()..];
            rest_len -= CHUNK_LIMIT;
        }
        current.push_str(rest);
        current.push('\n');
        current_len = rest_len + 1;
    }

    if !current.is_empty() {
        parts.push(current);
    }
    parts
}

/// The texts actually pushed for one rendered message.
///
/// Messages up to [`SINGLE_MESSAGE_LIMIT`] chars go out unchanged in a
/// single push. Longer ones are split with [`split_message`], and every
/// chunk after the first is prefixed with a [`continuation_marker`].
pub fn message_chunks(message: &str) -> Vec<String> {
    if message.chars().count() <= SINGLE_MESSAGE_LIMIT {
        return vec![message.to_string()];
    }

    let parts = split_message(message);
    let total = parts.len();
    parts
        .into_iter()
        .enumerate()
        .map(|(i, part)| {
            if i == 0 {
                part
            } else {
                format!("{}{part}", continuation_marker(i + 1, total))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Article;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 6).unwrap()
    }

    fn enriched(summary: &str, phrases: Vec<String>) -> EnrichedArticle {
        let article = Article::new(
            "Tokyo tests flying taxis",
            "https://eikaiwa.dmm.com/app/daily-news/article/9",
            "content",
            date(),
        )
        .unwrap();
        EnrichedArticle::new(article, summary, phrases)
    }

    #[test]
    fn test_render_article_template() {
        let article = enriched(
            "Flying taxis took off.",
            vec!["Take off - 離陸する".to_string(), "Pilot program - 試験運用".to_string()],
        );
        let expected = format!(
            "📰 News 1: Tokyo tests flying taxis\n{}\n📝 Summary:\nFlying taxis took off.\n\n\
             💬 Advanced Phrases & Expressions:\n1. Take off - 離陸する\n2. Pilot program - 試験運用\n\n\
             🔗 https://eikaiwa.dmm.com/app/daily-news/article/9",
            "─".repeat(30)
        );
        assert_eq!(render_article("News 1: Tokyo tests flying taxis", &article), expected);
    }

    #[test]
    fn test_render_intro_mentions_count_and_date() {
        let intro = render_intro(3, date());
        assert!(intro.starts_with("📚 Daily News Summary - 2025年05月06日"));
        assert!(intro.contains("3件"));
    }

    #[test]
    fn test_short_message_is_single_chunk() {
        let message = "a".repeat(SINGLE_MESSAGE_LIMIT);
        let chunks = message_chunks(&message);
        assert_eq!(chunks, vec![message]);
    }

    #[test]
    fn test_message_between_limits_is_not_split() {
        let message = (0..90).map(|_| "x".repeat(50)).collect::<Vec<_>>().join("\n");
        assert!(message.chars().count() > CHUNK_LIMIT);
        assert!(message.chars().count() <= SINGLE_MESSAGE_LIMIT);
        assert_eq!(message_chunks(&message).len(), 1);
    }

    #[test]
    fn test_long_message_chunks_are_bounded_and_reconstruct() {
        let lines: Vec<String> = (0..300).map(|i| format!("{i}. {}", "phrase ".repeat(5))).collect();
        let message = lines.join("\n");
        assert!(message.chars().count() > SINGLE_MESSAGE_LIMIT);

        let chunks = message_chunks(&message);
        let total = chunks.len();
        assert!(total >= 2);

        let mut bodies = String::new();
        for (i, chunk) in chunks.iter().enumerate() {
            let body = if i == 0 {
                chunk.as_str()
            } else {
                let marker = continuation_marker(i + 1, total);
                assert!(chunk.chars().count() <= CHUNK_LIMIT + marker.chars().count());
                chunk.strip_prefix(marker.as_str()).unwrap()
            };
            assert!(body.chars().count() <= CHUNK_LIMIT);
            bodies.push_str(body);
        }
        assert_eq!(bodies, format!("{message}\n"));
        assert_eq!(bodies.lines().collect::<Vec<_>>(), message.lines().collect::<Vec<_>>());
    }

    #[test]
    fn test_chunk_starts_with_line_that_overflowed() {
        let first = "a".repeat(3990);
        let second = "b".repeat(20);
        let message = format!("{first}\n{second}\n{}", "c".repeat(2000));
        let chunks = message_chunks(&message);
        assert_eq!(chunks[0], format!("{first}\n"));
        assert!(chunks[1].starts_with(&format!("{}{second}\n", continuation_marker(2, chunks.len()))));
    }

    #[test]
    fn test_overlong_single_line_is_cut() {
        let summary = "長".repeat(9000);
        let parts = split_message(&summary);
        assert_eq!(parts.len(), 3);
        assert!(parts.iter().all(|p| p.chars().count() <= CHUNK_LIMIT));
        assert_eq!(parts.concat(), format!("{summary}\n"));
    }

    #[test]
    fn test_multibyte_length_counted_in_chars() {
        // 4000 emoji are 16000 bytes but only 4000 chars.
        let message = "🔗".repeat(4000);
        assert_eq!(message_chunks(&message).len(), 1);
    }
}
