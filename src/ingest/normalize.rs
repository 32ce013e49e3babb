use chrono::{DateTime, Utc};
use thiserror::Error;

use super::slug::generate_slug;
use crate::feed::RawEntry;
use crate::storage::NewArticle;
use crate::util::{
    collapse_whitespace, parse_http_url, strip_control_chars, strip_html, truncate_chars,
};

/// Longest excerpt stored, in characters.
pub const EXCERPT_MAX_CHARS: usize = 500;

/// Why an entry was turned away. Data quality, never a run failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("entry has no link")]
    MissingLink,
    #[error("entry link is not an http(s) URL: {0}")]
    InvalidLink(String),
    #[error("entry has no title")]
    MissingTitle,
    #[error("entry has no content, snippet or description")]
    MissingContent,
}

/// A validated entry, ready for the dedup gate.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub feed_id: i64,
    pub original_url: String,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub rss_published_at: DateTime<Utc>,
    /// Topic tags carried through for category resolution
    pub tags: Vec<String>,
}

impl Candidate {
    pub fn into_new_article(
        self,
        category_id: Option<i64>,
        is_newsflash: bool,
        fetched_at: DateTime<Utc>,
    ) -> NewArticle {
        NewArticle {
            feed_id: self.feed_id,
            category_id,
            title: self.title,
            slug: self.slug,
            content: self.content,
            excerpt: self.excerpt,
            original_url: self.original_url,
            rss_published_at: self.rss_published_at,
            fetched_at,
            is_newsflash,
        }
    }
}

/// Validate one raw entry and shape it into a [`Candidate`].
///
/// Checks run in order: link, title, then body text. Blank strings count as
/// absent. Entities left in the title (double-escaped feeds) are decoded.
/// An entry without a date is stamped with `now`.
pub fn normalize(
    entry: &RawEntry,
    feed_id: i64,
    now: DateTime<Utc>,
) -> Result<Candidate, Rejection> {
    let link = non_blank(entry.link.as_deref()).ok_or(Rejection::MissingLink)?;
    let url = parse_http_url(link).map_err(|_| Rejection::InvalidLink(link.to_string()))?;

    let title = entry
        .title
        .as_deref()
        .map(|t| {
            let clean = strip_control_chars(t);
            collapse_whitespace(&html_escape::decode_html_entities(&clean))
        })
        .filter(|t| !t.is_empty())
        .ok_or(Rejection::MissingTitle)?;

    let snippet = non_blank(entry.content_snippet.as_deref());
    let description = non_blank(entry.description.as_deref());
    let content = non_blank(entry.content.as_deref())
        .or(snippet)
        .or(description)
        .ok_or(Rejection::MissingContent)?;

    let excerpt = snippet
        .map(str::to_string)
        .or_else(|| description.map(strip_html))
        .filter(|e| !e.is_empty())
        .map(|e| truncate_chars(&e, EXCERPT_MAX_CHARS).into_owned());

    Ok(Candidate {
        feed_id,
        original_url: url.into(),
        slug: generate_slug(&title),
        title,
        content: strip_control_chars(content).into_owned(),
        excerpt,
        rss_published_at: entry.published.unwrap_or(now),
        tags: entry.categories.clone(),
    })
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-06-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn entry() -> RawEntry {
        RawEntry {
            link: Some("https://news.example.com/story".to_string()),
            title: Some("Hello, World! 2024".to_string()),
            content: Some("<p>Full story</p>".to_string()),
            content_snippet: Some("Full story".to_string()),
            description: Some("Teaser".to_string()),
            published: Some(now() - chrono::TimeDelta::hours(1)),
            categories: vec!["Politics".to_string()],
        }
    }

    #[test]
    fn test_normalize_complete_entry() {
        let candidate = normalize(&entry(), 7, now()).unwrap();
        assert_eq!(
            candidate,
            Candidate {
                feed_id: 7,
                original_url: "https://news.example.com/story".to_string(),
                title: "Hello, World! 2024".to_string(),
                slug: "hello-world-2024".to_string(),
                content: "<p>Full story</p>".to_string(),
                excerpt: Some("Full story".to_string()),
                rss_published_at: now() - chrono::TimeDelta::hours(1),
                tags: vec!["Politics".to_string()],
            }
        );
    }

    #[test]
    fn test_missing_link_rejected() {
        let raw = RawEntry {
            title: Some("X".to_string()),
            link: None,
            ..entry()
        };
        assert_eq!(normalize(&raw, 1, now()), Err(Rejection::MissingLink));

        let blank = RawEntry {
            link: Some("   ".to_string()),
            ..entry()
        };
        assert_eq!(normalize(&blank, 1, now()), Err(Rejection::MissingLink));
    }

    #[test]
    fn test_non_http_link_rejected() {
        let raw = RawEntry {
            link: Some("javascript:alert(1)".to_string()),
            ..entry()
        };
        assert!(matches!(
            normalize(&raw, 1, now()),
            Err(Rejection::InvalidLink(_))
        ));
    }

    #[test]
    fn test_missing_title_rejected() {
        let raw = RawEntry {
            title: None,
            ..entry()
        };
        assert_eq!(normalize(&raw, 1, now()), Err(Rejection::MissingTitle));

        let control_only = RawEntry {
            title: Some("\x00\x1b \n".to_string()),
            ..entry()
        };
        assert_eq!(
            normalize(&control_only, 1, now()),
            Err(Rejection::MissingTitle)
        );
    }

    #[test]
    fn test_missing_all_text_rejected() {
        let raw = RawEntry {
            content: None,
            content_snippet: Some(" ".to_string()),
            description: None,
            ..entry()
        };
        assert_eq!(normalize(&raw, 1, now()), Err(Rejection::MissingContent));
    }

    #[test]
    fn test_content_falls_back_to_snippet_then_description() {
        let raw = RawEntry {
            content: None,
            ..entry()
        };
        assert_eq!(normalize(&raw, 1, now()).unwrap().content, "Full story");

        let raw = RawEntry {
            content: None,
            content_snippet: None,
            ..entry()
        };
        assert_eq!(normalize(&raw, 1, now()).unwrap().content, "Teaser");
    }

    #[test]
    fn test_excerpt_from_description_is_plain_text() {
        let raw = RawEntry {
            content_snippet: None,
            description: Some("<b>Bold</b> teaser &amp; more".to_string()),
            ..entry()
        };
        assert_eq!(
            normalize(&raw, 1, now()).unwrap().excerpt.as_deref(),
            Some("Bold teaser & more")
        );
    }

    #[test]
    fn test_excerpt_keeps_comparison_operators() {
        let sentence = "Inflation < 3% for the first time since 2021, while growth > 2% again";
        let raw = RawEntry {
            content: None,
            content_snippet: None,
            description: Some(sentence.to_string()),
            ..entry()
        };
        let candidate = normalize(&raw, 1, now()).unwrap();
        assert_eq!(candidate.excerpt.as_deref(), Some(sentence));
        assert_eq!(candidate.content, sentence);
    }

    #[test]
    fn test_excerpt_truncated_to_500_chars() {
        let raw = RawEntry {
            content_snippet: Some("é".repeat(600)),
            ..entry()
        };
        let excerpt = normalize(&raw, 1, now()).unwrap().excerpt.unwrap();
        assert_eq!(excerpt.chars().count(), EXCERPT_MAX_CHARS);
    }

    #[test]
    fn test_no_excerpt_when_only_content() {
        let raw = RawEntry {
            content_snippet: None,
            description: None,
            ..entry()
        };
        let candidate = normalize(&raw, 1, now()).unwrap();
        assert_eq!(candidate.excerpt, None);
        assert_eq!(candidate.content, "<p>Full story</p>");
    }

    #[test]
    fn test_undated_entry_uses_now() {
        let raw = RawEntry {
            published: None,
            ..entry()
        };
        assert_eq!(normalize(&raw, 1, now()).unwrap().rss_published_at, now());
    }

    #[test]
    fn test_title_is_cleaned() {
        let raw = RawEntry {
            title: Some("  Breaking:\x00  storm\n warning ".to_string()),
            ..entry()
        };
        let candidate = normalize(&raw, 1, now()).unwrap();
        assert_eq!(candidate.title, "Breaking: storm warning");
        assert_eq!(candidate.slug, "breaking-storm-warning");
    }

    #[test]
    fn test_escaped_title_decoded() {
        let raw = RawEntry {
            title: Some("Q&amp;A: rates &lt; 4%".to_string()),
            ..entry()
        };
        let candidate = normalize(&raw, 1, now()).unwrap();
        assert_eq!(candidate.title, "Q&A: rates < 4%");
        assert_eq!(candidate.slug, "qa-rates-4");
    }

    #[test]
    fn test_link_is_trimmed() {
        let raw = RawEntry {
            link: Some("  https://news.example.com/story  ".to_string()),
            ..entry()
        };
        assert_eq!(
            normalize(&raw, 1, now()).unwrap().original_url,
            "https://news.example.com/story"
        );
    }
}
