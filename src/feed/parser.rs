use anyhow::Result;
use chrono::{DateTime, Utc};
use feed_rs::parser;
use url::Url;

use crate::util::strip_html;

/// One entry as the feed asserted it, before any validation.
///
/// Text fields are kept per dialect so the normalizer can apply its own
/// preference order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawEntry {
    pub link: Option<String>,
    pub title: Option<String>,
    /// Full body (`content:encoded`, Atom `<content>`, JSON Feed `content_html`)
    pub content: Option<String>,
    /// Plain-text rendition of the body, tags stripped
    pub content_snippet: Option<String>,
    /// `<description>` / Atom `<summary>`
    pub description: Option<String>,
    pub published: Option<DateTime<Utc>>,
    /// Topic tags, in feed order
    pub categories: Vec<String>,
}

/// Parse RSS 0.9x/1.0/2.0, Atom or JSON Feed bytes into raw entries.
///
/// Relative entry links are resolved against `feed_url`. A document that
/// parses but has no entries yields an empty `Vec`.
pub fn parse_feed(bytes: &[u8], feed_url: &str) -> Result<Vec<RawEntry>> {
    let feed = parser::Builder::new()
        .base_uri(Some(feed_url))
        .build()
        .parse(bytes)?;
    let base = Url::parse(feed_url).ok();

    let entries = feed
        .entries
        .into_iter()
        .map(|entry| {
            let link = entry
                .links
                .iter()
                .find(|l| l.rel.as_deref().map_or(true, |rel| rel == "alternate"))
                .or_else(|| entry.links.first())
                .map(|l| l.href.trim())
                .filter(|href| !href.is_empty())
                .map(|href| resolve_link(href, base.as_ref()));
            let title = entry.title.map(|t| t.content);
            let content = entry.content.and_then(|c| c.body);
            let description = entry.summary.map(|s| s.content);
            let content_snippet = content
                .as_deref()
                .or(description.as_deref())
                .map(strip_html)
                .filter(|s| !s.is_empty());
            let published = entry.published.or(entry.updated);
            let categories = entry
                .categories
                .into_iter()
                .map(|c| c.label.unwrap_or(c.term))
                .collect();

            RawEntry {
                link,
                title,
                content,
                content_snippet,
                description,
                published,
                categories,
            }
        })
        .collect();

    Ok(entries)
}

/// Joins a relative link onto the feed URL. Absolute links, and anything
/// that fails to join, pass through untouched for the normalizer to judge.
fn resolve_link(href: &str, base: Option<&Url>) -> String {
    match (Url::parse(href), base) {
        (Err(url::ParseError::RelativeUrlWithoutBase), Some(base)) => base
            .join(href)
            .map(String::from)
            .unwrap_or_else(|_| href.to_string()),
        _ => href.to_string(),
    }
}
