use sha2::{Digest, Sha256};

/// Longest slug produced, in characters.
pub const MAX_SLUG_CHARS: usize = 100;

/// Derives a URL-safe slug from an article title.
///
/// Lower-cases and trims the title, drops everything except word characters
/// (Unicode letters, digits, `_`), whitespace and hyphens, turns each
/// whitespace/hyphen run into a single `-`, then truncates to
/// [`MAX_SLUG_CHARS`]. Slugs are not unique: two titles that differ only in
/// punctuation map to the same slug.
///
/// A title with no word characters at all falls back to `article-` plus the
/// first eight hex digits of its SHA-256, so the result is never empty.
///
/// ```
/// use newsdesk::ingest::generate_slug;
///
/// assert_eq!(generate_slug("Hello, World! 2024"), "hello-world-2024");
/// assert_eq!(generate_slug("  Breaking -- News  "), "breaking-news");
/// ```
pub fn generate_slug(title: &str) -> String {
    let lowered = title.trim().to_lowercase();

    let mut slug = String::with_capacity(lowered.len());
    let mut pending_separator = false;
    for c in lowered.chars() {
        if c.is_whitespace() || c == '-' {
            pending_separator = true;
        } else if c.is_alphanumeric() || c == '_' {
            if pending_separator {
                slug.push('-');
                pending_separator = false;
            }
            slug.push(c);
        }
    }
    if pending_separator {
        slug.push('-');
    }

    let slug: String = slug.chars().take(MAX_SLUG_CHARS).collect();
    if slug.chars().any(|c| c != '-') {
        slug
    } else {
        fallback_slug(title)
    }
}

fn fallback_slug(title: &str) -> String {
    let digest = Sha256::digest(title.as_bytes());
    let hex: String = digest[..4].iter().map(|b| format!("{:02x}", b)).collect();
    format!("article-{}", hex)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_basic_title() {
        assert_eq!(generate_slug("Hello, World! 2024"), "hello-world-2024");
    }

    #[test]
    fn test_collapses_whitespace_and_hyphens() {
        assert_eq!(generate_slug("a   b\t\tc"), "a-b-c");
        assert_eq!(generate_slug("well---known - fact"), "well-known-fact");
        assert_eq!(generate_slug("x ! y"), "x-y");
    }

    #[test]
    fn test_keeps_underscore_and_unicode_letters() {
        assert_eq!(generate_slug("snake_case Title"), "snake_case-title");
        assert_eq!(generate_slug("Über Straße"), "über-straße");
    }

    #[test]
    fn test_trailing_punctuation_leaves_trailing_hyphen() {
        assert_eq!(generate_slug("Wait for it -"), "wait-for-it-");
        assert_eq!(generate_slug("Really ?"), "really-");
    }

    #[test]
    fn test_truncates_to_limit() {
        let title = "word ".repeat(40);
        let slug = generate_slug(&title);
        assert_eq!(slug.chars().count(), MAX_SLUG_CHARS);
        assert!(slug.starts_with("word-word-"));
    }

    #[test]
    fn test_empty_result_falls_back_to_hash() {
        let slug = generate_slug("!!! ???");
        assert!(slug.starts_with("article-"), "got {slug}");
        assert_eq!(slug.len(), "article-".len() + 8);
        assert_eq!(slug, generate_slug("!!! ???"));
        assert_ne!(slug, generate_slug("???"));
    }

    #[test]
    fn test_empty_title_falls_back_to_hash() {
        // SHA-256 of the empty string starts with e3b0c442
        assert_eq!(generate_slug(""), "article-e3b0c442");
    }

    proptest! {
        #[test]
        fn slug_is_deterministic(title in ".{0,200}") {
            prop_assert_eq!(generate_slug(&title), generate_slug(&title));
        }

        #[test]
        fn slug_shape(title in ".{0,300}") {
            let slug = generate_slug(&title);
            prop_assert!(!slug.is_empty());
            prop_assert!(slug.chars().count() <= MAX_SLUG_CHARS);
            prop_assert!(!slug.contains("--"));
            prop_assert!(!slug.chars().any(char::is_whitespace));
            prop_assert!(slug.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-'));
        }
    }
}
