use std::borrow::Cow;

use html2text::render::text_renderer::TrivialDecorator;

/// Truncates a string to at most `max_chars` Unicode scalar values.
///
/// Never splits a code point. Returns `Cow::Borrowed` when the string already
/// fits.
///
/// # Examples
///
/// ```
/// use newsdesk::util::truncate_chars;
///
/// assert_eq!(truncate_chars("Hello World", 5), "Hello");
/// assert_eq!(truncate_chars("短い", 10), "短い");
/// ```
pub fn truncate_chars(s: &str, max_chars: usize) -> Cow<'_, str> {
    match s.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => Cow::Owned(s[..byte_idx].to_string()),
        None => Cow::Borrowed(s),
    }
}

/// Removes ASCII control characters except tab, newline and carriage return.
///
/// Feed titles occasionally carry stray `\x00`/`\x1b` bytes from broken
/// encoders; they have no place in a stored article.
pub fn strip_control_chars(s: &str) -> Cow<'_, str> {
    let is_control = |c: char| c.is_ascii_control() && !matches!(c, '\t' | '\n' | '\r');
    if !s.chars().any(is_control) {
        return Cow::Borrowed(s);
    }
    Cow::Owned(s.chars().filter(|&c| !is_control(c)).collect())
}

/// Line width handed to the HTML renderer. Wrapped lines are joined again
/// by [`collapse_whitespace`], so this only needs to exceed any real word.
const RENDER_WIDTH: usize = 10_000;

/// Converts an HTML fragment to plain text.
///
/// Markup goes through `html2text` with the trivial decorator, so tags
/// vanish without leaving `*`/`[1]` markers and entities are decoded by the
/// HTML tokenizer. A `<` that does not open a tag stays literal text.
/// Whitespace runs collapse to a single space.
pub fn strip_html(html: &str) -> String {
    if !html.contains(['<', '&']) {
        return collapse_whitespace(html);
    }

    let config = html2text::config::with_decorator(TrivialDecorator::new());
    match config.string_from_read(html.as_bytes(), RENDER_WIDTH) {
        Ok(text) => collapse_whitespace(&text),
        Err(e) => {
            tracing::debug!(error = %e, "HTML rendering failed, decoding entities only");
            collapse_whitespace(&html_escape::decode_html_entities(html))
        }
    }
}

/// Collapses every whitespace run to a single space and trims both ends.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
