//! HTML escaping and light text shaping used by the renderers.

use std::borrow::Cow;

/// Escape HTML special characters.
///
/// Uses `Cow` to avoid allocation when no escaping is needed.
pub fn esc_html(s: &str) -> Cow<'_, str> {
    if !s.contains(['<', '>', '&', '"', '\'']) {
        return Cow::Borrowed(s);
    }

    let mut result = String::with_capacity(s.len() + 16);
    for c in s.chars() {
        match c {
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '&' => result.push_str("&amp;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#039;"),
            _ => result.push(c),
        }
    }
    Cow::Owned(result)
}

/// Attribute values share the text escaping rules.
#[inline]
pub fn esc_attr(s: &str) -> Cow<'_, str> {
    esc_html(s)
}

/// Sanitize a URL for use in `href`/`src`. Anything with a scheme other than
/// http(s) is dropped.
pub fn esc_url(url: &str) -> String {
    let url = url.trim();
    if url.is_empty() {
        return String::new();
    }

    let scheme_end = url.find(':');
    let path_start = url.find(['/', '?', '#']);
    if let Some(colon) = scheme_end {
        let is_scheme = path_start.map_or(true, |p| colon < p);
        if is_scheme {
            let scheme = url[..colon].to_ascii_lowercase();
            if scheme != "http" && scheme != "https" {
                return String::new();
            }
        }
    }

    let cleaned: String = url.chars().filter(|c| !c.is_control()).collect();
    esc_attr(&cleaned.replace(' ', "%20")).into_owned()
}

/// Remove anything that looks like a tag.
pub fn strip_tags(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    for c in s.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

/// Strip tags, collapse whitespace and trim. Used on free-text form input.
pub fn sanitize_text_field(s: &str) -> String {
    strip_tags(s).split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Keep the first `limit` words of the tag-stripped text, appending `more`
/// when anything was cut.
pub fn trim_words(text: &str, limit: usize, more: &str) -> String {
    let stripped = strip_tags(text);
    let words: Vec<&str> = stripped.split_whitespace().collect();
    if words.len() > limit {
        format!("{}{}", words[..limit].join(" "), more)
    } else {
        words.join(" ")
    }
}

/// Turn blank-line separated text into paragraphs; single newlines become `<br />`.
pub fn autop(text: &str) -> String {
    let normalized = text.replace("\r\n", "\n");
    let mut out = String::new();
    let mut paragraph: Vec<&str> = Vec::new();

    fn flush(paragraph: &mut Vec<&str>, out: &mut String) {
        if paragraph.is_empty() {
            return;
        }
        out.push_str("<p>");
        out.push_str(&paragraph.join("<br />\n"));
        out.push_str("</p>\n");
        paragraph.clear();
    }

    for line in normalized.lines() {
        let line = line.trim();
        if line.is_empty() {
            flush(&mut paragraph, &mut out);
        } else {
            paragraph.push(line);
        }
    }
    flush(&mut paragraph, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn esc_html_plain_is_borrowed() {
        assert!(matches!(esc_html("hello world"), Cow::Borrowed(_)));
    }

    #[test]
    fn esc_html_special_chars() {
        assert_eq!(esc_html("<b>\"A\" & 'B'</b>"), "&lt;b&gt;&quot;A&quot; &amp; &#039;B&#039;&lt;/b&gt;");
    }

    #[test]
    fn esc_url_rejects_script_scheme() {
        assert_eq!(esc_url("javascript:alert(1)"), "");
        assert_eq!(esc_url("  JavaScript:alert(1)"), "");
    }

    #[test]
    fn esc_url_keeps_http_and_relative() {
        assert_eq!(esc_url("https://example.com/a?b=1&c=2"), "https://example.com/a?b=1&amp;c=2");
        assert_eq!(esc_url("/slot/book-of-ra/"), "/slot/book-of-ra/");
        assert_eq!(esc_url("/search?q=a:b"), "/search?q=a:b");
    }

    #[test]
    fn sanitize_collapses_and_strips() {
        assert_eq!(sanitize_text_field("  <b>Net</b>Ent \n  Gaming "), "NetEnt Gaming");
    }

    #[test]
    fn trim_words_appends_marker_only_when_cut() {
        assert_eq!(trim_words("one two three", 2, "..."), "one two...");
        assert_eq!(trim_words("one two", 2, "..."), "one two");
    }

    #[test]
    fn autop_builds_paragraphs() {
        assert_eq!(autop("first\nline\n\nsecond"), "<p>first<br />\nline</p>\n<p>second</p>\n");
        assert_eq!(autop(""), "");
    }
}
