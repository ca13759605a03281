//! `[name attr=value ...]` parsing and attribute defaults.

use std::collections::BTreeMap;

use crate::config::{parse_bool, Config};
use crate::listing::Sort;
use crate::template::escape::sanitize_text_field;
use crate::template::DisplayFlags;

pub const GRID_TAG: &str = "slots_grid";
pub const DETAIL_TAG: &str = "slot_detail";

pub const MAX_GRID_LIMIT: u32 = 100;

/// Lowercased attribute names to raw values.
pub type Attrs = BTreeMap<String, String>;

/// Parse `a="x" b='y' c=z flag` into attributes. Positional words are stored
/// under their index (`"0"`, `"1"`, ...).
pub fn parse_attrs(text: &str) -> Attrs {
    let mut attrs = Attrs::new();
    let mut chars = text.trim().char_indices().peekable();
    let src = text.trim();
    let mut positional = 0usize;

    while let Some(&(start, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        // name or bare value
        let mut end = start;
        while let Some(&(i, c)) = chars.peek() {
            if c.is_whitespace() || c == '=' {
                break;
            }
            end = i + c.len_utf8();
            chars.next();
        }
        let word = &src[start..end];

        while matches!(chars.peek(), Some((_, c)) if c.is_whitespace()) {
            chars.next();
        }
        if !matches!(chars.peek(), Some((_, '='))) {
            if !word.is_empty() {
                attrs.insert(positional.to_string(), unquote(word).to_string());
                positional += 1;
            }
            continue;
        }
        chars.next();
        while matches!(chars.peek(), Some((_, c)) if c.is_whitespace()) {
            chars.next();
        }

        let value = match chars.peek().copied() {
            Some((i, quote @ ('"' | '\''))) => {
                chars.next();
                let value_start = i + 1;
                let mut value_end = src.len();
                for (j, c) in chars.by_ref() {
                    if c == quote {
                        value_end = j;
                        break;
                    }
                }
                &src[value_start..value_end.max(value_start)]
            }
            Some((i, _)) => {
                let mut value_end = i;
                while let Some(&(j, c)) = chars.peek() {
                    if c.is_whitespace() {
                        break;
                    }
                    value_end = j + c.len_utf8();
                    chars.next();
                }
                &src[i..value_end]
            }
            None => "",
        };

        if !word.is_empty() {
            attrs.insert(word.to_ascii_lowercase(), value.to_string());
        }
    }
    attrs
}

fn unquote(word: &str) -> &str {
    word.trim_matches(|c| c == '"' || c == '\'')
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    Text(&'a str),
    Shortcode { name: &'a str, attrs: Attrs },
}

/// Split `text` into literal runs and occurrences of the `known` shortcodes.
///
/// Unknown tags stay literal. `[[tag ...]]` is an escape and yields the
/// single-bracket text `[tag ...]`.
pub fn segments<'a>(text: &'a str, known: &[&str]) -> Vec<Segment<'a>> {
    let mut out = Vec::new();
    let mut literal_start = 0;
    let mut pos = 0;

    while let Some(rel) = text[pos..].find('[') {
        let open = pos + rel;
        let Some(close_rel) = text[open..].find(']') else {
            break;
        };
        let close = open + close_rel;
        let inner = &text[open + 1..close];

        if let Some(escaped) = inner.strip_prefix('[') {
            let tag = tag_name(escaped);
            if known.contains(&tag) && text[close..].starts_with("]]") {
                if literal_start < open {
                    out.push(Segment::Text(&text[literal_start..open]));
                }
                out.push(Segment::Text(&text[open + 1..close + 1]));
                pos = close + 2;
                literal_start = pos;
                continue;
            }
            pos = open + 1;
            continue;
        }

        let name = tag_name(inner);
        if !known.contains(&name) {
            pos = open + 1;
            continue;
        }

        if literal_start < open {
            out.push(Segment::Text(&text[literal_start..open]));
        }
        let rest = inner[name.len()..].trim().trim_end_matches('/');
        out.push(Segment::Shortcode {
            name,
            attrs: parse_attrs(rest),
        });
        pos = close + 1;
        literal_start = pos;
    }

    if literal_start < text.len() {
        out.push(Segment::Text(&text[literal_start..]));
    }
    out
}

fn tag_name(inner: &str) -> &str {
    let end = inner
        .find(|c: char| c.is_whitespace() || c == '/' || c == ']')
        .unwrap_or(inner.len());
    &inner[..end]
}

/// Truthy attribute, or `default` when absent.
fn flag(attrs: &Attrs, name: &str, default: bool) -> bool {
    attrs
        .get(name)
        .map(|v| parse_bool(v).unwrap_or(false))
        .unwrap_or(default)
}

fn class_attr(attrs: &Attrs) -> String {
    attrs
        .get("class")
        .map(|c| sanitize_text_field(c))
        .unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridAtts {
    pub limit: u32,
    pub sort: Sort,
    pub class: String,
    pub show_filters: bool,
    pub show_pagination: bool,
}

impl GridAtts {
    /// Attribute values over configured defaults. Filters and pagination
    /// also need their feature flag on.
    pub fn from_attrs(attrs: &Attrs, config: &Config) -> Self {
        Self {
            limit: parse_limit(attrs.get("limit").map(String::as_str), config.default_limit),
            sort: attrs
                .get("sort")
                .map(|s| Sort::parse(s))
                .unwrap_or(config.default_sort),
            class: class_attr(attrs),
            show_filters: flag(attrs, "show_filters", true) && config.enable_grid_filters,
            show_pagination: flag(attrs, "show_pagination", true) && config.enable_pagination,
        }
    }
}

/// Limit clamped to 1–100; unparseable values use `default`.
pub fn parse_limit(raw: Option<&str>, default: u32) -> u32 {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
        .unwrap_or(default as i64)
        .clamp(1, MAX_GRID_LIMIT as i64) as u32
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailAtts {
    pub id: String,
    pub flags: DisplayFlags,
    pub class: String,
    pub template: Option<String>,
}

impl DetailAtts {
    pub fn from_attrs(attrs: &Attrs) -> Self {
        Self {
            id: attrs
                .get("id")
                .map(|v| sanitize_text_field(v))
                .unwrap_or_default(),
            flags: DisplayFlags {
                show_rating: flag(attrs, "show_rating", true),
                show_description: flag(attrs, "show_description", true),
                show_provider: flag(attrs, "show_provider", true),
                show_rtp: flag(attrs, "show_rtp", true),
                show_wager: flag(attrs, "show_wager", true),
            },
            class: class_attr(attrs),
            template: attrs
                .get("template")
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
        }
    }
}
