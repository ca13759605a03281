//! Token substitution over admin-supplied or built-in HTML.
//!
//! Templates reference values as `{{name}}`. A render builds a [`Tokens`]
//! dictionary for one slot and runs [`substitute`] once over the template.

pub mod card;
pub mod detail;
pub mod escape;
pub mod format;
pub mod registry;

/// Ordered `name -> value` pairs for one render.
#[derive(Debug, Clone, Default)]
pub struct Tokens {
    entries: Vec<(&'static str, String)>,
}

impl Tokens {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a token value.
    pub fn insert(&mut self, name: &'static str, value: impl Into<String>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Replace every known `{{name}}` in `template` with its value.
///
/// Single left-to-right pass: inserted values are never scanned again, so a
/// value that itself contains `{{...}}` comes out literally. Unknown names
/// are left untouched.
pub fn substitute(template: &str, tokens: &Tokens) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after = &rest[open + 2..];
        let Some(close) = after.find("}}") else {
            out.push_str(&rest[open..]);
            return out;
        };

        match tokens.get(&after[..close]) {
            Some(value) => {
                out.push_str(value);
                rest = &after[close + 2..];
            }
            None => {
                out.push_str("{{");
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

/// Site-wide values the renderers need besides the slot itself.
#[derive(Debug, Clone)]
pub struct RenderContext {
    pub site_url: String,
    pub asset_base_url: String,
}

impl RenderContext {
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self {
            site_url: config.site_url.clone(),
            asset_base_url: config.asset_base_url.clone(),
        }
    }

    pub fn default_image(&self) -> String {
        format!("{}/images/default-slot.svg", self.asset_base_url.trim_end_matches('/'))
    }

    pub fn browse_url(&self) -> String {
        format!("{}/slots/", self.site_url.trim_end_matches('/'))
    }
}

/// Per-render section toggles from the detail shortcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayFlags {
    pub show_rating: bool,
    pub show_description: bool,
    pub show_provider: bool,
    pub show_rtp: bool,
    pub show_wager: bool,
}

impl Default for DisplayFlags {
    fn default() -> Self {
        Self {
            show_rating: true,
            show_description: true,
            show_provider: true,
            show_rtp: true,
            show_wager: true,
        }
    }
}
