use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

pub const FONT_FAMILIES: [&str; 4] = [
    "-apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif",
    "'Arial', sans-serif",
    "'Georgia', serif",
    "'Courier New', monospace",
];

pub const MAX_BORDER_RADIUS: u32 = 20;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("{field} must be a hex color like #0073aa")]
    InvalidColor { field: &'static str },

    #[error("border_radius must be between 0 and {MAX_BORDER_RADIUS}")]
    BorderRadius,

    #[error("unsupported font_family")]
    FontFamily,

    #[error("api_url must be an http(s) URL")]
    ApiUrl,
}

/// Site-wide display settings, stored as one JSON document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct Settings {
    /// Stored only; no synchronisation runs.
    pub enable_data_sync: bool,
    pub api_url: String,
    pub primary_color: String,
    pub secondary_color: String,
    pub accent_color: String,
    /// Pixels, 0–20
    pub border_radius: u32,
    pub font_family: String,
    /// Replaces the default theme when non-empty. May use `{{primary_color}}`,
    /// `{{secondary_color}}`, `{{accent_color}}` and `{{border_radius}}`.
    pub custom_theme_css: String,
    pub slot_editor_markup: String,
    pub slot_editor_override: bool,
    pub slot_card_template: String,
    pub slot_card_template_override: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enable_data_sync: false,
            api_url: String::new(),
            primary_color: "#0073aa".to_string(),
            secondary_color: "#666666".to_string(),
            accent_color: "#ff6b6b".to_string(),
            border_radius: 8,
            font_family: FONT_FAMILIES[0].to_string(),
            custom_theme_css: String::new(),
            slot_editor_markup: String::new(),
            slot_editor_override: false,
            slot_card_template: String::new(),
            slot_card_template_override: false,
        }
    }
}

fn is_hex_color(value: &str) -> bool {
    let Some(hex) = value.strip_prefix('#') else {
        return false;
    };
    matches!(hex.len(), 3 | 6) && hex.bytes().all(|b| b.is_ascii_hexdigit())
}

impl Settings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        for (field, value) in [
            ("primary_color", &self.primary_color),
            ("secondary_color", &self.secondary_color),
            ("accent_color", &self.accent_color),
        ] {
            if !is_hex_color(value) {
                return Err(SettingsError::InvalidColor { field });
            }
        }
        if self.border_radius > MAX_BORDER_RADIUS {
            return Err(SettingsError::BorderRadius);
        }
        if !FONT_FAMILIES.contains(&self.font_family.as_str()) {
            return Err(SettingsError::FontFamily);
        }
        let api_url = self.api_url.trim();
        if !api_url.is_empty() && !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
            return Err(SettingsError::ApiUrl);
        }
        Ok(())
    }

    /// Custom card markup, if the override is on and the markup isn't blank.
    pub fn card_override(&self) -> Option<&str> {
        (self.slot_card_template_override && !self.slot_card_template.trim().is_empty())
            .then_some(self.slot_card_template.as_str())
    }

    /// Custom detail markup, same rule as [`Settings::card_override`].
    pub fn editor_override(&self) -> Option<&str> {
        (self.slot_editor_override && !self.slot_editor_markup.trim().is_empty())
            .then_some(self.slot_editor_markup.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(Settings::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_bad_color() {
        let settings = Settings {
            accent_color: "red".into(),
            ..Settings::default()
        };
        assert_eq!(
            settings.validate(),
            Err(SettingsError::InvalidColor { field: "accent_color" })
        );
    }

    #[test]
    fn rejects_radius_and_font() {
        let wide = Settings {
            border_radius: 21,
            ..Settings::default()
        };
        assert_eq!(wide.validate(), Err(SettingsError::BorderRadius));

        let comic = Settings {
            font_family: "Comic Sans MS".into(),
            ..Settings::default()
        };
        assert_eq!(comic.validate(), Err(SettingsError::FontFamily));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let settings: Settings =
            serde_json::from_str(r##"{"primary_color":"#112233","slot_editor_override":true}"##).unwrap();
        assert_eq!(settings.primary_color, "#112233");
        assert_eq!(settings.secondary_color, "#666666");
        assert!(settings.slot_editor_override);
        assert_eq!(settings.editor_override(), None);
    }

    #[test]
    fn override_requires_flag_and_markup() {
        let mut settings = Settings {
            slot_card_template: "<b>{{slot_title}}</b>".into(),
            ..Settings::default()
        };
        assert_eq!(settings.card_override(), None);
        settings.slot_card_template_override = true;
        assert_eq!(settings.card_override(), Some("<b>{{slot_title}}</b>"));
    }
}
