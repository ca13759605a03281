use crate::models::settings::Settings;
use crate::template::{substitute, Tokens};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Default,
    Custom,
}

impl Theme {
    pub fn current(settings: &Settings) -> Self {
        if settings.custom_theme_css.trim().is_empty() {
            Theme::Default
        } else {
            Theme::Custom
        }
    }

    /// Class added to grid and detail containers.
    pub fn class(&self) -> &'static str {
        match self {
            Theme::Default => "",
            Theme::Custom => "slots-theme-custom",
        }
    }
}

pub fn theme_class(settings: &Settings) -> &'static str {
    Theme::current(settings).class()
}

/// Custom theme CSS with the color variables filled in. Empty for the default theme.
pub fn theme_css(settings: &Settings) -> String {
    if Theme::current(settings) == Theme::Default {
        return String::new();
    }
    let mut tokens = Tokens::new();
    tokens.insert("primary_color", settings.primary_color.as_str());
    tokens.insert("secondary_color", settings.secondary_color.as_str());
    tokens.insert("accent_color", settings.accent_color.as_str());
    tokens.insert("border_radius", settings.border_radius.to_string());
    tokens.insert("font_family", settings.font_family.as_str());
    substitute(&settings.custom_theme_css, &tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_theme_has_no_class_or_css() {
        let settings = Settings::default();
        assert_eq!(Theme::current(&settings), Theme::Default);
        assert_eq!(theme_class(&settings), "");
        assert_eq!(theme_css(&settings), "");
    }

    #[test]
    fn custom_css_substitutes_variables() {
        let settings = Settings {
            custom_theme_css: ".slot-card { color: {{primary_color}}; border-radius: {{border_radius}}px; {{other}} }".into(),
            border_radius: 12,
            ..Settings::default()
        };
        assert_eq!(theme_class(&settings), "slots-theme-custom");
        assert_eq!(
            theme_css(&settings),
            ".slot-card { color: #0073aa; border-radius: 12px; {{other}} }"
        );
    }
}
