//! Number, currency and star formatting for slot fields.

use chrono::{DateTime, Utc};

pub const MAX_STARS: u32 = 5;

/// Treat zero and non-finite values as "not set", matching how empty meta
/// fields have always been displayed.
#[inline]
pub fn present(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v != 0.0)
}

/// Fixed-decimal formatting with `,` thousands separators.
pub fn number_format(value: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (formatted.as_str(), None),
    };

    let mut grouped = String::with_capacity(formatted.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if let Some(frac) = frac_part {
        grouped.push('.');
        grouped.push_str(frac);
    }

    let is_zero = formatted.chars().all(|c| c == '0' || c == '.');
    if value.is_sign_negative() && !is_zero {
        grouped.insert(0, '-');
    }
    grouped
}

pub fn format_rating(rating: f64) -> String {
    number_format(rating, 1)
}

pub fn format_rtp(rtp: f64) -> String {
    format!("{}%", number_format(rtp, 1))
}

/// Combine min/max wager into a single display string.
///
/// both → `$10.00 - $50.00`, min only → `$10.00+`, max only → `Up to $50.00`.
pub fn format_wager(min: Option<f64>, max: Option<f64>) -> String {
    match (present(min), present(max)) {
        (Some(min), Some(max)) => {
            format!("${} - ${}", number_format(min, 2), number_format(max, 2))
        }
        (Some(min), None) => format!("${}+", number_format(min, 2)),
        (None, Some(max)) => format!("Up to ${}", number_format(max, 2)),
        (None, None) => String::new(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StarCounts {
    pub full: u32,
    pub half: u32,
    pub empty: u32,
}

pub fn star_counts(rating: f64) -> StarCounts {
    let rating = rating.clamp(0.0, MAX_STARS as f64);
    let full = rating.floor() as u32;
    let half = u32::from(rating - full as f64 >= 0.5);
    StarCounts {
        full,
        half,
        empty: MAX_STARS - full - half,
    }
}

/// Star rating markup wrapped in a `div` of the given class.
pub fn star_rating_html(rating: f64, wrapper_class: &str) -> String {
    let counts = star_counts(rating);
    let mut html = format!("<div class=\"{wrapper_class}\">");
    for _ in 0..counts.full {
        html.push_str("<span class=\"star full\">★</span>");
    }
    for _ in 0..counts.half {
        html.push_str("<span class=\"star half\">★</span>");
    }
    for _ in 0..counts.empty {
        html.push_str("<span class=\"star empty\">☆</span>");
    }
    html.push_str("</div>");
    html
}

/// Long-form date, e.g. `March 4, 2025`.
pub fn format_date(at: &DateTime<Utc>) -> String {
    at.format("%B %-d, %Y").to_string()
}
