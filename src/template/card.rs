//! Grid card rendering.

use crate::models::settings::Settings;
use crate::models::slot::Slot;

use super::escape::{esc_attr, esc_html, esc_url, trim_words};
use super::format::{format_rating, format_rtp, format_wager, present, star_rating_html};
use super::{substitute, RenderContext, Tokens};

/// Starting markup offered to editors for the card override.
pub const DEFAULT_CARD_MARKUP: &str = r#"<div class="slot-card" data-slot-id="{{slot_id}}">
    <div class="slot-card-image-container">
        <img src="{{slot_image}}" alt="{{slot_title}}" class="slot-card-image" loading="lazy">
        {{star_rating}}
    </div>
    <div class="slot-card-content">
        <h3 class="slot-card-title">
            <a href="{{slot_permalink}}" title="{{slot_title}}">{{slot_title}}</a>
        </h3>
        {{slot_provider}}
        <div class="slot-card-meta">
            {{slot_rating}}
            {{slot_rtp}}
        </div>
        {{slot_wager}}
        {{slot_excerpt}}
        <div class="slot-card-actions">
            <a href="{{slot_permalink}}" class="slot-card-button">More Info</a>
        </div>
    </div>
</div>"#;

const EXCERPT_WORDS: usize = 15;

fn image_url(slot: &Slot, ctx: &RenderContext) -> String {
    slot.thumbnail_url
        .as_deref()
        .filter(|u| !u.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| ctx.default_image())
}

fn card_excerpt(slot: &Slot) -> String {
    trim_words(&slot.effective_excerpt(), EXCERPT_WORDS, "...")
}

/// Card tokens. Cards have no display flags; optional fields simply drop out.
pub fn card_tokens(slot: &Slot, ctx: &RenderContext) -> Tokens {
    let rating = present(slot.star_rating);
    let rtp = present(slot.rtp);
    let provider = slot.provider_name.as_deref().filter(|p| !p.is_empty());
    let slot_id = slot.slot_id.as_deref().unwrap_or("");
    let wager = format_wager(slot.min_wager, slot.max_wager);
    let excerpt = card_excerpt(slot);

    let mut t = Tokens::new();
    t.insert("slot_image", esc_url(&image_url(slot, ctx)));
    t.insert("slot_title", esc_html(&slot.title));
    t.insert(
        "slot_provider",
        provider
            .map(|p| format!("<div class=\"slot-card-provider\">{}</div>", esc_html(p)))
            .unwrap_or_default(),
    );
    t.insert(
        "slot_rating",
        rating
            .map(|r| {
                format!(
                    "<div class=\"slot-card-rating\"><span class=\"rating-value\">{}</span></div>",
                    format_rating(r)
                )
            })
            .unwrap_or_default(),
    );
    t.insert(
        "slot_rtp",
        rtp.map(|r| format!("<div class=\"slot-card-rtp\">RTP: {}</div>", format_rtp(r)))
            .unwrap_or_default(),
    );
    t.insert(
        "slot_wager",
        if wager.is_empty() {
            String::new()
        } else {
            format!(
                "<div class=\"slot-card-wager\"><span class=\"wager-label\">Wager:</span><span class=\"wager-value\">{}</span></div>",
                esc_html(&wager)
            )
        },
    );
    t.insert("slot_id", esc_attr(slot_id));
    t.insert(
        "slot_excerpt",
        if excerpt.is_empty() {
            String::new()
        } else {
            format!("<div class=\"slot-card-excerpt\">{}</div>", esc_html(&excerpt))
        },
    );
    t.insert("slot_permalink", esc_url(&slot.permalink(&ctx.site_url)));
    t.insert(
        "star_rating",
        rating
            .map(|r| star_rating_html(r, "slot-card-rating-overlay"))
            .unwrap_or_default(),
    );
    t.insert("rtp_value", rtp.map(format_rtp).unwrap_or_else(|| "N/A".to_string()));
    t.insert("wager_range", esc_html(&wager));
    t.insert("provider_name", esc_html(provider.unwrap_or("")));
    t.insert("slot_id_value", esc_html(slot_id));
    t
}

/// Render one card, through the editor's markup when the override is on.
pub fn render_card(slot: &Slot, settings: &Settings, ctx: &RenderContext) -> String {
    match settings.card_override() {
        Some(markup) => substitute(markup, &card_tokens(slot, ctx)),
        None => render_builtin_card(slot, ctx),
    }
}

fn render_builtin_card(slot: &Slot, ctx: &RenderContext) -> String {
    let rating = present(slot.star_rating);
    let rtp = present(slot.rtp);
    let wager = format_wager(slot.min_wager, slot.max_wager);
    let excerpt = card_excerpt(slot);
    let permalink = esc_url(&slot.permalink(&ctx.site_url));
    let title_attr = esc_attr(&slot.title);

    let mut html = format!(
        "<div class=\"slot-card\" data-slot-id=\"{}\">\n<div class=\"slot-card-image-container\">\n<img src=\"{}\" alt=\"{}\" class=\"slot-card-image\" loading=\"lazy\">\n",
        esc_attr(slot.slot_id.as_deref().unwrap_or("")),
        esc_url(&image_url(slot, ctx)),
        title_attr,
    );
    if let Some(r) = rating {
        html.push_str(&star_rating_html(r, "slot-card-rating-overlay"));
        html.push('\n');
    }
    html.push_str("</div>\n<div class=\"slot-card-content\">\n");
    html.push_str(&format!(
        "<h3 class=\"slot-card-title\"><a href=\"{permalink}\" title=\"{title_attr}\">{}</a></h3>\n",
        esc_html(&slot.title)
    ));

    if let Some(provider) = slot.provider_name.as_deref().filter(|p| !p.is_empty()) {
        html.push_str(&format!(
            "<div class=\"slot-card-provider\">{}</div>\n",
            esc_html(provider)
        ));
    }

    html.push_str("<div class=\"slot-card-meta\">\n");
    if let Some(r) = rating {
        html.push_str(&format!(
            "<div class=\"slot-card-rating\">{}<span class=\"rating-value\">{}</span></div>\n",
            star_rating_html(r, "star-rating"),
            format_rating(r)
        ));
    }
    if let Some(r) = rtp {
        html.push_str(&format!("<div class=\"slot-card-rtp\">RTP: {}</div>\n", format_rtp(r)));
    }
    html.push_str("</div>\n");

    if !wager.is_empty() {
        html.push_str(&format!(
            "<div class=\"slot-card-wager\"><span class=\"wager-label\">Wager:</span><span class=\"wager-value\">{}</span></div>\n",
            esc_html(&wager)
        ));
    }
    if !excerpt.is_empty() {
        html.push_str(&format!(
            "<div class=\"slot-card-excerpt\">{}</div>\n",
            esc_html(&excerpt)
        ));
    }

    html.push_str(&format!(
        "<div class=\"slot-card-actions\"><a href=\"{permalink}\" class=\"slot-card-button\">More Info</a></div>\n</div>\n</div>\n"
    ));
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::test_support::{ctx, slot};

    #[test]
    fn tokens_for_complete_slot() {
        let t = card_tokens(&slot(), &ctx());
        assert_eq!(t.get("slot_title"), Some("Gonzo&#039;s Quest"));
        assert_eq!(t.get("rtp_value"), Some("96.0%"));
        assert_eq!(t.get("wager_range"), Some("$0.20 - $50.00"));
        assert_eq!(t.get("slot_rtp"), Some("<div class=\"slot-card-rtp\">RTP: 96.0%</div>"));
        assert_eq!(
            t.get("slot_provider"),
            Some("<div class=\"slot-card-provider\">NetEnt</div>")
        );
        assert_eq!(t.get("slot_id_value"), Some("SLOT000007"));
        assert_eq!(t.get("slot_permalink"), Some("https://casino.test/slot/gonzos-quest/"));
    }

    #[test]
    fn missing_fields_resolve_empty() {
        let mut s = slot();
        s.rtp = None;
        s.provider_name = None;
        s.star_rating = Some(0.0);
        s.min_wager = None;
        s.max_wager = None;
        s.thumbnail_url = None;
        let t = card_tokens(&s, &ctx());
        assert_eq!(t.get("rtp_value"), Some("N/A"));
        assert_eq!(t.get("slot_rtp"), Some(""));
        assert_eq!(t.get("slot_provider"), Some(""));
        assert_eq!(t.get("star_rating"), Some(""));
        assert_eq!(t.get("slot_wager"), Some(""));
        assert_eq!(
            t.get("slot_image"),
            Some("https://casino.test/assets/images/default-slot.svg")
        );
    }

    #[test]
    fn excerpt_trimmed_to_fifteen_words() {
        let mut s = slot();
        s.excerpt = (1..=20).map(|n| n.to_string()).collect::<Vec<_>>().join(" ");
        let t = card_tokens(&s, &ctx());
        assert_eq!(
            t.get("slot_excerpt"),
            Some("<div class=\"slot-card-excerpt\">1 2 3 4 5 6 7 8 9 10 11 12 13 14 15...</div>")
        );
    }

    #[test]
    fn override_uses_custom_markup() {
        let settings = Settings {
            slot_card_template_override: true,
            slot_card_template: "<li>{{slot_title}} / {{rtp_value}} / {{nope}}</li>".into(),
            ..Settings::default()
        };
        assert_eq!(
            render_card(&slot(), &settings, &ctx()),
            "<li>Gonzo&#039;s Quest / 96.0% / {{nope}}</li>"
        );
    }

    #[test]
    fn blank_override_falls_back_to_builtin() {
        let settings = Settings {
            slot_card_template_override: true,
            slot_card_template: "   \n".into(),
            ..Settings::default()
        };
        let html = render_card(&slot(), &settings, &ctx());
        assert!(html.starts_with("<div class=\"slot-card\" data-slot-id=\"SLOT000007\">"));
        assert!(html.contains("More Info"));
    }

    #[test]
    fn markup_ignored_without_override_flag() {
        let settings = Settings {
            slot_card_template: "<li>{{slot_title}}</li>".into(),
            ..Settings::default()
        };
        let html = render_card(&slot(), &settings, &ctx());
        assert!(html.contains("slot-card-content"));
    }

    #[test]
    fn builtin_card_shows_stars_and_wager() {
        let html = render_card(&slot(), &Settings::default(), &ctx());
        assert!(html.contains("<div class=\"slot-card-rating-overlay\">"));
        assert!(html.contains("<span class=\"rating-value\">4.5</span>"));
        assert!(html.contains("<span class=\"wager-value\">$0.20 - $50.00</span>"));
        assert!(html.contains("RTP: 96.0%"));
    }

    #[test]
    fn builtin_card_hides_absent_rtp() {
        let mut s = slot();
        s.rtp = Some(0.0);
        let html = render_card(&s, &Settings::default(), &ctx());
        assert!(!html.contains("slot-card-rtp"));
    }
}
