//! Single-slot detail rendering.

use crate::models::slot::Slot;

use super::escape::{autop, esc_attr, esc_html, esc_url};
use super::format::{format_date, format_rating, format_rtp, format_wager, present, star_rating_html};
use super::{substitute, DisplayFlags, RenderContext, Tokens};

/// Markup used by the editor layout when no custom markup is stored.
pub const DEFAULT_DETAIL_MARKUP: &str = r#"<div class="slot-detail-container">
    <div class="slot-detail-header">
        <div class="slot-detail-image">
            <img src="{{slot_image}}" alt="{{slot_title}}" class="slot-detail-main-image">
        </div>
        <div class="slot-detail-info">
            <h1 class="slot-detail-title">{{slot_title}}</h1>
            <div class="slot-detail-provider">Provider: {{slot_provider}}</div>
            <div class="slot-detail-rating">Rating: {{slot_rating}}</div>
            <div class="slot-detail-rtp">RTP: {{slot_rtp}}</div>
            <div class="slot-detail-wager">Wager Range: {{slot_wager}}</div>
            <div class="slot-detail-id">Slot ID: {{slot_id}}</div>
        </div>
    </div>
    <div class="slot-detail-description">{{slot_description}}</div>
    <div class="slot-detail-actions">
        <a href="{{slot_permalink}}" class="slot-detail-button primary">Play Now</a>
    </div>
</div>"#;

/// Everything a detail render needs besides the slot.
#[derive(Debug, Clone, Default)]
pub struct DetailView {
    pub flags: DisplayFlags,
    /// Extra class from the shortcode's `class` attribute.
    pub class: String,
    /// Class of the active theme, empty for the default theme.
    pub theme_class: String,
}

impl DetailView {
    fn container_class(&self) -> String {
        let mut class = String::from("slot-detail-container");
        for extra in [self.class.trim(), self.theme_class.trim()] {
            if !extra.is_empty() {
                class.push(' ');
                class.push_str(&esc_attr(extra));
            }
        }
        class
    }
}

fn image_url(slot: &Slot, ctx: &RenderContext) -> String {
    slot.thumbnail_url
        .as_deref()
        .filter(|u| !u.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| ctx.default_image())
}

/// Content as paragraphs, else the excerpt.
fn description(slot: &Slot) -> String {
    if !slot.content.trim().is_empty() {
        autop(&slot.content)
    } else if !slot.excerpt.trim().is_empty() {
        autop(&slot.excerpt)
    } else {
        String::new()
    }
}

pub fn detail_tokens(slot: &Slot, flags: &DisplayFlags, ctx: &RenderContext) -> Tokens {
    let rating = present(slot.star_rating);
    let rtp = present(slot.rtp);
    let provider = slot.provider_name.as_deref().filter(|p| !p.is_empty());
    let slot_id = slot.slot_id.as_deref().unwrap_or("");
    let wager = if flags.show_wager {
        format_wager(slot.min_wager, slot.max_wager)
    } else {
        String::new()
    };

    let mut t = Tokens::new();
    t.insert("slot_image", esc_url(&image_url(slot, ctx)));
    t.insert("slot_title", esc_html(&slot.title));
    t.insert(
        "slot_provider",
        provider
            .filter(|_| flags.show_provider)
            .map(|p| esc_html(p).into_owned())
            .unwrap_or_default(),
    );
    t.insert(
        "slot_rating",
        rating
            .filter(|_| flags.show_rating)
            .map(|r| format!("{}/5", format_rating(r)))
            .unwrap_or_default(),
    );
    t.insert(
        "slot_rtp",
        rtp.filter(|_| flags.show_rtp).map(format_rtp).unwrap_or_default(),
    );
    t.insert("slot_wager", esc_html(&wager));
    t.insert("slot_id", esc_html(slot_id));
    t.insert(
        "slot_description",
        if flags.show_description {
            description(slot)
        } else {
            String::new()
        },
    );
    t.insert("slot_permalink", esc_url(&slot.permalink(&ctx.site_url)));
    t.insert("slot_excerpt", autop(&slot.excerpt));
    t.insert("slot_content", autop(&slot.content));
    t.insert("slot_modified_date", format_date(&slot.modified_at));
    t.insert(
        "star_rating",
        star_rating_html(rating.unwrap_or(0.0), "star-rating"),
    );
    t.insert("rtp_value", rtp.map(format_rtp).unwrap_or_else(|| "N/A".to_string()));
    t.insert("wager_range", esc_html(&wager));
    t.insert("provider_name", esc_html(provider.unwrap_or("")));
    t.insert("slot_id_value", esc_html(slot_id));
    t
}

/// Render admin-supplied (or file-supplied) markup against a slot.
pub fn render_markup(markup: &str, slot: &Slot, view: &DetailView, ctx: &RenderContext) -> String {
    let markup = if markup.trim().is_empty() {
        DEFAULT_DETAIL_MARKUP
    } else {
        markup
    };
    substitute(markup, &detail_tokens(slot, &view.flags, ctx))
}

/// The fixed detail layout.
pub fn render_builtin(slot: &Slot, view: &DetailView, ctx: &RenderContext) -> String {
    let flags = &view.flags;
    let rating = present(slot.star_rating);
    let rtp = present(slot.rtp);
    let wager = format_wager(slot.min_wager, slot.max_wager);

    let mut html = format!(
        "<div class=\"{}\">\n<div class=\"slot-detail-header\">\n<div class=\"slot-detail-image\"><img src=\"{}\" alt=\"{}\" class=\"slot-detail-main-image\"></div>\n<div class=\"slot-detail-info\">\n<h1 class=\"slot-detail-title\">{}</h1>\n",
        view.container_class(),
        esc_url(&image_url(slot, ctx)),
        esc_attr(&slot.title),
        esc_html(&slot.title),
    );

    if let Some(provider) = slot
        .provider_name
        .as_deref()
        .filter(|p| flags.show_provider && !p.is_empty())
    {
        html.push_str(&format!(
            "<div class=\"slot-detail-provider\"><span class=\"provider-label\">Provider:</span> <span class=\"provider-name\">{}</span></div>\n",
            esc_html(provider)
        ));
    }
    if let Some(r) = rating.filter(|_| flags.show_rating) {
        html.push_str(&format!(
            "<div class=\"slot-detail-rating\"><span class=\"rating-label\">Rating:</span> <div class=\"rating-display\">{}<span class=\"rating-value\">{}/5</span></div></div>\n",
            star_rating_html(r, "star-rating"),
            format_rating(r)
        ));
    }
    if let Some(r) = rtp.filter(|_| flags.show_rtp) {
        html.push_str(&format!(
            "<div class=\"slot-detail-rtp\"><span class=\"rtp-label\">RTP:</span> <span class=\"rtp-value\">{}</span></div>\n",
            format_rtp(r)
        ));
    }
    if flags.show_wager && !wager.is_empty() {
        html.push_str(&format!(
            "<div class=\"slot-detail-wager\"><span class=\"wager-label\">Wager Range:</span> <span class=\"wager-value\">{}</span></div>\n",
            esc_html(&wager)
        ));
    }
    if let Some(id) = slot.slot_id.as_deref().filter(|id| !id.is_empty()) {
        html.push_str(&format!(
            "<div class=\"slot-detail-id\"><span class=\"id-label\">Slot ID:</span> <span class=\"id-value\">{}</span></div>\n",
            esc_html(id)
        ));
    }
    html.push_str("</div>\n</div>\n");

    if flags.show_description {
        let (heading, body) = if !slot.content.trim().is_empty() {
            ("Description", autop(&slot.content))
        } else if !slot.excerpt.trim().is_empty() {
            ("Overview", autop(&slot.excerpt))
        } else {
            ("", String::new())
        };
        if !body.is_empty() {
            html.push_str(&format!(
                "<div class=\"slot-detail-content\">\n<h2>{heading}</h2>\n<div class=\"slot-detail-description\">{body}</div>\n</div>\n"
            ));
        }
    }

    html.push_str(&format!(
        "<div class=\"slot-detail-actions\">\n<a href=\"{}\" class=\"slot-detail-button primary\">Play Now</a>\n<a href=\"{}\" class=\"slot-detail-button secondary\">Browse More Slots</a>\n</div>\n",
        esc_url(&slot.permalink(&ctx.site_url)),
        esc_url(&ctx.browse_url()),
    ));
    html.push_str(&format!(
        "<div class=\"slot-detail-meta\"><div class=\"meta-item\"><span class=\"meta-label\">Last Updated:</span> <span class=\"meta-value\">{}</span></div></div>\n</div>\n",
        format_date(&slot.modified_at)
    ));
    html
}
