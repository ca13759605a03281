//! Grid and detail queries plus the shortcode renderers built on them.

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::cache::SlotsCache;
use crate::db::{self, StoreError};
use crate::middleware::nonce;
use crate::models::settings::Settings;
use crate::models::slot::Slot;
use crate::shortcode::{self, Attrs, DetailAtts, GridAtts, Segment, DETAIL_TAG, GRID_TAG};
use crate::template::card::render_card;
use crate::template::detail::DetailView;
use crate::template::escape::esc_attr;
use crate::template::RenderContext;
use crate::themes::theme_class;
use crate::AppState;

pub const SLOT_NOT_FOUND: &str = "<div class=\"slots-error\">Slot not found.</div>";
const LOAD_FAILED: &str = "<div class=\"slots-error\">Slots could not be loaded.</div>";

/// Action the grid's AJAX nonce is minted for.
pub const GRID_NONCE_ACTION: &str = "slots_nonce";

const LIMIT_CHOICES: [u32; 5] = [1, 3, 6, 9, 12];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sort {
    #[default]
    Recent,
    Random,
}

impl Sort {
    /// Anything other than `random` means most recent.
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("random") {
            Sort::Random
        } else {
            Sort::Recent
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Sort::Recent => "recent",
            Sort::Random => "random",
        }
    }
}

// ── Queries ──────────────────────────────────────────────────────────────────

pub fn grid_cache_key(sort: Sort, limit: u32, page: u32) -> String {
    if page <= 1 {
        format!("grid_{}_{}", sort.as_str(), limit)
    } else {
        format!("grid_{}_{}_p{}", sort.as_str(), limit, page)
    }
}

/// A full page suggests there may be more. A final page that happens to be
/// exactly full still reports `true`.
pub fn has_more(count: usize, limit: u32) -> bool {
    count >= limit as usize
}

pub async fn grid_slots(
    pool: &SqlitePool,
    cache: &SlotsCache,
    sort: Sort,
    limit: u32,
    page: u32,
) -> Result<Vec<Slot>, StoreError> {
    let key = grid_cache_key(sort, limit, page);
    if let Some(slots) = cache.get::<Vec<Slot>>(&key) {
        tracing::debug!("Cache hit for {key}");
        return Ok(slots);
    }
    let slots = db::slots::list_grid(pool, sort, limit, page).await?;
    cache.set(&key, &slots);
    Ok(slots)
}

pub async fn detail_slot(
    pool: &SqlitePool,
    cache: &SlotsCache,
    id: &str,
) -> Result<Option<Slot>, StoreError> {
    if id.trim().is_empty() {
        return Ok(None);
    }
    let key = format!("detail_{}", id.trim());
    if let Some(slot) = cache.get::<Slot>(&key) {
        return Ok(Some(slot));
    }
    let slot = db::slots::find_published(pool, id).await?;
    if let Some(slot) = &slot {
        cache.set(&key, slot);
    }
    Ok(slot)
}

// ── Rendering ────────────────────────────────────────────────────────────────

pub fn render_cards(slots: &[Slot], settings: &Settings, ctx: &RenderContext) -> String {
    slots
        .iter()
        .map(|slot| render_card(slot, settings, ctx))
        .collect()
}

fn selected(on: bool) -> &'static str {
    if on {
        " selected"
    } else {
        ""
    }
}

/// The grid container: optional controls, cards or the empty state, and the
/// load-more button.
pub fn render_grid(
    atts: &GridAtts,
    slots: &[Slot],
    settings: &Settings,
    ctx: &RenderContext,
    nonce: &str,
) -> String {
    let mut class = String::from("slots-container");
    for extra in [atts.class.as_str(), theme_class(settings)] {
        if !extra.is_empty() {
            class.push(' ');
            class.push_str(&esc_attr(extra));
        }
    }

    let mut html = format!(
        "<div class=\"{class}\" data-limit=\"{}\" data-sort=\"{}\">\n",
        atts.limit,
        atts.sort.as_str()
    );

    if atts.show_filters {
        html.push_str("<div class=\"slots-controls\">\n<div class=\"slots-filter\"><label for=\"slots-sort\">Sort by:</label><select id=\"slots-sort\" class=\"slots-sort-select\">");
        html.push_str(&format!(
            "<option value=\"recent\"{}>Most Recent</option><option value=\"random\"{}>Random</option></select></div>\n",
            selected(atts.sort == Sort::Recent),
            selected(atts.sort == Sort::Random)
        ));
        html.push_str("<div class=\"slots-filter\"><label for=\"slots-limit\">Show:</label><select id=\"slots-limit\" class=\"slots-limit-select\">");
        for n in LIMIT_CHOICES {
            html.push_str(&format!(
                "<option value=\"{n}\"{}>{n} {}</option>",
                selected(atts.limit == n),
                if n == 1 { "Slot" } else { "Slots" }
            ));
        }
        html.push_str("</select></div>\n</div>\n");
    }

    if slots.is_empty() {
        html.push_str("<div class=\"slots-empty\"><div class=\"slots-empty-icon\">🎰</div><h3>No slots found</h3><p>Try adjusting your filters or check back later for new slots.</p></div>\n");
    } else {
        html.push_str(&format!(
            "<div class=\"slots-grid\" id=\"slots-grid\" data-nonce=\"{}\">\n",
            esc_attr(nonce)
        ));
        html.push_str(&render_cards(slots, settings, ctx));
        html.push_str("</div>\n");

        if atts.show_pagination && has_more(slots.len(), atts.limit) {
            html.push_str(&format!(
                "<div class=\"slots-pagination\"><button class=\"load-more-slots\" data-page=\"1\" data-limit=\"{}\" data-sort=\"{}\">Load More Slots</button></div>\n",
                atts.limit,
                atts.sort.as_str()
            ));
        }
    }

    html.push_str("</div>\n");
    html
}

// ── Shortcodes ───────────────────────────────────────────────────────────────

pub fn grid_nonce(state: &AppState) -> String {
    nonce::create_nonce(GRID_NONCE_ACTION, None, &state.config.jwt_secret).unwrap_or_else(|e| {
        tracing::error!("Failed to mint grid nonce: {e}");
        String::new()
    })
}

pub async fn grid_shortcode(state: &AppState, attrs: &Attrs) -> String {
    let atts = GridAtts::from_attrs(attrs, &state.config);
    let loaded = async {
        let settings = db::settings::load(&state.db).await?;
        let slots = grid_slots(&state.db, &state.cache, atts.sort, atts.limit, 1).await?;
        Ok::<_, StoreError>((settings, slots))
    }
    .await;

    match loaded {
        Ok((settings, slots)) => render_grid(
            &atts,
            &slots,
            &settings,
            &RenderContext::from_config(&state.config),
            &grid_nonce(state),
        ),
        Err(e) => {
            tracing::error!("Grid query failed: {e}");
            LOAD_FAILED.to_string()
        }
    }
}

pub async fn detail_shortcode(state: &AppState, attrs: &Attrs) -> String {
    let atts = DetailAtts::from_attrs(attrs);
    let loaded = async {
        let slot = detail_slot(&state.db, &state.cache, &atts.id).await?;
        let settings = db::settings::load(&state.db).await?;
        Ok::<_, StoreError>((slot, settings))
    }
    .await;

    match loaded {
        Ok((Some(slot), settings)) => render_detail(state, &slot, &settings, &atts),
        Ok((None, _)) => SLOT_NOT_FOUND.to_string(),
        Err(e) => {
            tracing::error!("Detail query failed: {e}");
            LOAD_FAILED.to_string()
        }
    }
}

pub fn render_detail(state: &AppState, slot: &Slot, settings: &Settings, atts: &DetailAtts) -> String {
    let key = state.templates.select(atts.template.as_deref(), settings);
    let view = DetailView {
        flags: atts.flags,
        class: atts.class.clone(),
        theme_class: theme_class(settings).to_string(),
    };
    state
        .templates
        .render(key, slot, settings, &view, &RenderContext::from_config(&state.config))
}

/// Expand every `[slots_grid]` and `[slot_detail]` in `text`; other
/// shortcodes and text pass through.
pub async fn expand(state: &AppState, text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for segment in shortcode::segments(text, &[GRID_TAG, DETAIL_TAG]) {
        match segment {
            Segment::Text(t) => out.push_str(t),
            Segment::Shortcode { name, attrs } if name == GRID_TAG => {
                out.push_str(&grid_shortcode(state, &attrs).await)
            }
            Segment::Shortcode { attrs, .. } => out.push_str(&detail_shortcode(state, &attrs).await),
        }
    }
    out
}
