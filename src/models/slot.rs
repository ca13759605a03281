use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::template::escape::{sanitize_text_field, strip_tags, trim_words};

pub const SLOT_ID_PREFIX: &str = "SLOT";
pub const SLOT_ID_DIGITS: usize = 6;

// ── Database rows ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum SlotStatus {
    Publish,
    Draft,
}

impl SlotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotStatus::Publish => "publish",
            SlotStatus::Draft => "draft",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Slot {
    pub id: i64,
    pub slot_id: Option<String>,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: String,
    pub status: SlotStatus,
    pub thumbnail_url: Option<String>,
    pub star_rating: Option<f64>,
    pub provider_name: Option<String>,
    pub rtp: Option<f64>,
    pub min_wager: Option<f64>,
    pub max_wager: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl Slot {
    pub fn permalink(&self, site_url: &str) -> String {
        format!("{}/slot/{}/", site_url.trim_end_matches('/'), self.slug)
    }

    /// The stored excerpt, or the first 55 words of the content when none was written.
    pub fn effective_excerpt(&self) -> String {
        if !self.excerpt.trim().is_empty() {
            return self.excerpt.clone();
        }
        trim_words(&self.content, 55, " [&hellip;]")
    }

    pub fn is_published(&self) -> bool {
        self.status == SlotStatus::Publish
    }
}

/// Format a numeric counter as a slot identifier, e.g. `SLOT000042`.
pub fn format_slot_id(counter: u64) -> String {
    format!("{SLOT_ID_PREFIX}{counter:0width$}", width = SLOT_ID_DIGITS)
}

/// URL slug from a title: lowercase ASCII alphanumerics separated by `-`.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;
    for c in strip_tags(title).chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        slug.push_str("slot");
    }
    slug
}

// ── Metadata validation ──────────────────────────────────────────────────────

/// Ratings snap to half stars; anything outside 1–5 is rejected.
pub fn validate_rating(value: f64) -> Option<f64> {
    if !value.is_finite() || !(1.0..=5.0).contains(&value) {
        return None;
    }
    Some((value * 2.0).round() / 2.0)
}

pub fn validate_rtp(value: f64) -> Option<f64> {
    if !value.is_finite() || !(0.0..=100.0).contains(&value) {
        return None;
    }
    Some((value * 10.0).round() / 10.0)
}

pub fn validate_wager(value: f64) -> Option<f64> {
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    Some((value * 100.0).round() / 100.0)
}

/// A partial metadata write. `None` keeps the stored value, `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetaUpdate {
    pub star_rating: Option<Option<f64>>,
    pub provider_name: Option<Option<String>>,
    pub rtp: Option<Option<f64>>,
    pub min_wager: Option<Option<f64>>,
    pub max_wager: Option<Option<f64>>,
}

fn provider_value(raw: &str) -> Option<String> {
    let cleaned = sanitize_text_field(raw);
    (!cleaned.is_empty()).then_some(cleaned)
}

// ── API types ────────────────────────────────────────────────────────────────

/// Metadata accepted by the JSON admin endpoints. Out-of-range numbers are
/// ignored and the stored value kept.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct SlotMetaInput {
    /// 1–5 in half-star steps
    pub star_rating: Option<f64>,
    pub provider_name: Option<String>,
    /// Return-to-player percentage, 0–100
    pub rtp: Option<f64>,
    pub min_wager: Option<f64>,
    pub max_wager: Option<f64>,
}

impl SlotMetaInput {
    pub fn to_update(&self) -> MetaUpdate {
        MetaUpdate {
            star_rating: self.star_rating.and_then(validate_rating).map(Some),
            provider_name: self.provider_name.as_deref().map(provider_value),
            rtp: self.rtp.and_then(validate_rtp).map(Some),
            min_wager: self.min_wager.and_then(validate_wager).map(Some),
            max_wager: self.max_wager.and_then(validate_wager).map(Some),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSlotRequest {
    pub title: String,
    pub slug: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub excerpt: String,
    pub status: Option<SlotStatus>,
    pub thumbnail_url: Option<String>,
    #[serde(flatten)]
    pub meta: SlotMetaInput,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateSlotRequest {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub status: Option<SlotStatus>,
    /// Empty string removes the thumbnail
    pub thumbnail_url: Option<String>,
    #[serde(flatten)]
    pub meta: SlotMetaInput,
}

/// Fields of a new slot after request validation.
#[derive(Debug, Clone)]
pub struct NewSlot {
    pub title: String,
    pub slug: Option<String>,
    pub content: String,
    pub excerpt: String,
    pub status: SlotStatus,
    pub thumbnail_url: Option<String>,
    pub meta: MetaUpdate,
}

impl NewSlot {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            slug: None,
            content: String::new(),
            excerpt: String::new(),
            status: SlotStatus::Publish,
            thumbnail_url: None,
            meta: MetaUpdate::default(),
        }
    }
}

impl From<CreateSlotRequest> for NewSlot {
    fn from(req: CreateSlotRequest) -> Self {
        let meta = req.meta.to_update();
        Self {
            title: sanitize_text_field(&req.title),
            slug: req.slug.map(|s| slugify(&s)),
            content: req.content,
            excerpt: req.excerpt,
            status: req.status.unwrap_or(SlotStatus::Publish),
            thumbnail_url: req.thumbnail_url.filter(|u| !u.trim().is_empty()),
            meta,
        }
    }
}

/// Column changes for an existing slot. `None` leaves a column alone.
#[derive(Debug, Clone, Default)]
pub struct SlotChanges {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub status: Option<SlotStatus>,
    pub thumbnail_url: Option<Option<String>>,
    pub meta: MetaUpdate,
}

impl From<UpdateSlotRequest> for SlotChanges {
    fn from(req: UpdateSlotRequest) -> Self {
        let meta = req.meta.to_update();
        Self {
            title: req
                .title
                .map(|t| sanitize_text_field(&t))
                .filter(|t| !t.is_empty()),
            slug: req.slug.map(|s| slugify(&s)),
            content: req.content,
            excerpt: req.excerpt,
            status: req.status,
            thumbnail_url: req
                .thumbnail_url
                .map(|u| Some(u).filter(|u| !u.trim().is_empty())),
            meta,
        }
    }
}

/// Admin response after a write.
#[derive(Debug, Serialize, ToSchema)]
pub struct SlotSummary {
    pub id: i64,
    pub slot_id: Option<String>,
    pub title: String,
    pub slug: String,
    pub status: SlotStatus,
    pub star_rating: Option<f64>,
    pub provider_name: Option<String>,
    pub rtp: Option<f64>,
    pub min_wager: Option<f64>,
    pub max_wager: Option<f64>,
    pub modified_at: DateTime<Utc>,
}

impl From<Slot> for SlotSummary {
    fn from(s: Slot) -> Self {
        Self {
            id: s.id,
            slot_id: s.slot_id,
            title: s.title,
            slug: s.slug,
            status: s.status,
            star_rating: s.star_rating,
            provider_name: s.provider_name,
            rtp: s.rtp,
            min_wager: s.min_wager,
            max_wager: s.max_wager,
            modified_at: s.modified_at,
        }
    }
}

// ── REST projection ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrderBy {
    #[default]
    Date,
    Title,
    Rating,
    Provider,
    Rtp,
}

impl OrderBy {
    /// Column to sort on and whether rows lacking it are excluded.
    pub fn column(&self) -> (&'static str, bool) {
        match self {
            OrderBy::Date => ("created_at", false),
            OrderBy::Title => ("title", false),
            OrderBy::Rating => ("star_rating", true),
            OrderBy::Provider => ("provider_name", true),
            OrderBy::Rtp => ("rtp", true),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ToSchema)]
pub enum Direction {
    #[serde(rename = "ASC")]
    Asc,
    #[default]
    #[serde(rename = "DESC")]
    Desc,
}

impl Direction {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// Validated filters for the public listing.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotFilter {
    pub slot_id: Option<String>,
    pub provider: Option<String>,
    /// Inclusive rating bounds; only applied when narrower than 0–5.
    pub min_rating: f64,
    pub max_rating: f64,
    pub order_by: OrderBy,
    pub direction: Direction,
}

impl Default for SlotFilter {
    fn default() -> Self {
        Self {
            slot_id: None,
            provider: None,
            min_rating: 0.0,
            max_rating: 5.0,
            order_by: OrderBy::default(),
            direction: Direction::default(),
        }
    }
}

impl SlotFilter {
    pub fn rating_bounded(&self) -> bool {
        self.min_rating > 0.0 || self.max_rating < 5.0
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FeaturedImage {
    pub url: String,
    pub alt: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SlotMetaResource {
    pub star_rating: Option<f64>,
    pub provider_name: Option<String>,
    pub rtp: Option<f64>,
    pub min_wager: Option<f64>,
    pub max_wager: Option<f64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SlotLinks {
    #[serde(rename = "self")]
    pub self_link: String,
    pub collection: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SlotResource {
    pub id: i64,
    pub slot_id: Option<String>,
    pub title: String,
    pub description: String,
    pub content: String,
    pub slug: String,
    /// RFC 3339
    pub date: String,
    pub modified: String,
    pub status: SlotStatus,
    pub featured_image: Option<FeaturedImage>,
    pub meta: SlotMetaResource,
    pub links: SlotLinks,
}

impl SlotResource {
    pub fn from_slot(slot: Slot, site_url: &str) -> Self {
        let base = format!("{}/slots/v1/slots", site_url.trim_end_matches('/'));
        Self {
            id: slot.id,
            slot_id: slot.slot_id.clone().filter(|s| !s.is_empty()),
            description: slot.effective_excerpt(),
            featured_image: slot
                .thumbnail_url
                .clone()
                .filter(|u| !u.trim().is_empty())
                .map(|url| FeaturedImage {
                    url,
                    alt: slot.title.clone(),
                }),
            meta: SlotMetaResource {
                star_rating: crate::template::format::present(slot.star_rating),
                provider_name: slot.provider_name.clone().filter(|p| !p.is_empty()),
                rtp: crate::template::format::present(slot.rtp),
                min_wager: crate::template::format::present(slot.min_wager),
                max_wager: crate::template::format::present(slot.max_wager),
            },
            links: SlotLinks {
                self_link: format!("{base}/{}", slot.id),
                collection: base,
            },
            date: slot.created_at.to_rfc3339(),
            modified: slot.modified_at.to_rfc3339(),
            status: slot.status,
            title: slot.title,
            content: slot.content,
            slug: slot.slug,
        }
    }
}

// ── Meta box form ────────────────────────────────────────────────────────────

/// Form-encoded body posted by the metadata box. Every field is raw text so
/// malformed numbers can be ignored instead of rejecting the whole request.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct MetaBoxForm {
    pub slots_meta_box_nonce: Option<String>,
    pub slots_star_rating: Option<String>,
    pub slots_provider_name: Option<String>,
    pub slots_rtp: Option<String>,
    pub slots_min_wager: Option<String>,
    pub slots_max_wager: Option<String>,
}

impl MetaBoxForm {
    /// Missing and malformed fields keep the stored value; an empty numeric
    /// field clears it.
    pub fn to_update(&self) -> MetaUpdate {
        fn numeric(raw: Option<&str>, validate: fn(f64) -> Option<f64>) -> Option<Option<f64>> {
            let raw = raw?.trim();
            if raw.is_empty() {
                return Some(None);
            }
            raw.parse::<f64>().ok().and_then(validate).map(Some)
        }

        MetaUpdate {
            star_rating: self
                .slots_star_rating
                .as_deref()
                .and_then(|r| r.trim().parse::<f64>().ok())
                .and_then(validate_rating)
                .map(Some),
            provider_name: self.slots_provider_name.as_deref().map(provider_value),
            rtp: numeric(self.slots_rtp.as_deref(), validate_rtp),
            min_wager: numeric(self.slots_min_wager.as_deref(), validate_wager),
            max_wager: numeric(self.slots_max_wager.as_deref(), validate_wager),
        }
    }
}
