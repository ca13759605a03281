//! Named detail layouts.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;
use utoipa::ToSchema;

use crate::models::settings::Settings;
use crate::models::slot::Slot;

use super::detail::{render_builtin, render_markup, DetailView};
use super::RenderContext;

pub const DEFAULT_KEY: &str = "default";
pub const EDITOR_KEY: &str = "editor";

const TEMPLATE_NOT_FOUND: &str = "<div class=\"slots-error\">Template not found.</div>";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Layout {
    /// The fixed built-in detail layout.
    BuiltIn,
    /// Markup stored in settings.
    Editor,
    /// Token markup read from a layout file at startup.
    File(String),
    /// A layout file that could not be read.
    Unreadable,
}

#[derive(Debug, Clone)]
pub struct TemplateEntry {
    pub name: String,
    pub layout: Layout,
}

/// A selectable layout as listed to editors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct TemplateInfo {
    pub key: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct TemplateRegistry {
    templates: BTreeMap<String, TemplateEntry>,
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        let mut templates = BTreeMap::new();
        templates.insert(
            DEFAULT_KEY.to_string(),
            TemplateEntry {
                name: "Default".to_string(),
                layout: Layout::BuiltIn,
            },
        );
        templates.insert(
            EDITOR_KEY.to_string(),
            TemplateEntry {
                name: "Custom Editor".to_string(),
                layout: Layout::Editor,
            },
        );
        Self { templates }
    }
}

impl TemplateRegistry {
    /// Built-in layouts plus every `*.html` file in `dir`, keyed by file stem.
    /// Built-in keys cannot be shadowed.
    pub fn load_dir(dir: &Path) -> std::io::Result<Self> {
        let mut registry = Self::default();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("html") {
                continue;
            }
            let Some(key) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
                continue;
            };
            let layout = match std::fs::read_to_string(&path) {
                Ok(markup) => Layout::File(markup),
                Err(e) => {
                    tracing::warn!("Failed to read template {}: {e}", path.display());
                    Layout::Unreadable
                }
            };
            if !registry.register(&key, &key, layout) {
                tracing::warn!("Ignoring template {} (reserved key)", path.display());
            }
        }
        tracing::info!("Loaded {} detail templates", registry.templates.len());
        Ok(registry)
    }

    /// Add a layout. Returns false for an empty or reserved key.
    pub fn register(&mut self, key: &str, name: &str, layout: Layout) -> bool {
        let key = key.trim();
        if key.is_empty() || key == DEFAULT_KEY || key == EDITOR_KEY {
            return false;
        }
        self.templates.insert(
            key.to_string(),
            TemplateEntry {
                name: name.to_string(),
                layout,
            },
        );
        true
    }

    pub fn contains(&self, key: &str) -> bool {
        self.templates.contains_key(key)
    }

    /// Known key, else `default`.
    pub fn validate_key<'a>(&self, key: &'a str) -> &'a str {
        let key = key.trim();
        if !key.is_empty() && self.contains(key) {
            key
        } else {
            DEFAULT_KEY
        }
    }

    /// Every registered layout, ordered by key.
    pub fn keys(&self) -> impl Iterator<Item = (&str, &str)> {
        self.templates
            .iter()
            .map(|(k, v)| (k.as_str(), v.name.as_str()))
    }

    pub fn list(&self) -> Vec<TemplateInfo> {
        self.keys()
            .map(|(key, name)| TemplateInfo {
                key: key.to_string(),
                name: name.to_string(),
            })
            .collect()
    }

    /// Layout key for a detail render: an explicit request wins, otherwise
    /// the editor layout when its override is active.
    pub fn select<'a>(&self, requested: Option<&'a str>, settings: &Settings) -> &'a str {
        match requested.map(str::trim).filter(|k| !k.is_empty()) {
            Some(key) => self.validate_key(key),
            None if settings.editor_override().is_some() => EDITOR_KEY,
            None => DEFAULT_KEY,
        }
    }

    pub fn render(
        &self,
        key: &str,
        slot: &Slot,
        settings: &Settings,
        view: &DetailView,
        ctx: &RenderContext,
    ) -> String {
        let layout = self
            .templates
            .get(self.validate_key(key))
            .map(|entry| &entry.layout)
            .unwrap_or(&Layout::BuiltIn);

        match layout {
            Layout::BuiltIn => render_builtin(slot, view, ctx),
            Layout::Editor => render_markup(&settings.slot_editor_markup, slot, view, ctx),
            Layout::File(markup) => render_markup(markup, slot, view, ctx),
            Layout::Unreadable => TEMPLATE_NOT_FOUND.to_string(),
        }
    }
}
