use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::listing::Sort;

/// Longest accepted cache lifetime: 30 days.
const MAX_CACHE_EXPIRATION_SECS: u64 = 30 * 24 * 60 * 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub listen_addr: String,
    /// Comma-separated allowed CORS origins. If empty or "*", allows all origins (dev mode).
    pub cors_origins: String,
    /// Base URL used to build permalinks (`{site_url}/slot/{slug}/`).
    pub site_url: String,
    /// Base URL for static assets such as the default slot image.
    pub asset_base_url: String,
    /// Directory scanned for extra `*.html` detail layouts.
    pub template_dir: Option<PathBuf>,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
    pub cache_enabled: bool,
    pub cache_expiration: Duration,
    pub default_limit: u32,
    pub default_sort: Sort,
    pub enable_grid_filters: bool,
    pub enable_pagination: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite://slots.db".to_string(),
            jwt_secret: String::new(),
            listen_addr: "0.0.0.0:3000".to_string(),
            cors_origins: "*".to_string(),
            site_url: "http://localhost:3000".to_string(),
            asset_base_url: "http://localhost:3000/assets".to_string(),
            template_dir: None,
            admin_email: None,
            admin_password: None,
            cache_enabled: false,
            cache_expiration: Duration::from_secs(3600),
            default_limit: 12,
            default_sort: Sort::Recent,
            enable_grid_filters: true,
            enable_pagination: true,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let jwt_secret = var("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;
        let site_url = var("SITE_URL")
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or(defaults.site_url);
        let asset_base_url = var("ASSET_BASE_URL")
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or_else(|| format!("{site_url}/assets"));

        Ok(Self {
            database_url: var("DATABASE_URL").unwrap_or(defaults.database_url),
            jwt_secret,
            listen_addr: var("LISTEN_ADDR").unwrap_or(defaults.listen_addr),
            cors_origins: var("CORS_ORIGINS").unwrap_or(defaults.cors_origins),
            site_url,
            asset_base_url,
            template_dir: var("SLOTS_TEMPLATE_DIR").map(PathBuf::from),
            admin_email: var("ADMIN_EMAIL"),
            admin_password: var("ADMIN_PASSWORD"),
            cache_enabled: flag("SLOTS_CACHE_ENABLED", defaults.cache_enabled)?,
            cache_expiration: var("SLOTS_CACHE_EXPIRATION")
                .map(cache_expiration)
                .transpose()?
                .unwrap_or(defaults.cache_expiration),
            default_limit: var("SLOTS_DEFAULT_LIMIT")
                .map(|v| parse_num("SLOTS_DEFAULT_LIMIT", v))
                .transpose()?
                .unwrap_or(defaults.default_limit),
            default_sort: var("SLOTS_DEFAULT_SORT")
                .map(|v| Sort::parse(&v))
                .unwrap_or(defaults.default_sort),
            enable_grid_filters: flag("SLOTS_ENABLE_GRID_FILTERS", defaults.enable_grid_filters)?,
            enable_pagination: flag("SLOTS_ENABLE_PAGINATION", defaults.enable_pagination)?,
        })
    }
}

fn var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_num<T: std::str::FromStr>(name: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { name, value })
}

fn cache_expiration(value: String) -> Result<Duration, ConfigError> {
    let secs: u64 = parse_num("SLOTS_CACHE_EXPIRATION", value.clone())?;
    if secs > MAX_CACHE_EXPIRATION_SECS {
        return Err(ConfigError::Invalid {
            name: "SLOTS_CACHE_EXPIRATION",
            value,
        });
    }
    Ok(Duration::from_secs(secs))
}

fn flag(name: &'static str, default: bool) -> Result<bool, ConfigError> {
    match var(name) {
        None => Ok(default),
        Some(value) => parse_bool(&value).ok_or(ConfigError::Invalid { name, value }),
    }
}

/// Lenient boolean parsing shared with shortcode attributes.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
