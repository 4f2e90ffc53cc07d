//! Catalog configuration.
//!
//! Handles loading, overriding, and validating `catalog.toml`. Values are
//! resolved in layers, each one overriding the previous:
//!
//! ```text
//! stock defaults  →  catalog.toml (optional)  →  command-line flags
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! scan_root = "phalakimages"
//! catalog_path = "images.json"
//! pages_root = "image"
//! base_url = "https://unmeshjoshi.github.io/phalakpages"
//!
//! [uncategorized]
//! policy = "drop"            # or "retain"
//! category = "Miscellaneous"
//!
//! [[exclude]]
//! kind = "starts_with"
//! pattern = "scan"
//!
//! [categories]
//! kodi = "कोडी (Riddles)"
//! ```
//!
//! Tables merge key by key, so a user `[categories]` table adds to the stock
//! mapping instead of replacing it. Arrays (`exclude`, `extensions`) replace
//! the stock value entirely.
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "catalog.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Full configuration for one catalog run.
///
/// Every component receives the parts it needs from here; nothing in the
/// pipeline reads module-level constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogConfig {
    /// Directory tree scanned for images.
    pub scan_root: PathBuf,
    /// Where the JSON catalog is written.
    pub catalog_path: PathBuf,
    /// Root of the generated share-page tree.
    pub pages_root: PathBuf,
    /// File name of each generated page.
    pub page_filename: String,
    /// Absolute site URL used for every link in the generated pages.
    pub base_url: String,
    /// Prepended to every `ImageEntry.path`, e.g. the image-store folder name
    /// when images are served from below it.
    pub image_path_prefix: String,
    /// Accepted file extensions, compared case-insensitively.
    pub extensions: Vec<String>,
    /// Remove pages written by a previous run for images that are gone.
    pub prune_stale: bool,
    /// What happens to images sitting directly in the scan root.
    pub uncategorized: UncategorizedConfig,
    /// Folder-name rules; a directory matching any of them is skipped.
    pub exclude: Vec<SegmentRule>,
    /// Category key → display name.
    pub categories: BTreeMap<String, String>,
    /// Share-page content settings.
    pub page: PageConfig,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            scan_root: PathBuf::from("phalakimages"),
            catalog_path: PathBuf::from("images.json"),
            pages_root: PathBuf::from("image"),
            page_filename: "index.html".to_string(),
            base_url: "https://unmeshjoshi.github.io/phalakpages".to_string(),
            image_path_prefix: String::new(),
            extensions: ["jpg", "jpeg", "png", "gif"]
                .iter()
                .map(|e| e.to_string())
                .collect(),
            prune_stale: true,
            uncategorized: UncategorizedConfig::default(),
            exclude: ExclusionPreset::Strict.rules(),
            categories: default_categories(),
            page: PageConfig::default(),
        }
    }
}

impl CatalogConfig {
    /// Validate values that serde alone cannot check.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ConfigError::Validation(format!(
                "base_url must be an absolute http(s) URL, got {:?}",
                self.base_url
            )));
        }
        if self.extensions.is_empty() {
            return Err(ConfigError::Validation("extensions must not be empty".into()));
        }
        for rule in &self.exclude {
            match rule {
                SegmentRule::StartsWith { pattern } | SegmentRule::Contains { pattern }
                    if pattern.is_empty() =>
                {
                    return Err(ConfigError::Validation(
                        "exclude patterns must not be empty".into(),
                    ));
                }
                _ => {}
            }
        }
        if !is_single_segment(&self.page_filename) {
            return Err(ConfigError::Validation(format!(
                "page_filename must be a plain file name, got {:?}",
                self.page_filename
            )));
        }
        if !is_single_segment(&self.page.route) {
            return Err(ConfigError::Validation(format!(
                "page.route must be a single URL segment, got {:?}",
                self.page.route
            )));
        }
        if !is_single_segment(&self.uncategorized.category) {
            return Err(ConfigError::Validation(format!(
                "uncategorized.category must be a plain folder name, got {:?}",
                self.uncategorized.category
            )));
        }
        if self.page.image_width == 0 || self.page.image_height == 0 {
            return Err(ConfigError::Validation(
                "page.image_width and page.image_height must be non-zero".into(),
            ));
        }
        Ok(())
    }

    /// Display name for a category key, falling back to the key itself.
    pub fn display_name<'a>(&'a self, key: &'a str) -> &'a str {
        self.categories.get(key).map(String::as_str).unwrap_or(key)
    }

    /// Base URL without a trailing slash.
    pub fn site_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// True if a file name carries one of the accepted extensions.
    pub fn accepts_extension(&self, ext: &str) -> bool {
        self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
    }

    /// True if a directory name matches any exclusion rule.
    pub fn is_excluded(&self, segment: &str) -> bool {
        self.exclude.iter().any(|rule| rule.matches(segment))
    }
}

fn is_single_segment(value: &str) -> bool {
    !value.is_empty()
        && value != "."
        && value != ".."
        && !value.contains('/')
        && !value.contains('\\')
}

/// A predicate over a single directory name. Matching is case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SegmentRule {
    StartsWith { pattern: String },
    Contains { pattern: String },
    /// The whole name is ASCII digits.
    AllDigits,
}

impl SegmentRule {
    pub fn starts_with(pattern: &str) -> Self {
        Self::StartsWith {
            pattern: pattern.to_string(),
        }
    }

    pub fn contains(pattern: &str) -> Self {
        Self::Contains {
            pattern: pattern.to_string(),
        }
    }

    pub fn matches(&self, segment: &str) -> bool {
        let segment = segment.to_lowercase();
        match self {
            Self::StartsWith { pattern } => segment.starts_with(&pattern.to_lowercase()),
            Self::Contains { pattern } => segment.contains(&pattern.to_lowercase()),
            Self::AllDigits => !segment.is_empty() && segment.chars().all(|c| c.is_ascii_digit()),
        }
    }
}

/// The two exclusion rule sets seen in deployed versions of the generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExclusionPreset {
    /// `scan*`, `additional*`, `*renamed*`, `*test*`, and all-digit folders.
    Strict,
    /// `scan*`, `*renamed*`, and `*test*` only.
    Legacy,
}

impl ExclusionPreset {
    pub fn rules(self) -> Vec<SegmentRule> {
        match self {
            Self::Strict => vec![
                SegmentRule::starts_with("scan"),
                SegmentRule::starts_with("additional"),
                SegmentRule::contains("renamed"),
                SegmentRule::contains("test"),
                SegmentRule::AllDigits,
            ],
            Self::Legacy => vec![
                SegmentRule::starts_with("scan"),
                SegmentRule::contains("renamed"),
                SegmentRule::contains("test"),
            ],
        }
    }
}

/// Treatment of images found directly in the scan root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum UncategorizedPolicy {
    /// Leave them out of the catalog.
    #[default]
    Drop,
    /// Catalog them under [`UncategorizedConfig::category`].
    Retain,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UncategorizedConfig {
    pub policy: UncategorizedPolicy,
    /// Category key used when the policy is `retain`.
    pub category: String,
}

impl Default for UncategorizedConfig {
    fn default() -> Self {
        Self {
            policy: UncategorizedPolicy::Drop,
            category: "Miscellaneous".to_string(),
        }
    }
}

/// Text and fixed values baked into each share page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PageConfig {
    /// `lang` attribute of the `<html>` element.
    pub lang: String,
    /// Appended to the image name in page and card titles: `{name} | {title_suffix}`.
    pub title_suffix: String,
    /// `og:site_name`.
    pub site_name: String,
    /// Appended to the category display name: `{display} - {description_suffix}`.
    pub description_suffix: String,
    /// URL segment under `base_url` where pages are published.
    pub route: String,
    /// Path the redirect script navigates to.
    pub spa_root: String,
    /// sessionStorage key holding the deep-link path for the SPA.
    pub redirect_storage_key: String,
    pub image_width: u32,
    pub image_height: u32,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            lang: "mr".to_string(),
            title_suffix: "फलक लेखन".to_string(),
            site_name: "फलक लेखन | Phalak Lekhan".to_string(),
            description_suffix: "Phalak Lekhan Collection".to_string(),
            route: "image".to_string(),
            spa_root: "/phalakpages/".to_string(),
            redirect_storage_key: "spa-redirect-path".to_string(),
            image_width: 1200,
            image_height: 630,
        }
    }
}

fn default_categories() -> BTreeMap<String, String> {
    [
        ("1", "Collection 1"),
        ("2", "Collection 2"),
        ("3", "Collection 3"),
        ("dinvishesh", "दिनविशेष (Special Days)"),
        ("vyakti", "व्यक्ती (Personalities)"),
        ("vaishishtya", "वैशिष्ट्य (Distinguished)"),
        ("kodi", "कोडी (Riddles)"),
        ("lalit", "ललित (Creative)"),
        ("additional-dina", "Additional - Special Days"),
        ("additional-vaishis", "Additional - Distinguished"),
        ("Scan", "Scanned Collection"),
        ("Scan 26-03-2014", "Scanned Collection (March 2014)"),
        ("vyakti-renamed", "Personalities (Renamed)"),
        ("vyaktitest", "Personalities (Test)"),
        ("Miscellaneous", "Miscellaneous"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Values set on the command line. `None` leaves the lower layer untouched.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub scan_root: Option<PathBuf>,
    pub catalog_path: Option<PathBuf>,
    pub pages_root: Option<PathBuf>,
    pub base_url: Option<String>,
    pub uncategorized: Option<UncategorizedPolicy>,
    pub exclusions: Option<ExclusionPreset>,
    pub no_prune: bool,
}

impl Overrides {
    /// Render the overrides as a TOML table so they merge like any other layer.
    pub fn to_toml(&self) -> toml::Value {
        let mut table = toml::value::Table::new();
        let path_value = |p: &Path| toml::Value::String(p.to_string_lossy().into_owned());

        if let Some(p) = &self.scan_root {
            table.insert("scan_root".into(), path_value(p));
        }
        if let Some(p) = &self.catalog_path {
            table.insert("catalog_path".into(), path_value(p));
        }
        if let Some(p) = &self.pages_root {
            table.insert("pages_root".into(), path_value(p));
        }
        if let Some(url) = &self.base_url {
            table.insert("base_url".into(), toml::Value::String(url.clone()));
        }
        if let Some(policy) = self.uncategorized {
            let mut uncategorized = toml::value::Table::new();
            let name = match policy {
                UncategorizedPolicy::Drop => "drop",
                UncategorizedPolicy::Retain => "retain",
            };
            uncategorized.insert("policy".into(), toml::Value::String(name.into()));
            table.insert("uncategorized".into(), toml::Value::Table(uncategorized));
        }
        if let Some(preset) = self.exclusions {
            // Rules are plain data, serialization cannot fail.
            if let Ok(rules) = toml::Value::try_from(preset.rules()) {
                table.insert("exclude".into(), rules);
            }
        }
        if self.no_prune {
            table.insert("prune_stale".into(), toml::Value::Boolean(false));
        }
        toml::Value::Table(table)
    }
}

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(CatalogConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file as a raw TOML value.
pub fn load_raw_config(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Merge the layers, deserialize, and validate.
pub fn resolve_config(layers: Vec<toml::Value>) -> Result<CatalogConfig, ConfigError> {
    let merged = layers
        .into_iter()
        .fold(stock_defaults_value(), merge_toml);
    let config: CatalogConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the effective config.
///
/// An explicit `path` must exist. Without one, [`DEFAULT_CONFIG_FILE`] in the
/// working directory is used when present, and stock defaults otherwise.
pub fn load_config(
    path: Option<&Path>,
    overrides: &Overrides,
) -> Result<CatalogConfig, ConfigError> {
    let mut layers = Vec::new();
    match path {
        Some(p) => layers.push(load_raw_config(p)?),
        None => {
            let fallback = Path::new(DEFAULT_CONFIG_FILE);
            if fallback.is_file() {
                layers.push(load_raw_config(fallback)?);
            }
        }
    }
    layers.push(overrides.to_toml());
    resolve_config(layers)
}

/// Returns a fully-commented stock `catalog.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Phalak Catalog Configuration
# ============================
# All settings are optional. Values shown below are the defaults.
# Command-line flags override this file. Unknown keys cause an error.

# Directory scanned for images. The first folder below it is the category.
scan_root = "phalakimages"

# JSON catalog consumed by the gallery front end.
catalog_path = "images.json"

# Root of the share-page tree: <pages_root>/<category>/<name>/<page_filename>
pages_root = "image"
page_filename = "index.html"

# Absolute URL the site is published at. Used for og:url and og:image.
base_url = "https://unmeshjoshi.github.io/phalakpages"

# Prepended to every image path in the catalog. Set to "phalakimages" when
# images are served from below the image-store folder.
image_path_prefix = ""

# Accepted file extensions (case-insensitive).
extensions = ["jpg", "jpeg", "png", "gif"]

# Delete pages written by an earlier run for images that no longer exist.
prune_stale = true

# ---------------------------------------------------------------------------
# Images directly in scan_root
# ---------------------------------------------------------------------------
[uncategorized]
# "drop" leaves them out; "retain" catalogs them under `category`.
policy = "drop"
category = "Miscellaneous"

# ---------------------------------------------------------------------------
# Excluded folders
# ---------------------------------------------------------------------------
# Any folder whose name matches one of these rules is skipped with all of
# its contents. Kinds: starts_with, contains, all_digits. Case-insensitive.
# The older rule set drops the "additional" and all_digits entries.
[[exclude]]
kind = "starts_with"
pattern = "scan"

[[exclude]]
kind = "starts_with"
pattern = "additional"

[[exclude]]
kind = "contains"
pattern = "renamed"

[[exclude]]
kind = "contains"
pattern = "test"

[[exclude]]
kind = "all_digits"

# ---------------------------------------------------------------------------
# Category display names
# ---------------------------------------------------------------------------
# Entries here are added to the built-in mapping. Unmapped folders use
# their own name.
[categories]
dinvishesh = "दिनविशेष (Special Days)"
vyakti = "व्यक्ती (Personalities)"
vaishishtya = "वैशिष्ट्य (Distinguished)"
kodi = "कोडी (Riddles)"
lalit = "ललित (Creative)"

# ---------------------------------------------------------------------------
# Share pages
# ---------------------------------------------------------------------------
[page]
lang = "mr"
title_suffix = "फलक लेखन"
site_name = "फलक लेखन | Phalak Lekhan"
description_suffix = "Phalak Lekhan Collection"
# Canonical page URL: <base_url>/<route>/<category>/<name>
route = "image"
# Where the redirect script sends visitors, and the sessionStorage key
# holding the requested path for the app to restore.
spa_root = "/phalakpages/"
redirect_storage_key = "spa-redirect-path"
image_width = 1200
image_height = 630
"##
}
