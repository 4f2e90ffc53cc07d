//! Shared test utilities for the catalog test suite.
//!
//! Provides an image-tree builder, a config pointing every output into the
//! same temp directory, and lookup helpers for catalog data.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::test_helpers::*;
//!
//! let tmp = image_tree(&["store/kodi/riddle1.jpg", "store/root.png"]);
//! let config = config_for(tmp.path());
//! let (_, catalog) = pipeline::catalog_only(&config).unwrap();
//!
//! assert_eq!(category_keys(&catalog), vec!["kodi"]);
//! assert_eq!(image_names(find_category(&catalog, "kodi")), vec!["riddle1"]);
//! ```

use std::fs;
use std::path::Path;
use tempfile::TempDir;

use crate::catalog::{Catalog, Category};
use crate::config::CatalogConfig;

// =========================================================================
// Fixture setup
// =========================================================================

/// Create a temp directory holding a placeholder file at each relative path.
///
/// The scanner only looks at names, so the contents are not real images.
pub fn image_tree(paths: &[&str]) -> TempDir {
    let tmp = TempDir::new().unwrap();
    for rel in paths {
        let path = tmp.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, "fake image").unwrap();
    }
    tmp
}

/// Default config with the scan root at `<dir>/store` and all outputs in `dir`.
pub fn config_for(dir: &Path) -> CatalogConfig {
    CatalogConfig {
        scan_root: dir.join("store"),
        catalog_path: dir.join("images.json"),
        pages_root: dir.join("image"),
        base_url: "https://example.org/phalakpages".to_string(),
        ..CatalogConfig::default()
    }
}

// =========================================================================
// Catalog lookups: panic with a clear message on miss
// =========================================================================

/// Find a category by key. Panics if not found.
pub fn find_category<'a>(catalog: &'a Catalog, key: &str) -> &'a Category {
    catalog
        .categories
        .iter()
        .find(|c| c.key == key)
        .unwrap_or_else(|| {
            let keys = category_keys(catalog);
            panic!("category '{key}' not found. Available: {keys:?}")
        })
}

// =========================================================================
// Bulk extractors
// =========================================================================

/// All category keys in catalog order.
pub fn category_keys(catalog: &Catalog) -> Vec<&str> {
    catalog.categories.iter().map(|c| c.key.as_str()).collect()
}

/// All image names in category order.
pub fn image_names(category: &Category) -> Vec<&str> {
    category.images.iter().map(|i| i.name.as_str()).collect()
}
