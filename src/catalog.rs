//! Categorization and the JSON catalog.
//!
//! Stage 2 of the catalog pipeline. Groups scanned images by their first
//! folder below the scan root, resolves display names, sorts, and writes the
//! `images.json` document the gallery front end loads:
//!
//! ```json
//! [
//!   {
//!     "category": "kodi",
//!     "displayName": "कोडी (Riddles)",
//!     "images": [
//!       { "path": "kodi/riddle1.jpg", "name": "riddle1", "filename": "riddle1.jpg" }
//!     ]
//!   }
//! ]
//! ```
//!
//! ## Ordering
//!
//! Categories are sorted by display name and images by name, both by plain
//! code-point comparison. Ties keep scan order, which is itself stable, so
//! the document is byte-identical across runs over an unchanged tree.
//!
//! ## Root-level images
//!
//! Images sitting directly in the scan root go to an internal uncategorized
//! bucket. [`UncategorizedPolicy::Drop`] leaves them out;
//! [`UncategorizedPolicy::Retain`] files them under the configured category
//! key (merging with a real folder of that name, if one exists).

use crate::config::{CatalogConfig, UncategorizedPolicy};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogWriteError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Cannot write catalog {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum CatalogReadError {
    #[error("Cannot read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Malformed catalog {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// One image in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageEntry {
    /// Forward-slash path used to build the image URL.
    pub path: String,
    /// File name without extension.
    pub name: String,
    /// Full file name.
    pub filename: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Raw folder name.
    #[serde(rename = "category")]
    pub key: String,
    #[serde(rename = "displayName")]
    pub display_name: String,
    pub images: Vec<ImageEntry>,
}

/// The full catalog, serialized as a bare JSON array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    pub categories: Vec<Category>,
}

impl Catalog {
    pub fn image_count(&self) -> usize {
        self.categories.iter().map(|c| c.images.len()).sum()
    }

    /// Serialize with 2-space indentation. Non-ASCII text is written as-is.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write the catalog, replacing any previous file.
    ///
    /// The document is written to a sibling temp file first and renamed into
    /// place, so readers never see a half-written catalog.
    pub fn write(&self, path: &Path) -> Result<(), CatalogWriteError> {
        let json = self.to_json()?;
        let io_err = |source: std::io::Error| CatalogWriteError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
        tmp_name.push(".tmp");
        let tmp_path = path.with_file_name(tmp_name);

        fs::write(&tmp_path, json)
            .and_then(|()| fs::rename(&tmp_path, path))
            .map_err(|source| {
                let _ = fs::remove_file(&tmp_path);
                io_err(source)
            })
    }

    /// Read a catalog written by [`Catalog::write`].
    pub fn read(path: &Path) -> Result<Self, CatalogReadError> {
        let content = fs::read_to_string(path).map_err(|source| CatalogReadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| CatalogReadError::Json {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Bucket identity. Root-level images never share a key with a real folder
/// until the retain policy names one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum BucketKey {
    Uncategorized,
    Folder(String),
}

/// Group scanned paths (relative to the scan root) into a sorted catalog.
pub fn build_catalog(paths: &[PathBuf], config: &CatalogConfig) -> Catalog {
    let mut buckets: Vec<(BucketKey, Vec<ImageEntry>)> = Vec::new();
    let mut index: HashMap<BucketKey, usize> = HashMap::new();

    for path in paths {
        let segments: Vec<String> = path
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        let Some(filename) = segments.last() else {
            continue;
        };

        let key = if segments.len() == 1 {
            BucketKey::Uncategorized
        } else {
            BucketKey::Folder(segments[0].clone())
        };

        let entry = ImageEntry {
            path: entry_path(&config.image_path_prefix, &segments),
            name: file_stem(filename),
            filename: filename.clone(),
        };

        let slot = *index.entry(key.clone()).or_insert_with(|| {
            buckets.push((key, Vec::new()));
            buckets.len() - 1
        });
        buckets[slot].1.push(entry);
    }

    let mut categories: Vec<Category> = Vec::new();
    for (key, images) in buckets {
        let key = match key {
            BucketKey::Folder(name) => name,
            BucketKey::Uncategorized => match config.uncategorized.policy {
                UncategorizedPolicy::Drop => continue,
                UncategorizedPolicy::Retain => config.uncategorized.category.clone(),
            },
        };

        match categories.iter_mut().find(|c| c.key == key) {
            Some(existing) => existing.images.extend(images),
            None => categories.push(Category {
                display_name: config.display_name(&key).to_string(),
                key,
                images,
            }),
        }
    }

    for category in &mut categories {
        category.images.sort_by(|a, b| a.name.cmp(&b.name));
    }
    categories.sort_by(|a, b| a.display_name.cmp(&b.display_name));

    Catalog { categories }
}

fn entry_path(prefix: &str, segments: &[String]) -> String {
    let rel = segments.join("/");
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        rel
    } else {
        format!("{prefix}/{rel}")
    }
}

/// File name without its last extension. Dotfiles keep their full name.
fn file_stem(filename: &str) -> String {
    Path::new(filename)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| filename.to_string())
}
