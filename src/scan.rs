//! Filesystem scanning.
//!
//! Stage 1 of the catalog pipeline. Walks the image store and returns every
//! accepted image as a path relative to the scan root:
//!
//! ```text
//! phalakimages/                    # scan root
//! ├── root.png                     # root-level → uncategorized bucket
//! ├── kodi/                        # category "kodi"
//! │   ├── riddle1.jpg
//! │   └── extra/riddle2.png        # still category "kodi"
//! ├── scan-old/                    # excluded folder, skipped entirely
//! │   └── a.png
//! └── 2014/                        # excluded by the all-digits rule
//! ```
//!
//! ## Rules
//!
//! - A file is accepted when its extension is in `extensions`
//!   (case-insensitive). Everything else is ignored.
//! - A directory whose name matches any `exclude` rule is not descended into,
//!   at any depth. The scan root itself is never tested.
//! - Symlinks to files are accepted like regular files. Symlinked
//!   directories are not followed.
//! - Directories are visited depth-first in file-name order, so repeated runs
//!   over the same tree return the same sequence.

use crate::config::CatalogConfig;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Scan root not found: {0}")]
    RootNotFound(PathBuf),
    #[error("Scan root is not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("Cannot read directory: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Collect accepted image paths under `root`, relative to it.
pub fn scan(root: &Path, config: &CatalogConfig) -> Result<Vec<PathBuf>, ScanError> {
    if !root.exists() {
        return Err(ScanError::RootNotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_excluded_dir(entry, config));

    let mut images = Vec::new();
    for result in walker {
        let entry = result?;
        if is_file(&entry) && is_image(entry.path(), config) {
            // strip_prefix can't fail, every entry is below `root`
            if let Ok(rel) = entry.path().strip_prefix(root) {
                images.push(rel.to_path_buf());
            }
        }
    }
    Ok(images)
}

fn is_excluded_dir(entry: &DirEntry, config: &CatalogConfig) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && config.is_excluded(&entry.file_name().to_string_lossy())
}

/// Regular files, plus symlinks that resolve to one. Symlinked directories
/// are not descended into.
fn is_file(entry: &DirEntry) -> bool {
    let file_type = entry.file_type();
    file_type.is_file() || (file_type.is_symlink() && entry.path().is_file())
}

fn is_image(path: &Path, config: &CatalogConfig) -> bool {
    path.extension()
        .map(|e| config.accepts_extension(&e.to_string_lossy()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExclusionPreset;
    use crate::test_helpers::*;

    fn rel(paths: &[PathBuf]) -> Vec<String> {
        paths
            .iter()
            .map(|p| p.to_string_lossy().replace('\\', "/"))
            .collect()
    }

    #[test]
    fn finds_images_with_accepted_extensions() {
        let tmp = image_tree(&["kodi/a.jpg", "kodi/b.JPEG", "kodi/c.png", "kodi/d.GIF"]);
        let found = scan(tmp.path(), &CatalogConfig::default()).unwrap();
        assert_eq!(
            rel(&found),
            vec!["kodi/a.jpg", "kodi/b.JPEG", "kodi/c.png", "kodi/d.GIF"]
        );
    }

    #[test]
    fn ignores_other_files() {
        let tmp = image_tree(&["kodi/a.jpg", "kodi/notes.txt", "kodi/b.webp", "kodi/noext"]);
        let found = scan(tmp.path(), &CatalogConfig::default()).unwrap();
        assert_eq!(rel(&found), vec!["kodi/a.jpg"]);
    }

    #[test]
    fn includes_root_level_and_nested_images() {
        let tmp = image_tree(&["root.png", "lalit/deep/er/x.jpg"]);
        let found = scan(tmp.path(), &CatalogConfig::default()).unwrap();
        assert_eq!(rel(&found), vec!["lalit/deep/er/x.jpg", "root.png"]);
    }

    #[test]
    fn excluded_folders_skipped_at_any_depth() {
        let tmp = image_tree(&[
            "kodi/a.jpg",
            "kodi/Scan 1/b.jpg",
            "scan-old/c.png",
            "vyakti/old-renamed/d.jpg",
            "vyaktitest/e.jpg",
        ]);
        let found = scan(tmp.path(), &CatalogConfig::default()).unwrap();
        assert_eq!(rel(&found), vec!["kodi/a.jpg"]);
    }

    #[test]
    fn strict_rules_skip_numeric_and_additional() {
        let tmp = image_tree(&["1/a.jpg", "additional-dina/b.jpg", "lalit/c.jpg"]);
        let found = scan(tmp.path(), &CatalogConfig::default()).unwrap();
        assert_eq!(rel(&found), vec!["lalit/c.jpg"]);
    }

    #[test]
    fn legacy_rules_keep_numeric_and_additional() {
        let tmp = image_tree(&["1/a.jpg", "additional-dina/b.jpg", "scan/c.jpg"]);
        let config = CatalogConfig {
            exclude: ExclusionPreset::Legacy.rules(),
            ..CatalogConfig::default()
        };
        let found = scan(tmp.path(), &config).unwrap();
        assert_eq!(rel(&found), vec!["1/a.jpg", "additional-dina/b.jpg"]);
    }

    #[test]
    fn file_names_are_not_tested_against_exclusions() {
        let tmp = image_tree(&["kodi/test.jpg", "kodi/2014.png"]);
        let found = scan(tmp.path(), &CatalogConfig::default()).unwrap();
        assert_eq!(rel(&found), vec!["kodi/2014.png", "kodi/test.jpg"]);
    }

    #[test]
    fn root_itself_is_never_excluded() {
        let tmp = image_tree(&["test-images/kodi/a.jpg"]);
        let root = tmp.path().join("test-images");
        let found = scan(&root, &CatalogConfig::default()).unwrap();
        assert_eq!(rel(&found), vec!["kodi/a.jpg"]);
    }

    #[test]
    fn order_is_deterministic() {
        let tmp = image_tree(&["b/2.jpg", "a/1.jpg", "b/1.jpg", "a/2.jpg"]);
        let config = CatalogConfig::default();
        let first = scan(tmp.path(), &config).unwrap();
        let second = scan(tmp.path(), &config).unwrap();
        assert_eq!(first, second);
        assert_eq!(rel(&first), vec!["a/1.jpg", "a/2.jpg", "b/1.jpg", "b/2.jpg"]);
    }

    #[test]
    fn missing_root_is_error() {
        let tmp = image_tree(&[]);
        let result = scan(&tmp.path().join("missing"), &CatalogConfig::default());
        assert!(matches!(result, Err(ScanError::RootNotFound(_))));
    }

    #[test]
    fn file_root_is_error() {
        let tmp = image_tree(&["a.jpg"]);
        let result = scan(&tmp.path().join("a.jpg"), &CatalogConfig::default());
        assert!(matches!(result, Err(ScanError::NotADirectory(_))));
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_image_is_accepted() {
        let tmp = image_tree(&["kodi/plain.jpg", "elsewhere/real.jpg"]);
        std::os::unix::fs::symlink(
            tmp.path().join("elsewhere/real.jpg"),
            tmp.path().join("kodi/linked.jpg"),
        )
        .unwrap();
        let found = scan(tmp.path(), &CatalogConfig::default()).unwrap();
        assert_eq!(
            rel(&found),
            vec!["elsewhere/real.jpg", "kodi/linked.jpg", "kodi/plain.jpg"]
        );
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_directory_is_not_followed() {
        let tmp = image_tree(&["kodi/a.jpg"]);
        std::os::unix::fs::symlink(tmp.path().join("kodi"), tmp.path().join("alias")).unwrap();
        let found = scan(tmp.path(), &CatalogConfig::default()).unwrap();
        assert_eq!(rel(&found), vec!["kodi/a.jpg"]);
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_directory_is_error() {
        use std::fs;
        use std::os::unix::fs::PermissionsExt;

        let tmp = image_tree(&["kodi/a.jpg", "lalit/b.jpg"]);
        let locked = tmp.path().join("lalit");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        // Permission bits don't bind a privileged user
        let enforced = fs::read_dir(&locked).is_err();

        let result = scan(tmp.path(), &CatalogConfig::default());
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        if enforced {
            assert!(matches!(result, Err(ScanError::Walk(_))));
        }
    }
}
