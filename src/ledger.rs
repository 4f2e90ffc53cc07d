//! Record of emitted share pages, used to prune stale ones.
//!
//! The page tree is written additively: a page for an image that has since
//! been removed or renamed would otherwise stay on disk forever. The emitter
//! keeps a ledger of every page it expects at `<pages_root>/.pages-index.json`,
//! and on the next run removes pages listed in the old ledger but not the new
//! one.
//!
//! Only files this ledger recorded are ever deleted. Directories are removed
//! only when that leaves them empty. A missing, unreadable, or
//! version-mismatched ledger loads as empty, which makes pruning a no-op.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Name of the ledger file within the page root.
pub const LEDGER_FILENAME: &str = ".pages-index.json";

/// Bump to discard ledgers written in an older format.
const LEDGER_VERSION: u32 = 1;

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PageLedger {
    pub version: u32,
    /// Page files relative to the page root, forward-slash separated
    /// (`kodi/riddle1/index.html`).
    pub pages: BTreeSet<String>,
}

impl PageLedger {
    pub fn empty() -> Self {
        Self {
            version: LEDGER_VERSION,
            pages: BTreeSet::new(),
        }
    }

    pub fn load(pages_root: &Path) -> Self {
        let content = match fs::read_to_string(pages_root.join(LEDGER_FILENAME)) {
            Ok(c) => c,
            Err(_) => return Self::empty(),
        };
        match serde_json::from_str::<Self>(&content) {
            Ok(ledger) if ledger.version == LEDGER_VERSION => ledger,
            _ => Self::empty(),
        }
    }

    pub fn save(&self, pages_root: &Path) -> io::Result<()> {
        fs::create_dir_all(pages_root)?;
        let json = serde_json::to_string_pretty(self)?;
        fs::write(pages_root.join(LEDGER_FILENAME), json)
    }

    pub fn insert(&mut self, page: String) {
        self.pages.insert(page);
    }

    /// Carry over stale pages of `previous` that are still on disk, so a
    /// later pruning run can still remove them.
    pub fn keep_existing(&mut self, previous: &PageLedger, pages_root: &Path) {
        let kept: Vec<String> = previous
            .stale(self)
            .filter(|page| pages_root.join(page).is_file())
            .map(str::to_string)
            .collect();
        self.pages.extend(kept);
    }

    /// Pages recorded here but absent from `current`.
    pub fn stale<'a>(&'a self, current: &'a PageLedger) -> impl Iterator<Item = &'a str> + 'a {
        self.pages.difference(&current.pages).map(String::as_str)
    }
}

/// Delete one stale page and any directories it leaves empty, up to (not
/// including) `pages_root`. Returns the path of the removed file, or `None`
/// if it was already gone.
pub fn remove_page(pages_root: &Path, page: &str) -> io::Result<Option<PathBuf>> {
    // Never follow a ledger entry outside the page root.
    if page.split('/').any(|s| s.is_empty() || s == "." || s == "..") {
        return Ok(None);
    }
    let file = pages_root.join(page);
    match fs::remove_file(&file) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    }

    let mut dir = file.parent();
    while let Some(d) = dir {
        if d == pages_root || !d.starts_with(pages_root) {
            break;
        }
        // Fails on non-empty directories, which ends the climb.
        if fs::remove_dir(d).is_err() {
            break;
        }
        dir = d.parent();
    }
    Ok(Some(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn ledger(pages: &[&str]) -> PageLedger {
        let mut l = PageLedger::empty();
        for p in pages {
            l.insert(p.to_string());
        }
        l
    }

    #[test]
    fn load_missing_is_empty() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(PageLedger::load(tmp.path()), PageLedger::empty());
    }

    #[test]
    fn save_then_load() {
        let tmp = TempDir::new().unwrap();
        let l = ledger(&["kodi/a/index.html", "lalit/b/index.html"]);
        l.save(tmp.path()).unwrap();
        assert_eq!(PageLedger::load(tmp.path()), l);
    }

    #[test]
    fn load_corrupt_is_empty() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(LEDGER_FILENAME), "garbage").unwrap();
        assert_eq!(PageLedger::load(tmp.path()), PageLedger::empty());
    }

    #[test]
    fn load_other_version_is_empty() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(LEDGER_FILENAME),
            r#"{"version": 999, "pages": ["kodi/a/index.html"]}"#,
        )
        .unwrap();
        assert_eq!(PageLedger::load(tmp.path()), PageLedger::empty());
    }

    #[test]
    fn stale_is_old_minus_current() {
        let old = ledger(&["kodi/a/index.html", "kodi/b/index.html"]);
        let current = ledger(&["kodi/b/index.html", "kodi/c/index.html"]);
        let stale: Vec<&str> = old.stale(&current).collect();
        assert_eq!(stale, vec!["kodi/a/index.html"]);
    }

    #[test]
    fn keep_existing_carries_stale_pages_still_on_disk() {
        let tmp = TempDir::new().unwrap();
        let on_disk = tmp.path().join("kodi/b/index.html");
        fs::create_dir_all(on_disk.parent().unwrap()).unwrap();
        fs::write(&on_disk, "page").unwrap();

        let old = ledger(&["kodi/a/index.html", "kodi/b/index.html", "kodi/c/index.html"]);
        let mut current = ledger(&["kodi/a/index.html"]);
        current.keep_existing(&old, tmp.path());

        assert_eq!(current, ledger(&["kodi/a/index.html", "kodi/b/index.html"]));
    }

    #[test]
    fn remove_page_cleans_empty_dirs() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("kodi/a")).unwrap();
        fs::create_dir_all(root.join("lalit/b")).unwrap();
        fs::write(root.join("kodi/a/index.html"), "x").unwrap();
        fs::write(root.join("lalit/b/index.html"), "x").unwrap();

        let removed = remove_page(root, "kodi/a/index.html").unwrap();
        assert_eq!(removed, Some(root.join("kodi/a/index.html")));
        assert!(!root.join("kodi").exists());
        assert!(root.join("lalit/b/index.html").exists());
        assert!(root.exists());
    }

    #[test]
    fn remove_page_keeps_dirs_with_other_content() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("kodi/a")).unwrap();
        fs::write(root.join("kodi/a/index.html"), "x").unwrap();
        fs::write(root.join("kodi/a/notes.txt"), "keep").unwrap();

        remove_page(root, "kodi/a/index.html").unwrap();
        assert!(root.join("kodi/a/notes.txt").exists());
    }

    #[test]
    fn remove_missing_page_is_noop() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(remove_page(tmp.path(), "kodi/a/index.html").unwrap(), None);
    }

    #[test]
    fn remove_page_refuses_parent_segments() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("pages");
        fs::create_dir_all(&root).unwrap();
        fs::write(tmp.path().join("outside.html"), "x").unwrap();

        assert_eq!(remove_page(&root, "../outside.html").unwrap(), None);
        assert!(tmp.path().join("outside.html").exists());
    }
}
