//! Share-page generation.
//!
//! Stage 3 of the catalog pipeline. Writes one small HTML document per
//! cataloged image so that links to a single image unfurl with a proper
//! preview on social networks:
//!
//! ```text
//! image/                         # pages_root
//! ├── .pages-index.json          # ledger of pages written (see `ledger`)
//! └── kodi/
//!     └── riddle1/
//!         └── index.html         # og:* and twitter:* tags, then redirect
//! ```
//!
//! Each page carries Open Graph and Twitter Card tags, then a small script
//! that stores the requested path in `sessionStorage` and replaces the
//! location with the single-page app, which restores the deep link after
//! loading. Crawlers don't run the script and read the tags; visitors without
//! JavaScript see a loading line and the image itself.
//!
//! Rendering is a pure function of `(config, category, image)`. Markup comes
//! from [maud](https://maud.lambda.xyz/), so every interpolated name, display
//! name, and path is HTML-escaped.
//!
//! ## Failure handling
//!
//! A page that cannot be written is recorded in [`EmitReport::failures`] and
//! emission moves on to the next image. Only the caller decides whether
//! failures change the exit status.

use crate::catalog::{Catalog, Category, ImageEntry};
use crate::config::CatalogConfig;
use crate::ledger::{self, PageLedger};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PageWriteError {
    #[error("Image name {0:?} cannot be used as a directory name")]
    UnsafeName(String),
    #[error("Cannot create {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Progress events emitted while writing pages.
#[derive(Debug, Clone)]
pub enum EmitEvent {
    PageWritten {
        category: String,
        name: String,
        path: PathBuf,
    },
    PageFailed {
        category: String,
        name: String,
        error: String,
    },
    PagePruned {
        path: PathBuf,
    },
    /// Stale-page removal or ledger bookkeeping failed. Never fatal.
    Warning {
        message: String,
    },
}

#[derive(Debug)]
pub struct PageFailure {
    pub category: String,
    pub name: String,
    pub error: PageWriteError,
}

#[derive(Debug, Default)]
pub struct EmitReport {
    pub written: usize,
    pub failures: Vec<PageFailure>,
    pub pruned: usize,
}

/// Absolute URL of the image file.
pub fn image_url(config: &CatalogConfig, image: &ImageEntry) -> String {
    format!("{}/{}", config.site_url(), image.path)
}

/// Canonical URL of an image's share page.
pub fn page_url(config: &CatalogConfig, category: &Category, image: &ImageEntry) -> String {
    format!(
        "{}/{}/{}/{}",
        config.site_url(),
        config.page.route,
        category.key,
        image.name
    )
}

/// Page location relative to the page root, forward-slash separated.
pub fn page_rel_path(config: &CatalogConfig, category: &Category, image: &ImageEntry) -> String {
    format!("{}/{}/{}", category.key, image.name, config.page_filename)
}

/// Render the share page for one image.
pub fn render_page(config: &CatalogConfig, category: &Category, image: &ImageEntry) -> Markup {
    let page = &config.page;
    let title = format!("{} | {}", image.name, page.title_suffix);
    let description = format!("{} - {}", category.display_name, page.description_suffix);
    let img_url = image_url(config, image);
    let canonical = page_url(config, category, image);

    html! {
        (DOCTYPE)
        html lang=(page.lang) {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }

                meta property="og:title" content=(title);
                meta property="og:description" content=(description);
                meta property="og:image" content=(img_url);
                meta property="og:image:width" content=(page.image_width);
                meta property="og:image:height" content=(page.image_height);
                meta property="og:url" content=(canonical);
                meta property="og:type" content="website";
                meta property="og:site_name" content=(page.site_name);

                meta name="twitter:card" content="summary_large_image";
                meta name="twitter:title" content=(title);
                meta name="twitter:description" content=(description);
                meta name="twitter:image" content=(img_url);

                script { (PreEscaped(redirect_script(config))) }
            }
            body {
                p { "Loading " (image.name) "..." }
                img src=(img_url) alt=(image.name) style="max-width: 100%;";
            }
        }
    }
}

fn redirect_script(config: &CatalogConfig) -> String {
    format!(
        "sessionStorage.setItem({}, window.location.pathname);window.location.replace({});",
        js_string(&config.page.redirect_storage_key),
        js_string(&config.page.spa_root),
    )
}

/// Quote a value as a JavaScript string literal that is safe inside `<script>`.
fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string())
        .to_string()
        .replace("</", "<\\/")
}

/// Directory names that would escape or alias the page tree.
fn is_safe_segment(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}

/// Write a single page under `pages_root`, returning the file path.
pub fn write_page(
    config: &CatalogConfig,
    category: &Category,
    image: &ImageEntry,
) -> Result<PathBuf, PageWriteError> {
    for segment in [&category.key, &image.name] {
        if !is_safe_segment(segment) {
            return Err(PageWriteError::UnsafeName(segment.clone()));
        }
    }

    let dir = config.pages_root.join(&category.key).join(&image.name);
    fs::create_dir_all(&dir).map_err(|source| PageWriteError::CreateDir {
        path: dir.clone(),
        source,
    })?;

    let path = dir.join(&config.page_filename);
    let html = render_page(config, category, image).into_string();
    fs::write(&path, html).map_err(|source| PageWriteError::Write {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

/// Write a page for every image in the catalog, then prune pages left over
/// from earlier runs when `prune_stale` is set.
pub fn emit_pages(
    catalog: &Catalog,
    config: &CatalogConfig,
    progress: Option<Sender<EmitEvent>>,
) -> EmitReport {
    let send = |event: EmitEvent| {
        if let Some(tx) = &progress {
            tx.send(event).ok();
        }
    };

    let mut report = EmitReport::default();
    let mut current = PageLedger::empty();

    for category in &catalog.categories {
        for image in &category.images {
            if is_safe_segment(&category.key) && is_safe_segment(&image.name) {
                current.insert(page_rel_path(config, category, image));
            }
            match write_page(config, category, image) {
                Ok(path) => {
                    report.written += 1;
                    send(EmitEvent::PageWritten {
                        category: category.key.clone(),
                        name: image.name.clone(),
                        path,
                    });
                }
                Err(error) => {
                    send(EmitEvent::PageFailed {
                        category: category.key.clone(),
                        name: image.name.clone(),
                        error: error.to_string(),
                    });
                    report.failures.push(PageFailure {
                        category: category.key.clone(),
                        name: image.name.clone(),
                        error,
                    });
                }
            }
        }
    }

    let previous = PageLedger::load(&config.pages_root);
    if config.prune_stale {
        report.pruned = prune(&config.pages_root, &previous, &mut current, &send);
    } else {
        current.keep_existing(&previous, &config.pages_root);
    }
    if let Err(e) = current.save(&config.pages_root) {
        send(EmitEvent::Warning {
            message: format!("Cannot record written pages: {e}"),
        });
    }

    report
}

/// Remove pages recorded by the previous run but not written by this one.
/// Pages that could not be removed stay in `current` for the next attempt.
fn prune(
    pages_root: &Path,
    previous: &PageLedger,
    current: &mut PageLedger,
    send: &dyn Fn(EmitEvent),
) -> usize {
    let stale: Vec<String> = previous.stale(current).map(str::to_string).collect();
    let mut pruned = 0;
    for page in stale {
        match ledger::remove_page(pages_root, &page) {
            Ok(Some(path)) => {
                pruned += 1;
                send(EmitEvent::PagePruned { path });
            }
            Ok(None) => {}
            Err(e) => {
                send(EmitEvent::Warning {
                    message: format!("Cannot remove stale page {page}: {e}"),
                });
                current.insert(page);
            }
        }
    }
    pruned
}
