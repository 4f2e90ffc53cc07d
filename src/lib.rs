//! # Phalak Catalog
//!
//! Builds the data behind a static image gallery. The image store is the
//! data source: every folder directly below it is a category, and every
//! image below that folder belongs to it.
//!
//! # Architecture: Three-Stage Pipeline
//!
//! ```text
//! 1. Scan      phalakimages/  →  accepted image paths
//! 2. Catalog   image paths    →  images.json          (categories, sorted)
//! 3. Pages     catalog        →  image/<cat>/<name>/  (share pages)
//! ```
//!
//! Stages run strictly in order. The catalog is the gallery's data file; the
//! pages exist so that a link to one image shows a preview when shared, then
//! hand the visitor over to the gallery app.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Stage 1: walks the image store, applies extension and folder exclusion rules |
//! | [`catalog`] | Stage 2: groups, names, and sorts categories; reads and writes `images.json` |
//! | [`pages`] | Stage 3: renders and writes one share page per image using Maud |
//! | [`ledger`] | Record of written pages, used to prune pages of removed images |
//! | [`pipeline`] | Runs the stages in order and reports counts |
//! | [`config`] | Layered `catalog.toml` loading, command-line overrides, validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Policy as Configuration
//!
//! Earlier versions of this generator disagreed on which folders to skip and
//! on whether images in the store root are shown. Both are now data in
//! [`config::CatalogConfig`]: an ordered list of [`config::SegmentRule`]s and
//! an [`config::UncategorizedPolicy`]. Either behavior is one setting away.
//!
//! ## Maud for Markup
//!
//! Image and category names end up in attributes and text. Maud escapes
//! every interpolation, so a name containing `"` or `<` cannot break the
//! page.
//!
//! ## Keep Going on Page Errors
//!
//! A scan or catalog failure stops the run. A page that cannot be written is
//! reported and skipped; the remaining pages are still written.

pub mod catalog;
pub mod config;
pub mod ledger;
pub mod output;
pub mod pages;
pub mod pipeline;
pub mod scan;

#[cfg(test)]
pub(crate) mod test_helpers;
