//! CLI output formatting for all pipeline stages.
//!
//! Each stage has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to the terminal. Format
//! functions are pure: no I/O, no side effects.
//!
//! ## Catalog
//!
//! ```text
//! Categories
//! 001 कोडी (Riddles) (2 images)
//!     Source: kodi/
//!     001 riddle1
//!     002 riddle2
//! Catalog generated with 3 images in 1 categories
//! ```
//!
//! ## Pages
//!
//! ```text
//!     kodi/riddle1 → image/kodi/riddle1/index.html
//!     FAILED kodi/bad: Cannot create image/kodi/bad: Permission denied
//!     pruned image/old/x/index.html
//! ```
//!
//! ## Summary
//!
//! ```text
//! Discovered 3 images, 1 categories; wrote 2 pages, 1 failed, 1 pruned
//! ```
//!
//! The `pages` command, which starts from an existing catalog, reports only
//! the emission counts:
//!
//! ```text
//! Generated 2 HTML files with Open Graph meta tags (1 failed, 1 pruned)
//! ```

use crate::catalog::Catalog;
use crate::pages::{EmitEvent, EmitReport};
use crate::pipeline::BuildReport;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn category_header(index: usize, display_name: &str, count: usize) -> String {
    let noun = if count == 1 { "image" } else { "images" };
    format!("{} {} ({} {})", format_index(index), display_name, count, noun)
}

// ============================================================================
// Stage 2: Catalog output
// ============================================================================

/// The catalog as a tree: categories in catalog order, images below each.
pub fn format_catalog_output(catalog: &Catalog) -> Vec<String> {
    let mut lines = vec!["Categories".to_string()];
    for (i, category) in catalog.categories.iter().enumerate() {
        lines.push(category_header(
            i + 1,
            &category.display_name,
            category.images.len(),
        ));
        lines.push(format!("    Source: {}/", category.key));
        for (j, image) in category.images.iter().enumerate() {
            lines.push(format!("    {} {}", format_index(j + 1), image.name));
        }
    }
    lines
}

/// One-line result of the catalog stage.
pub fn format_catalog_summary(discovered: usize, catalog: &Catalog) -> String {
    format!(
        "Catalog generated with {} images in {} categories",
        discovered,
        catalog.categories.len()
    )
}

pub fn print_catalog_output(catalog: &Catalog) {
    for line in format_catalog_output(catalog) {
        println!("{}", line);
    }
}

// ============================================================================
// Stage 3: Page output
// ============================================================================

/// Format a single emission event as display lines.
pub fn format_emit_event(event: &EmitEvent) -> Vec<String> {
    match event {
        EmitEvent::PageWritten {
            category,
            name,
            path,
        } => vec![format!(
            "    {}/{} \u{2192} {}",
            category,
            name,
            path.display()
        )],
        EmitEvent::PageFailed {
            category,
            name,
            error,
        } => vec![format!("    FAILED {}/{}: {}", category, name, error)],
        EmitEvent::PagePruned { path } => vec![format!("    pruned {}", path.display())],
        EmitEvent::Warning { message } => vec![format!("    warning: {}", message)],
    }
}

/// True for events that belong on stderr.
fn is_problem(event: &EmitEvent) -> bool {
    matches!(
        event,
        EmitEvent::PageFailed { .. } | EmitEvent::Warning { .. }
    )
}

pub fn print_emit_event(event: &EmitEvent) {
    for line in format_emit_event(event) {
        if is_problem(event) {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }
    }
}

// ============================================================================
// Summary
// ============================================================================

/// Final counts for a pipeline run.
pub fn format_build_summary(report: &BuildReport) -> String {
    format!(
        "Discovered {} images, {} categories; wrote {} pages, {} failed, {} pruned",
        report.discovered,
        report.categories,
        report.emit.written,
        report.emit.failures.len(),
        report.emit.pruned
    )
}

pub fn print_build_summary(report: &BuildReport) {
    println!("{}", format_build_summary(report));
}

pub fn format_emit_summary(report: &EmitReport) -> String {
    format!(
        "Generated {} HTML files with Open Graph meta tags ({} failed, {} pruned)",
        report.written,
        report.failures.len(),
        report.pruned
    )
}

pub fn print_emit_summary(report: &EmitReport) {
    println!("{}", format_emit_summary(report));
}

// ============================================================================
// Tests
// ============================================================================
