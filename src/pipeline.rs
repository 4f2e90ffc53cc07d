//! The full catalog run: scan → catalog → pages.
//!
//! Each stage feeds the next and there is no way back. A scan or catalog
//! write failure ends the run before any page is touched: without a catalog
//! the gallery cannot resolve the pages' deep links anyway. Page failures are
//! collected in the report instead.

use crate::catalog::{Catalog, CatalogWriteError, build_catalog};
use crate::config::CatalogConfig;
use crate::pages::{EmitEvent, EmitReport, emit_pages};
use crate::scan::{ScanError, scan};
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Scan failed: {0}")]
    Scan(#[from] ScanError),
    #[error("Catalog write failed: {0}")]
    CatalogWrite(#[from] CatalogWriteError),
}

#[derive(Debug)]
pub struct BuildReport {
    /// Images accepted by the scanner, including root-level ones the catalog
    /// may drop.
    pub discovered: usize,
    pub categories: usize,
    pub emit: EmitReport,
}

/// Scan and catalog without writing anything.
pub fn catalog_only(config: &CatalogConfig) -> Result<(usize, Catalog), ScanError> {
    let paths = scan(&config.scan_root, config)?;
    Ok((paths.len(), build_catalog(&paths, config)))
}

/// Scan, catalog, and write the JSON document.
pub fn write_catalog(config: &CatalogConfig) -> Result<(usize, Catalog), BuildError> {
    let (discovered, catalog) = catalog_only(config)?;
    catalog.write(&config.catalog_path)?;
    Ok((discovered, catalog))
}

/// Run every stage.
pub fn build(
    config: &CatalogConfig,
    progress: Option<Sender<EmitEvent>>,
) -> Result<BuildReport, BuildError> {
    let (discovered, catalog) = write_catalog(config)?;
    let emit = emit_pages(&catalog, config, progress);
    Ok(BuildReport {
        discovered,
        categories: catalog.categories.len(),
        emit,
    })
}
