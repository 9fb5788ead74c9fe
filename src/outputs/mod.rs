//! Output writers for the assembled article table.
//!
//! # Submodules
//!
//! - [`csv`]: Header row plus one row per article, empty cells for absent fields
//! - [`json`]: Array of objects keyed by field code, `null` for absent fields
//!
//! Both writers emit columns in the configured field order and write UTF-8.

pub mod csv;
pub mod json;

use crate::config::OutputFormat;
use crate::error::Result;
use crate::models::Batch;
use std::path::Path;

/// Write `batch` to `path` in the requested format.
pub async fn write_batch(batch: &Batch, format: OutputFormat, path: &Path) -> Result<()> {
    match format {
        OutputFormat::Csv => csv::write_table(batch, path).await,
        OutputFormat::Json => json::write_table(batch, path).await,
    }
}
