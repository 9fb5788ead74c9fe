//! CSV export of the article table.

use crate::error::{Error, Result};
use crate::models::Batch;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Render `batch` as CSV: one header row of field codes, then one row per record.
pub fn to_csv_bytes(batch: &Batch) -> Result<Vec<u8>> {
    let mut writer = ::csv::Writer::from_writer(Vec::new());
    writer.write_record(batch.fields().header())?;
    for record in batch.records() {
        writer.write_record(record.cells())?;
    }
    writer
        .into_inner()
        .map_err(|e| Error::Csv(e.into_error().into()))
}

#[instrument(level = "info", skip_all, fields(path = %path.display(), rows = batch.len()))]
pub async fn write_table(batch: &Batch, path: &Path) -> Result<()> {
    let bytes = to_csv_bytes(batch)?;
    fs::write(path, &bytes)
        .await
        .map_err(|e| Error::io(path, e))?;
    info!(bytes = bytes.len(), "Wrote CSV table");
    Ok(())
}
