//! JSON export of the article table.
//!
//! The table is written as one array; each element is an object with every
//! configured field code as a key, in column order, and `null` where the
//! article had no value.

use crate::error::{Error, Result};
use crate::models::Batch;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

#[instrument(level = "info", skip_all, fields(path = %path.display(), rows = batch.len()))]
pub async fn write_table(batch: &Batch, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(batch)?;
    fs::write(path, &json)
        .await
        .map_err(|e| Error::io(path, e))?;
    info!(bytes = json.len(), "Wrote JSON table");
    Ok(())
}
