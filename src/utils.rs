//! Utility functions for log previews and output path checks.

use crate::error::{Error, Result};
use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument, warn};

/// Truncate a string for logging purposes.
///
/// Long strings are cut after `max` characters with an ellipsis and byte
/// count indicator appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}…(+{} bytes)", &s[..cut], s.len() - cut),
    }
}

/// Ensure the directory that will hold `output` exists and is writable.
///
/// Creates the directory if needed, then creates and removes a probe file.
///
/// # Errors
///
/// Returns [`Error::Io`] if the directory cannot be created or written.
#[instrument(level = "info", skip_all, fields(output = %output.display()))]
pub async fn ensure_output_writable(output: &Path) -> Result<()> {
    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    fs::create_dir_all(dir)
        .await
        .map_err(|e| Error::io(dir, e))?;

    // A small sync write gives the simplest error surface.
    let probe_path = dir.join("..__probe_write__");
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            if let Err(e) = stdfs::remove_file(&probe_path) {
                warn!(path = %probe_path.display(), error = %e, "Failed to remove write probe");
            }
            info!(dir = %dir.display(), "Output directory is writable");
            Ok(())
        }
        Err(e) => Err(Error::io(dir, e)),
    }
}
