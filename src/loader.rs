//! Batch loader for archive export files.
//!
//! Each export is a `.txt` file holding up to 100 articles separated by a
//! form feed (the page break left behind by rich-text-to-text conversion),
//! optionally followed by a "Search Summary" section describing the query.
//!
//! # Processing
//!
//! 1. List `*.txt` files in the input directory (symlinks followed), sorted by file name
//! 2. Read and decode each file as UTF-8, drop a leading byte-order mark and
//!    turn `\r\n` and lone `\r` into `\n`
//! 3. Cut everything from the summary marker line onward
//! 4. Split on the page break and drop blocks that are blank after trimming
//!
//! Files are read one after another and each file's blocks are handed to the
//! caller before the next file is read, so only one file's text is held here.

use crate::config::DecodePolicy;
use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, instrument, warn};

pub const INPUT_EXTENSION: &str = "txt";

/// Page-break character separating articles within one export.
pub const PAGE_BREAK: char = '\u{000C}';

/// Header line of the trailing query summary.
pub const SUMMARY_MARKER: &str = "Search Summary";

static SUMMARY_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?m)^[ \t]*{}[ \t]*$", regex::escape(SUMMARY_MARKER))).unwrap()
});

const BYTE_ORDER_MARK: char = '\u{FEFF}';

/// File counts from one [`BatchLoader::load_dir`] call.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub files_read: usize,
    pub files_skipped: Vec<PathBuf>,
}

/// Reads export files from a directory according to a [`DecodePolicy`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchLoader {
    policy: DecodePolicy,
}

impl BatchLoader {
    pub fn new(policy: DecodePolicy) -> Self {
        Self { policy }
    }

    /// Load every export in `dir`, passing each file's article blocks to
    /// `on_file` in file-then-position order.
    ///
    /// # Errors
    ///
    /// - [`Error::InputAccess`] if `dir` cannot be listed; nothing is parsed.
    /// - [`Error::Decode`] for the first non-UTF-8 file under [`DecodePolicy::Abort`].
    /// - [`Error::Io`] if a listed file cannot be read.
    #[instrument(level = "info", skip_all, fields(dir = %dir.display(), policy = ?self.policy))]
    pub async fn load_dir<F>(&self, dir: &Path, mut on_file: F) -> Result<LoadReport>
    where
        F: FnMut(Vec<String>),
    {
        let files = list_input_files(dir).await?;
        let total = files.len();
        if total == 0 {
            warn!("No .{INPUT_EXTENSION} files found in input directory");
        }

        let mut report = LoadReport::default();
        for (index, path) in files.into_iter().enumerate() {
            match read_file_blocks(&path).await {
                Ok(blocks) => {
                    info!(
                        file = %display_name(&path),
                        index = index + 1,
                        total,
                        articles = blocks.len(),
                        "Processed export file"
                    );
                    report.files_read += 1;
                    on_file(blocks);
                }
                Err(Error::Decode { path, source }) if self.policy == DecodePolicy::Skip => {
                    warn!(
                        file = %display_name(&path),
                        error = %source,
                        "File is not valid UTF-8; skipping"
                    );
                    report.files_skipped.push(path);
                }
                Err(e) => return Err(e),
            }
        }

        Ok(report)
    }
}

/// List `*.txt` files directly inside `dir`, sorted by file name.
///
/// Symlinks are followed; a link whose target is missing is logged and left out.
pub async fn list_input_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let access = |source| Error::InputAccess {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = fs::read_dir(dir).await.map_err(access)?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(access)? {
        let path = entry.path();
        if !path.extension().is_some_and(|ext| ext == INPUT_EXTENSION) {
            continue;
        }
        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => files.push(path),
            Ok(_) => {}
            Err(e) => warn!(file = %display_name(&path), error = %e, "Cannot stat export; skipping"),
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    debug!(count = files.len(), "Listed input files");
    Ok(files)
}

/// Read one export file and split it into article blocks.
pub async fn read_file_blocks(path: &Path) -> Result<Vec<String>> {
    let bytes = fs::read(path).await.map_err(|e| Error::io(path, e))?;
    let text = decode(path, &bytes)?;
    Ok(split_articles(&text).into_iter().map(str::to_string).collect())
}

/// Decode raw bytes as UTF-8 text with `\n` line endings, dropping a leading
/// byte-order mark.
pub fn decode(path: &Path, bytes: &[u8]) -> Result<String> {
    let text = std::str::from_utf8(bytes).map_err(|source| Error::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    let text = text.strip_prefix(BYTE_ORDER_MARK).unwrap_or(text);
    if text.contains('\r') {
        Ok(text.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        Ok(text.to_string())
    }
}

/// Everything before the first line that is exactly [`SUMMARY_MARKER`]
/// (surrounding blanks allowed), or all of `text` if there is none.
pub fn strip_summary(text: &str) -> &str {
    match SUMMARY_LINE.find(text) {
        Some(m) => &text[..m.start()],
        None => text,
    }
}

/// Split one decoded export into non-blank article blocks.
pub fn split_articles(text: &str) -> Vec<&str> {
    strip_summary(text)
        .split(PAGE_BREAK)
        .filter(|block| !block.trim().is_empty())
        .collect()
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
