//! Error types for the tabulation pipeline.
//!
//! Only the conditions that stop a run live here. Irregular tag layouts inside
//! an article are never errors: the parser folds them into the nearest active
//! field or drops them.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The input directory is missing or cannot be listed.
    #[error("cannot access input directory {}: {source}", path.display())]
    InputAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An export file is not valid UTF-8 text.
    #[error("{} is not valid UTF-8 text: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: std::str::Utf8Error,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("cannot parse config file {}: {source}", path.display())]
    ConfigFile {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_names_file() {
        let bytes = vec![0xff, 0xfe, 0x41];
        let source = std::str::from_utf8(&bytes).unwrap_err();
        let err = Error::Decode {
            path: PathBuf::from("/data/batch_01.txt"),
            source,
        };
        assert!(err.to_string().contains("/data/batch_01.txt"));
        assert!(err.to_string().contains("not valid UTF-8"));
    }

    #[test]
    fn test_config_error_message() {
        let err = Error::Config("field list is empty".to_string());
        assert_eq!(err.to_string(), "configuration error: field list is empty");
    }
}
