//! Run configuration.
//!
//! Settings come from three layers, highest precedence first: command-line
//! flags, an optional YAML config file, and built-in defaults. The resolved
//! [`Settings`] value is passed explicitly to the loader, parser and writers.
//!
//! ```yaml
//! input_dir: ./exports
//! output: ./articles.csv
//! format: csv
//! on_decode_error: abort
//! fields: [SE, HD, WC, PD, SN, LA, AN]
//! ```

use crate::cli::Cli;
use crate::error::{Error, Result};
use crate::models::{FieldCode, FieldSet};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

/// Output serialization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

impl OutputFormat {
    pub fn default_output(self) -> PathBuf {
        match self {
            Self::Csv => PathBuf::from("articles.csv"),
            Self::Json => PathBuf::from("articles.json"),
        }
    }
}

/// What to do with an export file that is not valid UTF-8.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecodePolicy {
    /// Fail the whole run; nothing is written.
    #[default]
    Abort,
    /// Log a warning and continue with the remaining files.
    Skip,
}

/// Contents of the optional YAML config file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub input_dir: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub fields: Option<Vec<FieldCode>>,
    pub format: Option<OutputFormat>,
    pub on_decode_error: Option<DecodePolicy>,
}

impl ConfigFile {
    #[instrument(level = "info")]
    pub async fn load(path: &Path) -> Result<Self> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| Error::io(path, e))?;
        Self::from_yaml(&text, path)
    }

    pub fn from_yaml(text: &str, path: &Path) -> Result<Self> {
        serde_yaml::from_str(text).map_err(|source| Error::ConfigFile {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub input_dir: PathBuf,
    pub output: PathBuf,
    pub fields: FieldSet,
    pub format: OutputFormat,
    pub decode_policy: DecodePolicy,
}

impl Settings {
    /// Merge CLI flags over the config file over defaults.
    pub fn resolve(cli: &Cli, file: ConfigFile) -> Result<Self> {
        let input_dir = cli.input_dir.clone().or(file.input_dir).ok_or_else(|| {
            Error::Config("no input directory given (use --input-dir or input_dir)".to_string())
        })?;

        let fields = if !cli.fields.is_empty() {
            FieldSet::from_strs(&cli.fields)?
        } else if let Some(codes) = file.fields {
            FieldSet::new(codes)?
        } else {
            FieldSet::default()
        };

        let format = cli.format.or(file.format).unwrap_or_default();
        let output = cli
            .output
            .clone()
            .or(file.output)
            .unwrap_or_else(|| format.default_output());

        let decode_policy = if cli.skip_undecodable {
            DecodePolicy::Skip
        } else {
            file.on_decode_error.unwrap_or_default()
        };

        let settings = Self {
            input_dir,
            output,
            fields,
            format,
            decode_policy,
        };
        debug!(?settings, "Resolved settings");
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("newswire_table").chain(args.iter().copied()))
    }

    fn yaml(text: &str) -> ConfigFile {
        ConfigFile::from_yaml(text, Path::new("newswire.yaml")).unwrap()
    }

    #[test]
    fn test_defaults_when_only_input_given() {
        let settings = Settings::resolve(&cli(&["-i", "exports"]), ConfigFile::default()).unwrap();

        assert_eq!(settings.input_dir, PathBuf::from("exports"));
        assert_eq!(settings.output, PathBuf::from("articles.csv"));
        assert_eq!(settings.format, OutputFormat::Csv);
        assert_eq!(settings.decode_policy, DecodePolicy::Abort);
        assert_eq!(settings.fields, FieldSet::default());
    }

    #[test]
    fn test_missing_input_dir_is_config_error() {
        let err = Settings::resolve(&cli(&[]), ConfigFile::default()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_config_file_values_apply() {
        let file = yaml(
            "input_dir: /data/exports\noutput: out.json\nformat: json\non_decode_error: skip\nfields: [HD, LA]\n",
        );
        let settings = Settings::resolve(&cli(&[]), file).unwrap();

        assert_eq!(settings.input_dir, PathBuf::from("/data/exports"));
        assert_eq!(settings.output, PathBuf::from("out.json"));
        assert_eq!(settings.format, OutputFormat::Json);
        assert_eq!(settings.decode_policy, DecodePolicy::Skip);
        assert_eq!(settings.fields.header().collect::<Vec<_>>(), vec!["HD", "LA"]);
    }

    #[test]
    fn test_cli_overrides_config_file() {
        let file = yaml("input_dir: /data/exports\nfields: [HD, LA]\nformat: json\n");
        let settings = Settings::resolve(
            &cli(&["-i", "other", "-f", "AN,PD", "--format", "csv"]),
            file,
        )
        .unwrap();

        assert_eq!(settings.input_dir, PathBuf::from("other"));
        assert_eq!(settings.fields.header().collect::<Vec<_>>(), vec!["AN", "PD"]);
        assert_eq!(settings.format, OutputFormat::Csv);
        assert_eq!(settings.output, PathBuf::from("articles.csv"));
    }

    #[test]
    fn test_json_format_changes_default_output() {
        let settings =
            Settings::resolve(&cli(&["-i", "exports", "--format", "json"]), ConfigFile::default())
                .unwrap();
        assert_eq!(settings.output, PathBuf::from("articles.json"));
    }

    #[test]
    fn test_invalid_field_codes_rejected() {
        let err = Settings::resolve(&cli(&["-i", "x", "-f", "HD,headline"]), ConfigFile::default())
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let bad = ConfigFile::from_yaml("fields: [hd]\n", Path::new("newswire.yaml"));
        assert!(matches!(bad, Err(Error::ConfigFile { .. })));
    }

    #[test]
    fn test_unknown_config_key_rejected() {
        let bad = ConfigFile::from_yaml("input: ./exports\n", Path::new("newswire.yaml"));
        assert!(matches!(bad, Err(Error::ConfigFile { .. })));
    }

    #[test]
    fn test_empty_field_list_in_file_rejected() {
        let file = yaml("input_dir: x\nfields: []\n");
        assert!(matches!(
            Settings::resolve(&cli(&[]), file),
            Err(Error::Config(_))
        ));
    }
}
