//! # Newswire Table
//!
//! Turns batches of newswire archive exports into a single tabular dataset.
//! Each export is plain text holding up to 100 articles separated by page
//! breaks; every article carries its metadata as 2–3 letter field tags
//! (`HD` headline, `PD` publication date, `LA` language, ...). The output has
//! one row per article and one column per configured field code.
//!
//! ## Usage
//!
//! ```sh
//! newswire_table -i ./exports -o ./articles.csv
//! ```
//!
//! ## Architecture
//!
//! The application runs a single-threaded pipeline:
//! 1. **Loading**: Read `*.txt` exports in name order, cut the search summary,
//!    split on page breaks
//! 2. **Parsing**: Rebuild each article's tagged fields into a fixed-schema record
//! 3. **Output**: Write the table as CSV (or JSON)

use clap::Parser;
use std::error::Error;
use std::time::Instant;
use tracing::{debug, info, instrument, trace, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod error;
mod loader;
mod models;
mod outputs;
mod parser;
mod utils;

use cli::Cli;
use config::{ConfigFile, Settings};
use loader::BatchLoader;
use models::{Batch, KNOWN_FIELDS};
use parser::TagParser;
use utils::ensure_output_writable;

/// Counts reported at the end of a run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub files_read: usize,
    pub files_skipped: usize,
    pub articles: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    if args.list_fields {
        for (code, description) in KNOWN_FIELDS {
            println!("{code:<4} {description}");
        }
        return Ok(());
    }

    let start_time = Instant::now();
    info!("newswire_table starting up");

    let file = match &args.config {
        Some(path) => ConfigFile::load(path).await?,
        None => ConfigFile::default(),
    };
    let settings = Settings::resolve(&args, file)?;

    let summary = run(&settings).await?;

    let elapsed = start_time.elapsed();
    info!(
        files = summary.files_read,
        skipped = summary.files_skipped,
        articles = summary.articles,
        output = %settings.output.display(),
        ?elapsed,
        "Execution complete"
    );

    Ok(())
}

/// Load, parse and write one batch.
///
/// Nothing is written unless loading succeeds for every file the decode
/// policy does not skip.
#[instrument(level = "info", skip_all, fields(input = %settings.input_dir.display()))]
pub async fn run(settings: &Settings) -> error::Result<RunSummary> {
    ensure_output_writable(&settings.output).await?;

    let parser = TagParser::new(settings.fields.clone());
    let mut batch = Batch::new(parser.fields().clone());
    let report = BatchLoader::new(settings.decode_policy)
        .load_dir(&settings.input_dir, |blocks| {
            for record in blocks.iter().filter_map(|block| parser.parse(block)) {
                trace!(
                    headline = record.get(parser.fields(), "HD").unwrap_or_default(),
                    "Parsed article"
                );
                batch.push(record);
            }
        })
        .await?;
    info!(articles = batch.len(), "Parsed article blocks");

    if batch.is_empty() {
        warn!("No articles found; writing header only");
    }
    for (code, filled) in batch.fill_counts() {
        debug!(%code, filled, of = batch.len(), "Field fill count");
    }

    outputs::write_batch(&batch, settings.format, &settings.output).await?;

    Ok(RunSummary {
        files_read: report.files_read,
        files_skipped: report.files_skipped.len(),
        articles: batch.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DecodePolicy, OutputFormat};
    use crate::models::FieldSet;
    use std::path::Path;
    use tempfile::TempDir;

    fn settings(input: &Path, output: &Path, codes: &[&str]) -> Settings {
        Settings {
            input_dir: input.to_path_buf(),
            output: output.to_path_buf(),
            fields: FieldSet::from_strs(codes).unwrap(),
            format: OutputFormat::Csv,
            decode_policy: DecodePolicy::Abort,
        }
    }

    fn article(headline: &str, language: &str) -> String {
        format!("HD {headline}\n\nWC\n250 words\n\nLA\n{language}\n\nAN\nDocument {headline}\n")
    }

    #[tokio::test]
    async fn test_two_articles_with_summary() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("exports");
        std::fs::create_dir(&input).unwrap();
        let export = format!(
            "{}\u{c}{}\n\nSearch Summary\nText\nstorm AND coast\nLanguage\nEnglish\n",
            article("Storm hits coast", "English"),
            article("Harbour reopens", "English"),
        );
        std::fs::write(input.join("batch.txt"), export).unwrap();
        let output = tmp.path().join("out").join("articles.csv");

        let summary = run(&settings(&input, &output, &["HD", "LA"])).await.unwrap();

        assert_eq!(
            summary,
            RunSummary {
                files_read: 1,
                files_skipped: 0,
                articles: 2
            }
        );
        let csv = std::fs::read_to_string(&output).unwrap();
        assert_eq!(
            csv,
            "HD,LA\nStorm hits coast,English\nHarbour reopens,English\n"
        );
        assert!(!csv.contains("storm AND coast"));
        assert!(!csv.contains("Search Summary"));
    }

    #[tokio::test]
    async fn test_files_emitted_in_name_order() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("exports");
        std::fs::create_dir(&input).unwrap();
        // Written b first so directory order and mtime favour b.
        std::fs::write(input.join("b.txt"), article("From b", "German")).unwrap();
        std::fs::write(
            input.join("a.txt"),
            format!("{}\u{c}{}", article("From a 1", "English"), article("From a 2", "French")),
        )
        .unwrap();
        let output = tmp.path().join("articles.csv");

        run(&settings(&input, &output, &["HD"])).await.unwrap();

        let csv = std::fs::read_to_string(&output).unwrap();
        assert_eq!(csv, "HD\nFrom a 1\nFrom a 2\nFrom b\n");
    }

    #[tokio::test]
    async fn test_separator_only_file_adds_no_rows() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("exports");
        std::fs::create_dir(&input).unwrap();
        std::fs::write(input.join("a.txt"), "\u{c}\u{c}").unwrap();
        std::fs::write(input.join("b.txt"), article("Only one", "English")).unwrap();
        let output = tmp.path().join("articles.csv");

        let summary = run(&settings(&input, &output, &["HD", "LA"])).await.unwrap();

        assert_eq!(summary.files_read, 2);
        assert_eq!(summary.articles, 1);
    }

    #[tokio::test]
    async fn test_missing_input_dir_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let output = tmp.path().join("articles.csv");

        let err = run(&settings(&tmp.path().join("missing"), &output, &["HD"]))
            .await
            .unwrap_err();

        assert!(matches!(err, error::Error::InputAccess { .. }));
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_decode_abort_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("exports");
        std::fs::create_dir(&input).unwrap();
        std::fs::write(input.join("a.txt"), article("Fine", "English")).unwrap();
        std::fs::write(input.join("b.txt"), b"HD Broken \xff\n").unwrap();
        let output = tmp.path().join("articles.csv");

        let err = run(&settings(&input, &output, &["HD"])).await.unwrap_err();

        assert!(matches!(err, error::Error::Decode { .. }));
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_json_output() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("exports");
        std::fs::create_dir(&input).unwrap();
        std::fs::write(input.join("a.txt"), article("Storm hits coast", "English")).unwrap();
        let output = tmp.path().join("articles.json");
        let mut settings = settings(&input, &output, &["HD", "PD"]);
        settings.format = OutputFormat::Json;

        run(&settings).await.unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(
            value,
            serde_json::json!([{ "HD": "Storm hits coast", "PD": null }])
        );
    }

    #[tokio::test]
    async fn test_crlf_export_keeps_every_field() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("exports");
        std::fs::create_dir(&input).unwrap();
        let export = format!(
            "{}\u{c}{}\n\nSearch Summary\nText\nstorm\n",
            article("Storm hits coast", "English"),
            article("Harbour reopens", "French"),
        )
        .replace('\n', "\r\n");
        std::fs::write(input.join("batch.txt"), export).unwrap();
        let output = tmp.path().join("articles.csv");

        run(&settings(&input, &output, &["HD", "LA", "WC"])).await.unwrap();

        let csv = std::fs::read_to_string(&output).unwrap();
        assert_eq!(
            csv,
            "HD,LA,WC\nStorm hits coast,English,250 words\nHarbour reopens,French,250 words\n"
        );
    }

    #[tokio::test]
    async fn test_summary_phrase_in_headline_does_not_truncate() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("exports");
        std::fs::create_dir(&input).unwrap();
        let export = format!(
            "{}\u{c}{}\nSearch Summary\nText\ngoogle\n",
            article("Google adds Search Summary tool", "English"),
            article("Harbour reopens", "English"),
        );
        std::fs::write(input.join("batch.txt"), export).unwrap();
        let output = tmp.path().join("articles.csv");

        let summary = run(&settings(&input, &output, &["HD", "LA"])).await.unwrap();

        assert_eq!(summary.articles, 2);
        let csv = std::fs::read_to_string(&output).unwrap();
        assert_eq!(
            csv,
            "HD,LA\nGoogle adds Search Summary tool,English\nHarbour reopens,English\n"
        );
    }
}
