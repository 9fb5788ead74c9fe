//! Command-line interface definitions for Newswire Table.
//!
//! Every option except `--list-fields` can also be given in the YAML config
//! file; a flag on the command line always wins over the file.

use crate::config::OutputFormat;
use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the Newswire Table application.
///
/// # Examples
///
/// ```sh
/// # Tabulate every .txt export in ./exports into articles.csv
/// newswire_table -i ./exports
///
/// # Keep only headline, date and language, written as JSON
/// newswire_table -i ./exports -f HD,PD,LA --format json -o articles.json
///
/// # Read defaults from a config file
/// newswire_table -c newswire.yaml
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Directory holding the exported .txt files
    #[arg(short, long)]
    pub input_dir: Option<PathBuf>,

    /// Output file (defaults to articles.csv or articles.json)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Optional path to a YAML config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Comma-separated field codes to keep, in column order
    #[arg(short, long, value_delimiter = ',')]
    pub fields: Vec<String>,

    /// Output format
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Skip files that are not valid UTF-8 instead of aborting the run
    #[arg(long)]
    pub skip_undecodable: bool,

    /// Print the known field codes and exit
    #[arg(long)]
    pub list_fields: bool,
}
