//! # Etiqueta CLI
//!
//! Command-line interface for generating label sheets.
//!
//! ## Usage
//!
//! ```bash
//! # Generate sheets: out_0.svg, out_1.svg, ...
//! etiqueta template.svg sheet.ini data.csv out
//!
//! # Only rows with a nonempty "print" column
//! etiqueta template.svg sheet.ini data.csv out --only print
//!
//! # Resume a partially used sheet at the third row of the first column
//! etiqueta template.svg sheet.ini data.csv out --start-row 2
//!
//! # Fill across rows instead of down columns
//! etiqueta template.svg sheet.ini data.csv out --dir row
//! ```

use clap::Parser;
use std::fs;
use std::path::PathBuf;

use etiqueta::{
    EtiquetaError, RunOptions, SheetConfig, Template,
    data::{self, Row, RowSelector},
    run, svg,
};

/// Generate printable label sheets from an SVG template and CSV data
#[derive(Parser, Debug)]
#[command(name = "etiqueta")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// SVG label template
    template: PathBuf,

    /// Label sheet configuration ([sheet] section)
    config: PathBuf,

    /// CSV data, first line is the field-name header
    data: PathBuf,

    /// Output filename prefix; pages are written as <prefix>_<page>.svg
    output: String,

    /// Only process rows where this key is nonempty (or: key=value)
    #[arg(long)]
    only: Option<String>,

    /// Starting row on the first page, zero is topmost
    #[arg(long, default_value_t = 0)]
    start_row: usize,

    /// Starting column on the first page, zero is leftmost
    #[arg(long, default_value_t = 0)]
    start_col: usize,

    /// Direction labels are incremented in (overrides the sheet config)
    #[arg(long, value_parser = ["row", "col"])]
    dir: Option<String>,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), EtiquetaError> {
    let cli = Cli::parse();

    let template = Template::parse(&fs::read_to_string(&cli.template)?)?;
    let mut config = SheetConfig::parse(&fs::read_to_string(&cli.config)?)?;
    if let Some(dir) = cli.dir.as_deref() {
        config.dir = dir.parse()?;
    }

    let rows = data::read_rows_from_path(&cli.data)?;
    let rows: Vec<Row> = match cli.only.as_deref().map(RowSelector::parse) {
        Some(selector) => rows.into_iter().filter(|r| selector.matches(r)).collect(),
        None => rows,
    };

    let options = RunOptions {
        start_row: cli.start_row,
        start_col: cli.start_col,
    };
    let (pages, errors) = run::generate(&template, &config, &rows, &options)?;

    for page in &pages {
        let path = run::page_filename(&cli.output, page.index);
        fs::write(&path, svg::serialize_document(&page.doc))?;
        println!("Wrote {} ({} labels)", path, page.labels);
    }
    if pages.is_empty() {
        println!("No rows to process, nothing written");
    }

    // Per-row problems never fail the run; the pages above are still valid.
    if !errors.is_empty() {
        eprintln!("{} row error(s):", errors.len());
        for error in &errors {
            eprintln!("  {}", error);
        }
    }

    Ok(())
}
