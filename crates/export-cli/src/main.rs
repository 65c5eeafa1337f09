//! # export-cli
//!
//! Command-line front end for the record export engine.
//!
//! Reads export options (YAML or JSON), an optional mapping catalog, and a JSON
//! document of records, and writes the export as CSV.

#![deny(rust_2018_idioms)]
#![warn(clippy::all)]

mod logging;

use anyhow::Context;
use clap::{Parser, Subcommand};
use export_adapter_csv::{CsvConfig, CsvLineSerializer, NullRepresentation};
use export_engine::{ExportEngine, ExportSummary, JsonRecordSource};
use export_ir::{FieldRecord, LineSerializer};
use export_mapping::{AccessorRegistry, ExportOptions, MappingCatalog, MappingSpec};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "rexport")]
#[command(about = "Export records as CSV through a column mapping")]
#[command(version)]
struct Cli {
    /// Mapping catalog file, needed for `mapping:` options
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export a relation as CSV
    Export {
        /// Export options file (.yaml, .yml or .json)
        #[arg(short, long)]
        config: PathBuf,

        /// JSON document of records, keyed by relation
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Prefer `<field>_lookup_value` over raw field values
        #[arg(long)]
        lookup_values: bool,

        /// strftime pattern applied to every date and time value
        #[arg(long)]
        date_pattern: Option<String>,

        /// Field delimiter
        #[arg(long, default_value_t = ',')]
        delimiter: char,

        /// Text written for absent cells
        #[arg(long)]
        null_text: Option<String>,
    },

    /// Print the header line a configuration produces
    Columns {
        /// Export options file (.yaml, .yml or .json)
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Validate a configuration without reading records
    Check {
        /// Export options file (.yaml, .yml or .json)
        #[arg(short, long)]
        config: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    logging::init();

    let cli = Cli::parse();
    let catalog = load_catalog(cli.catalog.as_deref())?;

    match cli.command {
        Commands::Export {
            config,
            input,
            output,
            lookup_values,
            date_pattern,
            delimiter,
            null_text,
        } => {
            let options = load_options(&config)?;
            let source = JsonRecordSource::from_file(&input)
                .with_context(|| format!("Failed to load records from {}", input.display()))?;

            let mut engine =
                ExportEngine::from_options(source, &options, &AccessorRegistry::new(), &catalog)?
                    .with_lookup_values(lookup_values);
            if let Some(pattern) = date_pattern.as_deref() {
                engine = engine.with_date_pattern(pattern)?;
            }

            let mut csv = CsvConfig::new().delimiter(delimiter);
            if let Some(text) = null_text {
                csv = csv.null_representation(NullRepresentation::Custom(text));
            }

            info!(
                relation = engine.spec().relation(),
                input = %input.display(),
                "Exporting"
            );
            let summary = match &output {
                Some(path) => write_file(&engine, path, csv)?,
                None => engine.write_csv(io::stdout().lock(), csv)?,
            };
            info!(rows = summary.rows, lines = summary.lines, "Export complete");
        }
        Commands::Columns { config } => {
            let options = load_options(&config)?;
            let spec = compile(&options, &catalog)?;
            let names: Vec<String> = spec.column_names().into_iter().map(str::to_string).collect();
            let line = CsvLineSerializer::default().render(&names)?;
            io::stdout().write_all(line.as_bytes())?;
        }
        Commands::Check { config } => {
            let options = load_options(&config)?;
            let spec = compile(&options, &catalog)?;
            println!(
                "OK: relation '{}' with {} columns",
                spec.relation(),
                spec.len()
            );
        }
    }

    Ok(())
}

fn load_options(path: &Path) -> anyhow::Result<ExportOptions> {
    let options = ExportOptions::from_file(path)
        .with_context(|| format!("Invalid export options in {}", path.display()))?;
    info!(path = %path.display(), "Loaded export options");
    Ok(options)
}

fn load_catalog(path: Option<&Path>) -> anyhow::Result<MappingCatalog> {
    match path {
        Some(path) => MappingCatalog::from_file(path)
            .with_context(|| format!("Invalid mapping catalog in {}", path.display())),
        None => Ok(MappingCatalog::new()),
    }
}

fn compile(
    options: &ExportOptions,
    catalog: &MappingCatalog,
) -> anyhow::Result<MappingSpec<FieldRecord>> {
    Ok(MappingSpec::from_options(
        options,
        &AccessorRegistry::new(),
        catalog,
    )?)
}

fn write_file(
    engine: &ExportEngine<JsonRecordSource>,
    path: &Path,
    config: CsvConfig,
) -> anyhow::Result<ExportSummary> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    let summary = engine.write_csv(BufWriter::new(file), config)?;
    info!(path = %path.display(), "Wrote export");
    Ok(summary)
}
