//! pq2csv CLI: convert a Parquet file to CSV.

use clap::Parser;
use pq2csv_core::config::ConvertConfig;
use pq2csv_core::schema::Schema;
use pq2csv_core::session::Termination;
use pq2csv_exec::{convert_parquet, ConvertError};
use pq2csv_io::readers::parquet::{ParquetReader, ReadOptions};
use pq2csv_io::readers::RowSource;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "pq2csv", version = pq2csv_core::VERSION)]
#[command(about = "Convert a Parquet file to CSV", long_about = None)]
struct Cli {
    /// Path to the Parquet file (alternative to --in)
    input: Option<PathBuf>,

    /// Path to the Parquet file (if not set, the positional argument is used)
    #[arg(long = "in", value_name = "PATH")]
    in_path: Option<PathBuf>,

    /// Path to the output CSV file (defaults to standard output)
    #[arg(long, value_name = "PATH")]
    out: Option<PathBuf>,

    /// Allow overwriting an existing output file
    #[arg(long)]
    overwrite: bool,

    /// Limit the number of rows to convert (0 = all rows)
    #[arg(short = 'n', long = "rows", value_name = "N")]
    rows: Option<u64>,

    /// Only convert these columns (comma separated, kept in file order)
    #[arg(long, value_delimiter = ',', value_name = "COLS")]
    columns: Option<Vec<String>>,

    /// Print the file schema as JSON and exit
    #[arg(long)]
    schema: bool,

    /// Only log warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("invalid flags or arguments: {0}")]
    Args(String),

    #[error("{0}")]
    Config(#[from] pq2csv_core::error::Error),

    #[error("failed to open {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read schema: {0}")]
    Schema(#[from] pq2csv_io::Error),

    #[error("failed to print schema: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to convert parquet file to csv ({}): {0}", .0.stage())]
    Convert(#[from] ConvertError),
}

impl CliError {
    fn suggestions(&self) -> Vec<String> {
        match self {
            CliError::Args(_) => vec!["Run with --help for usage".into()],
            CliError::Config(e) => e.suggestions(),
            CliError::Convert(e) => e.suggestions(),
            _ => vec![],
        }
    }
}

#[derive(Serialize)]
struct SchemaSummary<'a> {
    num_rows: i64,
    num_row_groups: usize,
    #[serde(flatten)]
    schema: &'a Schema,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.quiet);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        let suggestions = e.suggestions();
        if !suggestions.is_empty() {
            eprintln!("Suggestions:");
            for suggestion in suggestions {
                eprintln!("  - {}", suggestion);
            }
        }
        std::process::exit(1);
    }
}

fn init_tracing(quiet: bool) {
    let default_level = if quiet { "warn" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<(), CliError> {
    let input = resolve_input(&cli)?;

    if cli.schema {
        return print_schema(&input, cli.columns);
    }

    if let Some(out) = &cli.out {
        check_output(out, cli.overwrite)?;
    }

    let mut cfg = ConvertConfig::from_env()?;
    if let Some(rows) = cli.rows {
        cfg.row_limit = rows;
    }

    let input_file = File::open(&input).map_err(|source| CliError::Open {
        path: input.clone(),
        source,
    })?;
    let output = open_output(cli.out.as_deref(), cli.overwrite)?;

    let report = convert_parquet(input_file, output, cfg, cli.columns)?;
    match report.termination {
        Termination::RowLimit => tracing::debug!(rows = report.rows, "stopped at row limit"),
        Termination::EndOfData => tracing::debug!(rows = report.rows, "converted whole file"),
    }
    Ok(())
}

/// Pick the input path from `--in` or the single positional argument.
fn resolve_input(cli: &Cli) -> Result<PathBuf, CliError> {
    match (&cli.input, &cli.in_path) {
        (Some(_), Some(_)) => Err(CliError::Args(
            "must specify either the --in flag or a non-flag argument but not both".into(),
        )),
        (None, None) => Err(CliError::Args(
            "must specify the --in flag or exactly one non-flag argument".into(),
        )),
        (Some(path), None) | (None, Some(path)) => Ok(path.clone()),
    }
}

/// Refuse to clobber an existing output file unless `--overwrite` was given.
fn check_output(path: &Path, overwrite: bool) -> Result<(), CliError> {
    if !overwrite && path.exists() {
        return Err(CliError::Args(format!(
            "output file {} already exists. Either specify --overwrite or pick a new path",
            path.display()
        )));
    }
    Ok(())
}

fn open_output(path: Option<&Path>, overwrite: bool) -> Result<Box<dyn Write>, CliError> {
    let Some(path) = path else {
        return Ok(Box::new(io::stdout().lock()));
    };

    let mut options = OpenOptions::new();
    options.write(true);
    if overwrite {
        options.create(true).truncate(true);
    } else {
        options.create_new(true);
    }
    let file = options.open(path).map_err(|source| CliError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Box::new(file))
}

fn print_schema(input: &Path, columns: Option<Vec<String>>) -> Result<(), CliError> {
    let mut options = ReadOptions::default();
    options.projection = columns;
    let reader = ParquetReader::from_path(input, options)?;

    let summary = SchemaSummary {
        num_rows: reader.total_rows(),
        num_row_groups: reader.num_row_groups(),
        schema: reader.schema(),
    };
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &summary)?;
    writeln!(stdout).map_err(serde_json::Error::io)?;
    Ok(())
}
