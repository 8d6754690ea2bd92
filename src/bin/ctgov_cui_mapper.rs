//! Add CUIs to a ClinicalTrials.gov export
//!
//! Usage:
//!   ctgov_cui_mapper run <input> <mesh-dictionary.json> --lexicon <lexicon.json>
//!   ctgov_cui_mapper extract-column <input> <output-dir> <column-index>
//!
//! `run` writes `<input>_CUIs_v3.csv`, `<input>_CUIs_v3.csv_report.txt` and a
//! `missingCUIs.txt` diagnostics file next to the output.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ctgov_cui_mapper::extract::DEFAULT_SAMPLE_LIMIT;
use ctgov_cui_mapper::{
    extract_column, run_files, EnrichConfig, LexiconIndex, TerminologySearch, TimeoutSearch,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(about = "Add MeSH, MedDRA and SNOMED CT CUIs to ClinicalTrials.gov tables", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Enrich a tab-delimited export with CUI columns.
    Run {
        /// Tab-delimited input with a header line.
        #[arg(value_name = "INPUT", value_hint = clap::ValueHint::FilePath)]
        input: PathBuf,

        /// JSON object mapping lowercase MeSH terms to CUIs.
        #[arg(value_name = "DICTIONARY", value_hint = clap::ValueHint::FilePath)]
        dictionary: PathBuf,

        /// JSON concept lexicon searched for the free-text column.
        #[arg(long = "lexicon", value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
        lexicon: PathBuf,

        /// Optional JSON run configuration.
        #[arg(long = "config", value_name = "FILE")]
        config: Option<PathBuf>,

        /// Diagnostics file (default: missingCUIs.txt beside the output).
        #[arg(long = "diagnostics", value_name = "FILE")]
        diagnostics: Option<PathBuf>,

        /// Per-row terminology search timeout in milliseconds (0 disables).
        #[arg(long = "timeout-ms", value_name = "MS")]
        timeout_ms: Option<u64>,
    },

    /// Write one column of the first rows into numbered files.
    ExtractColumn {
        #[arg(value_name = "INPUT", value_hint = clap::ValueHint::FilePath)]
        input: PathBuf,

        #[arg(value_name = "OUTPUT_DIR")]
        output_dir: PathBuf,

        /// Zero-based column index.
        #[arg(value_name = "COLUMN")]
        column: usize,

        #[arg(long = "limit", default_value_t = DEFAULT_SAMPLE_LIMIT)]
        limit: usize,
    },
}

fn main() -> Result<()> {
    // Initialize tracing (structured logging)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ctgov_cui_mapper=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match Cli::parse().command {
        Command::Run {
            input,
            dictionary,
            lexicon,
            config,
            diagnostics,
            timeout_ms,
        } => {
            let mut config = match config {
                Some(path) => EnrichConfig::load(&path)
                    .with_context(|| format!("Failed to load config: {}", path.display()))?,
                None => EnrichConfig::default(),
            };
            if diagnostics.is_some() {
                config.diagnostics_path = diagnostics;
            }
            if let Some(ms) = timeout_ms {
                config.search_timeout_ms = (ms > 0).then_some(ms);
            }
            run(&input, &dictionary, &lexicon, &config)
        }
        Command::ExtractColumn {
            input,
            output_dir,
            column,
            limit,
        } => {
            let files = extract_column(&input, &output_dir, column, limit, '\t')
                .with_context(|| format!("Failed to extract column {} from {}", column, input.display()))?;
            println!("Wrote {} files to {}", files.len(), output_dir.display());
            Ok(())
        }
    }
}

fn run(
    input: &std::path::Path,
    dictionary: &std::path::Path,
    lexicon: &std::path::Path,
    config: &EnrichConfig,
) -> Result<()> {
    println!("\n{}", "=".repeat(70));
    println!("CUI Mapper");
    println!("{}", "=".repeat(70));

    let start = Instant::now();

    let index = LexiconIndex::load(lexicon)
        .with_context(|| format!("Failed to load lexicon: {}", lexicon.display()))?;
    let mut search: Box<dyn TerminologySearch> = match config.search_timeout_ms {
        Some(ms) => Box::new(
            TimeoutSearch::new(index, Duration::from_millis(ms))
                .context("Failed to start terminology search worker")?,
        ),
        None => Box::new(index),
    };

    println!("Adding CUIs. This may take a while.");
    let summary = run_files(input, dictionary, search.as_mut(), config)
        .with_context(|| format!("Failed to add CUIs to {}", input.display()))?;

    println!();
    println!("Finished in {:.2?}", start.elapsed());
    println!("  Rows:        {}", summary.stats.rows());
    println!("  Output:      {}", summary.output_path.display());
    println!("  Report:      {}", summary.report_path.display());
    println!(
        "  Diagnostics: {} ({} events)",
        summary.diagnostics_path.display(),
        summary.diagnostics_events
    );
    Ok(())
}
