//! stockpick CLI — run configured selectors over a CSV bar directory.
//!
//! Commands:
//! - `select`: evaluate every active selector of a config file on one date
//! - `selectors`: list the selector variants and their aliases

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use stockpick_core::components::SELECTOR_VARIANTS;
use stockpick_runner::{
    parse_date, CsvDirLoader, SelectionResult, SelectionRunner, SelectorFile,
};

#[derive(Parser)]
#[command(name = "stockpick", about = "stockpick — rule-based daily stock screener")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the active selectors of a config file against a data directory.
    Select {
        /// Directory of `<ticker>.csv` files.
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,

        /// Selector config file (.json or .toml).
        #[arg(long, default_value = "configs.json")]
        config: PathBuf,

        /// Target date (YYYY-MM-DD). Defaults to the latest date in the data.
        #[arg(long)]
        date: Option<String>,

        /// "all" or a comma-separated list of tickers.
        #[arg(long, default_value = "all")]
        tickers: String,

        /// Worker threads; 1 runs sequentially.
        #[arg(long, default_value_t = 1)]
        workers: usize,

        /// Write all results as JSON to this path.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// List selector variants.
    Selectors,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Select {
            data_dir,
            config,
            date,
            tickers,
            workers,
            output,
        } => run_select(&data_dir, &config, date.as_deref(), &tickers, workers, output),
        Commands::Selectors => {
            for (class, alias) in SELECTOR_VARIANTS {
                println!("{class:<28} {alias}");
            }
            Ok(())
        }
    }
}

fn run_select(
    data_dir: &Path,
    config_path: &Path,
    date: Option<&str>,
    tickers: &str,
    workers: usize,
    output: Option<PathBuf>,
) -> Result<()> {
    let date: Option<NaiveDate> = match date {
        Some(raw) => match parse_date(raw) {
            Some(d) => Some(d),
            None => bail!("invalid --date '{raw}', expected YYYY-MM-DD"),
        },
        None => None,
    };

    let file = SelectorFile::from_path(config_path).map_err(|e| {
        error!(path = %config_path.display(), "{e}");
        e
    })?;
    let configs: Vec<_> = file.active().cloned().collect();
    if configs.is_empty() {
        bail!("no active selectors in {}", config_path.display());
    }

    let loader = CsvDirLoader::new(data_dir);
    let universe = parse_universe(tickers, &loader)?;
    info!(
        tickers = universe.len(),
        selectors = configs.len(),
        data_dir = %data_dir.display(),
        "starting selection"
    );

    let results = SelectionRunner::new(workers)
        .run_all(&universe, &loader, &configs, date)
        .map_err(|e| {
            error!("{e}");
            e
        })?;

    for result in &results {
        print_summary(result);
    }

    if let Some(path) = output {
        let json = serde_json::to_string_pretty(&results)?;
        std::fs::write(&path, json)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("Results saved to: {}", path.display());
    }

    Ok(())
}

/// `all` lists the data directory; anything else is a comma-separated list.
fn parse_universe(raw: &str, loader: &CsvDirLoader) -> Result<Vec<String>> {
    if raw.trim().eq_ignore_ascii_case("all") {
        let tickers = loader
            .list_tickers()
            .with_context(|| format!("failed to list {}", loader.dir().display()))?;
        if tickers.is_empty() {
            bail!("no CSV files in {}", loader.dir().display());
        }
        return Ok(tickers);
    }
    let tickers: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect();
    if tickers.is_empty() {
        bail!("--tickers is empty");
    }
    Ok(tickers)
}

fn print_summary(result: &SelectionResult) {
    println!();
    println!("=== {} ===", result.strategy());
    println!("Selector:       {}", result.selector());
    println!("Date:           {}", result.date());
    println!("Config hash:    {}", result.config_hash().short());
    println!("Evaluated:      {}", result.evaluated());
    println!("Skipped:        {}", result.skipped().len());
    println!("Matches:        {}", result.matches().len());
    if result.matches().is_empty() {
        println!("  (none)");
    } else {
        let matches: Vec<&str> = result.matches().iter().map(|s| s.as_str()).collect();
        println!("  {}", matches.join(", "));
    }
}
