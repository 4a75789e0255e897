//! Command-line arguments, logging setup, and the non-interactive `list` command.
//!
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::api::{DivisionsApi, HttpDivisionsApi};
use crate::error::{Context, Result};
use crate::model::DivisionRow;
use crate::query::{self, ColumnFilters, Sort};

#[derive(Debug, Parser)]
#[command(name = "org-divisions", version, about = "Browse organizational divisions served by an HTTP API")]
pub struct Cli {
    /// Base URL of the divisions API (without the trailing `/divisions`).
    #[arg(long, env = "DIVISIONS_API_BASE_URL", default_value = "http://localhost:3000/api")]
    pub api_base_url: String,

    /// Request timeout in seconds.
    #[arg(long, env = "DIVISIONS_API_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,

    /// Rows per table page.
    #[arg(
        long,
        default_value_t = crate::app::DEFAULT_PAGE_SIZE,
        value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..)
    )]
    pub page_size: usize,

    /// Write logs to this file. The TUI logs nowhere without it.
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace). `RUST_LOG` wins when set.
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch, filter, sort and print divisions once.
    List(ListArgs),
}

#[derive(Debug, Clone, Default, clap::Args)]
pub struct ListArgs {
    /// Free-text search over name, parent, ambassador and numeric columns.
    #[arg(long)]
    pub search: Option<String>,
    /// Keep only divisions with this exact name (repeatable).
    #[arg(long = "name")]
    pub names: Vec<String>,
    /// Keep only divisions under this exact parent name (repeatable).
    #[arg(long = "parent")]
    pub parents: Vec<String>,
    /// Keep only divisions at this level (repeatable).
    #[arg(long = "level")]
    pub levels: Vec<u32>,
    /// Sort as `column[:asc|:desc]`; columns: name, parent, level, collaborators, subdivisions.
    #[arg(long)]
    pub sort: Option<Sort>,
    /// Print JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

impl ListArgs {
    pub fn filters(&self) -> ColumnFilters {
        ColumnFilters {
            names: self.names.iter().cloned().collect(),
            parent_names: self.parents.iter().cloned().collect(),
            levels: self.levels.iter().copied().collect(),
        }
    }
}

impl Cli {
    pub fn build_api(&self) -> Result<HttpDivisionsApi> {
        HttpDivisionsApi::new(&self.api_base_url, Duration::from_secs(self.timeout_secs.max(1)))
            .with_ctx(|| format!("preparing client for {}", self.api_base_url))
    }
}

/// Install the global subscriber. Logs go to `log_file`, else stderr when
/// `to_stderr` is set, else nowhere.
pub fn setup_logging(verbosity: u8, log_file: Option<&PathBuf>, to_stderr: bool) -> Result<()> {
    let level = match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if let Some(path) = log_file {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_ctx(|| format!("opening log file {}", path.display()))?;
        builder
            .with_ansi(false)
            .with_writer(std::sync::Mutex::new(file))
            .try_init()?;
    } else if to_stderr {
        builder.with_writer(std::io::stderr).try_init()?;
    }
    Ok(())
}

/// Run the pipeline once against `api` and write the result to `out`.
pub fn run_list(api: &dyn DivisionsApi, args: &ListArgs, out: &mut dyn Write) -> Result<()> {
    let rows = api
        .list_all_enriched()
        .with_ctx(|| "could not load divisions".to_string())?;
    let term = args.search.as_deref().unwrap_or("");
    let view = query::apply(&rows, term, &args.filters(), args.sort);
    tracing::info!(loaded = rows.len(), shown = view.len(), "list");

    if args.json {
        serde_json::to_writer_pretty(&mut *out, &view)?;
        writeln!(out)?;
    } else {
        write_table(&view, &rows, out)?;
    }
    Ok(())
}

fn write_table(rows: &[DivisionRow], all: &[DivisionRow], out: &mut dyn Write) -> std::io::Result<()> {
    let name_w = rows
        .iter()
        .map(|r| r.name().chars().count())
        .chain(std::iter::once("DIVISION".len()))
        .max()
        .unwrap_or(8);
    let parent_w = rows
        .iter()
        .map(|r| r.parent_name_or_empty().chars().count())
        .chain(std::iter::once("PARENT".len()))
        .max()
        .unwrap_or(6);
    writeln!(
        out,
        "{:<name_w$}  {:<parent_w$}  {:>5}  {:>13}  {:>12}  AMBASSADOR",
        "DIVISION", "PARENT", "LEVEL", "COLLABORATORS", "SUBDIVISIONS"
    )?;
    for r in rows {
        writeln!(
            out,
            "{:<name_w$}  {:<parent_w$}  {:>5}  {:>13}  {:>12}  {}",
            r.name(),
            r.parent_name_or_empty(),
            r.division.level,
            r.division.collaborators_count,
            r.subdivision_count,
            r.division.ambassador_full_name.as_deref().unwrap_or("")
        )?;
    }
    writeln!(
        out,
        "{} of {} divisions, {} collaborators in total",
        rows.len(),
        all.len(),
        crate::model::total_collaborators(all)
    )?;
    Ok(())
}
