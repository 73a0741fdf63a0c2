use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use membership_core::benefits::PanelSettings;
use membership_core::cache::RecordCache;
use membership_core::config::{DashboardConfig, CONFIG_PATH_ENV, EXPORT_PATH_ENV};
use membership_core::dataset::EnrichedDataset;
use membership_core::summary::DashboardSummary;
use polars::prelude::ParquetWriter;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod render;

#[derive(Parser, Debug)]
#[command(author, version, about = "Membership benefit usage dashboard", long_about = None)]
struct Cli {
    /// TOML settings file (overrides MEMBERSHIP_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Membership export CSV (overrides MEMBERSHIP_EXPORT and the config file)
    #[arg(long, global = true)]
    export: Option<PathBuf>,
    /// Measure ages against midnight of this date instead of now
    #[arg(long, global = true)]
    reference_date: Option<NaiveDate>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List primary holders in the export
    Holders,
    /// List order years recorded for a holder
    Years(HolderArgs),
    /// Show the usage dashboard for a holder and year
    Report(ReportArgs),
    /// Write the records of a holder and year to Parquet
    Export(ExportArgs),
}

#[derive(Args, Debug)]
struct HolderArgs {
    #[arg(long)]
    holder: String,
}

#[derive(Args, Debug)]
struct ReportArgs {
    #[arg(long)]
    holder: String,
    /// Defaults to the first year recorded for the holder
    #[arg(long)]
    year: Option<i32>,
    /// Print the summary as JSON instead of tables
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct ExportArgs {
    #[arg(long)]
    holder: String,
    #[arg(long)]
    year: i32,
    #[arg(long)]
    output: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = resolve_config(&cli)?;
    let settings = config.panel_settings();
    let options = config
        .preparation_options(Local::now().naive_local())
        .context("invalid dashboard settings")?;
    let cache = RecordCache::new(config.export_path.clone(), options);

    match cli.command {
        Command::Holders => {
            let holders = load(&cache)?.holders()?;
            println!("{}", render::list_table("Primary holder", holders));
        }
        Command::Years(args) => {
            let dataset = load(&cache)?;
            let view = dataset.select_holder(&args.holder)?;
            let years = view.years().iter().map(|year| year.to_string());
            println!("{}", render::list_table("Year", years));
        }
        Command::Report(args) => report(&cache, &settings, args)?,
        Command::Export(args) => export(&cache, args)?,
    }

    Ok(())
}

fn resolve_config(cli: &Cli) -> Result<DashboardConfig> {
    let config_path = cli
        .config
        .clone()
        .or_else(|| std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from));

    let mut config = match config_path {
        Some(path) => DashboardConfig::load(&path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => DashboardConfig::default(),
    };

    if let Some(path) = std::env::var_os(EXPORT_PATH_ENV) {
        config.export_path = PathBuf::from(path);
    }
    if let Some(path) = &cli.export {
        config.export_path = path.clone();
    }
    if let Some(date) = cli.reference_date {
        config.reference_date = Some(date.format("%Y-%m-%d").to_string());
    }

    Ok(config)
}

fn load(cache: &RecordCache) -> Result<&EnrichedDataset> {
    cache
        .get()
        .with_context(|| format!("failed to load export {}", cache.path().display()))
}

fn report(cache: &RecordCache, settings: &PanelSettings, args: ReportArgs) -> Result<()> {
    let dataset = load(cache)?;
    let holder = dataset.select_holder(&args.holder)?;
    let year = match args.year {
        Some(year) => year,
        None => holder
            .default_year()
            .with_context(|| format!("no order years recorded for '{}'", args.holder))?,
    };
    let view = holder.select_year(year)?;

    let summary = DashboardSummary::build(&view, settings)
        .with_context(|| format!("failed to summarise '{}' for {year}", args.holder))?
        .with_reference(dataset.reference());

    if args.json {
        println!("{}", summary.to_json_pretty()?);
    } else {
        println!("{}", render::report(&summary));
    }
    Ok(())
}

fn export(cache: &RecordCache, args: ExportArgs) -> Result<()> {
    let dataset = load(cache)?;
    let view = dataset.select_holder(&args.holder)?.select_year(args.year)?;

    let file = File::create(&args.output)
        .with_context(|| format!("failed to create {}", args.output.display()))?;
    let mut frame = view.frame().clone();
    ParquetWriter::new(file)
        .finish(&mut frame)
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    info!(
        holder = %args.holder,
        year = args.year,
        rows = view.len(),
        output = %args.output.display(),
        "exported selection"
    );
    Ok(())
}
