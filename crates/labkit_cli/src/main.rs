use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use labkit_report::{
    C_APP_NAME_DEFAULT, C_DATE_FORMAT_DEFAULT, ReportExporter, SpecReportOptions, SystemData,
};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "labkit",
    version,
    about = "Lab lending report exporter",
    long_about = "Turns a lending-system JSON snapshot (requests, components, users, \
                  sessions) into a styled multi-sheet XLSX report, or prints the \
                  on-screen preview summary."
)]
struct Cli {
    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write <app-name>-Report-<YYYY-MM-DD>.xlsx
    Export(ExportArgs),

    /// Print the preview summary as JSON
    Preview {
        /// Snapshot JSON file
        #[arg(short, long)]
        snapshot: PathBuf,
    },
}

#[derive(Args)]
struct ExportArgs {
    /// Snapshot JSON file
    #[arg(short, long)]
    snapshot: PathBuf,

    /// Output directory
    #[arg(short, long, env = "LABKIT_OUT_DIR", default_value = ".")]
    out_dir: PathBuf,

    /// Prefix of the report file name
    #[arg(long, env = "LABKIT_APP_NAME", default_value = C_APP_NAME_DEFAULT)]
    app_name: String,

    /// Append the User Activity Report sheet
    #[arg(long)]
    include_user_activity: bool,

    /// Display offset from UTC in minutes
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    utc_offset_minutes: i32,

    /// chrono format for date cells
    #[arg(long, default_value = C_DATE_FORMAT_DEFAULT)]
    date_format: String,
}

fn setup_logging(if_verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if if_verbose { "debug" } else { "info" }));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_snapshot(path: &Path) -> Result<SystemData> {
    SystemData::load_from_path(path)
        .with_context(|| format!("Failed to load snapshot {}", path.display()))
}

fn run_export(args: ExportArgs) -> Result<()> {
    let data = load_snapshot(&args.snapshot)?;
    let exporter = ReportExporter::new(SpecReportOptions {
        app_name: args.app_name,
        date_format: args.date_format,
        utc_offset_minutes: args.utc_offset_minutes,
        include_user_activity: args.include_user_activity,
        now: None,
    })?;

    let outcome = exporter
        .export_to_xlsx(&data, &args.out_dir)
        .context("Export failed")?;
    println!("{}", outcome.path_file_out.display());
    Ok(())
}

fn run_preview(path_snapshot: &Path) -> Result<()> {
    let data = load_snapshot(path_snapshot)?;
    let preview = ReportExporter::default().generate_preview_data(&data);
    println!("{}", serde_json::to_string_pretty(&preview)?);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Commands::Export(args) => run_export(args),
        Commands::Preview { snapshot } => run_preview(&snapshot),
    }
}
