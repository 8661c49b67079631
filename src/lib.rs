mod console;
pub mod db;
pub mod export;
pub mod inspection;
pub mod session;
pub mod settings;
pub mod stats;
mod utils;

use std::{
    path::{Path, PathBuf},
    process::ExitCode,
    sync::Arc,
};

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use console::ConsoleSink;
use db::LogStore;
use directories::ProjectDirs;
use log::info;
use session::{
    commands::{export_snapshot_to, report_stats, run_scan_loop, HELP_TEXT},
    SessionController, SessionEvent,
};
use settings::{Settings, SETTINGS_FILE_NAME};

#[derive(Parser)]
#[command(
    name = "scancheck",
    version,
    about = "Duplicate-scan verification with a durable inspection log"
)]
struct Cli {
    /// Directory holding the inspection database and settings.json
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Settings file to use instead of <data-dir>/settings.json
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(long, global = true)]
    debug: bool,

    /// Print one JSON object per event instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Read scans from stdin, alternating first and second code (default)
    Scan,
    /// Compare two codes and record the result
    Check { code_a: String, code_b: String },
    /// Show every stored inspection and the recounted totals
    Restore,
    /// Show the totals
    Stats,
    /// Show inspections captured in a time range (RFC 3339)
    List {
        #[arg(long)]
        since: Option<DateTime<Utc>>,
        #[arg(long)]
        until: Option<DateTime<Utc>>,
    },
    /// Write the inspection log as a one-sheet workbook (CSV for a .csv path)
    Export {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Erase every stored inspection
    Reset {
        /// Confirm the erase; it cannot be undone
        #[arg(long)]
        yes: bool,
    },
}

fn resolve_data_dir(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(dir) = explicit {
        return Ok(dir.to_path_buf());
    }
    ProjectDirs::from("", "", "scancheck")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| anyhow!("could not determine a data directory; pass --data-dir"))
}

pub fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    utils::logging::init(cli.debug);

    info!("scancheck starting up...");

    let data_dir = resolve_data_dir(cli.data_dir.as_deref())?;
    let settings_path = cli
        .config
        .clone()
        .unwrap_or_else(|| data_dir.join(SETTINGS_FILE_NAME));
    let settings = Settings::load(&settings_path)?;

    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    runtime.block_on(dispatch(
        cli.command.unwrap_or(Command::Scan),
        cli.json,
        settings,
        data_dir,
    ))
}

async fn dispatch(
    command: Command,
    json: bool,
    settings: Settings,
    data_dir: PathBuf,
) -> Result<ExitCode> {
    let store = LogStore::open(settings.database_path(&data_dir));
    let sink = Arc::new(ConsoleSink::new(json, settings.export.date_format.clone()));
    let controller = SessionController::new(store, sink.clone());

    // Totals cover earlier runs too. A failure here is the one-time
    // degraded-mode notice when the store could not be opened.
    let recount = controller.recount().await;

    let ok = match command {
        Command::Scan => {
            if let Ok(counters) = recount {
                info!("{} inspections on record", counters.total_inspections);
            }
            sink.emit_notice(HELP_TEXT);
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            run_scan_loop(&controller, &settings.export, stdin).await?;
            true
        }
        Command::Check { code_a, code_b } => {
            let report = controller.inspect(&code_a, &code_b).await;
            matches!(report, session::CycleReport::Recorded { .. })
        }
        Command::Restore => controller.restore().await.is_ok(),
        Command::Stats => {
            report_stats(&controller).await;
            recount.is_ok()
        }
        Command::List { since, until } => {
            let from = since.unwrap_or_default();
            let to = until.unwrap_or_else(Utc::now);
            match controller.records_between(from, to).await {
                Ok(records) => {
                    controller
                        .events()
                        .emit(SessionEvent::RecordsListed { records });
                    true
                }
                Err(_) => false,
            }
        }
        Command::Export { output } => {
            let path = output.unwrap_or_else(|| settings.default_export_path());
            export_snapshot_to(&controller, &path, &settings.export)
                .await?
                .is_some()
        }
        Command::Reset { yes } => {
            if yes {
                controller.reset().await.is_ok()
            } else {
                sink.emit_notice("Refusing to erase the inspection log without --yes.");
                false
            }
        }
    };

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
