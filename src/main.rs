use anyhow::Result;
use clap::Parser;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

use home_migrate::config::default_config_path;
use home_migrate::logging::DEFAULT_LOG_DIR;
use home_migrate::{init_logging, MigrationReport, Migrator, Settings};

#[derive(Parser)]
#[command(name = "home-migrate")]
#[command(about = "Migrate legacy home and profile folders to a new file share", long_about = None)]
#[command(version)]
struct Cli {
    /// Settings file (defaults to appsettings.json next to the executable)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for the daily rolling log files
    #[arg(long, default_value = DEFAULT_LOG_DIR)]
    log_dir: PathBuf,
}

fn run(cli: Cli) -> Result<MigrationReport> {
    let config_path = match cli.config {
        Some(path) => path,
        None => default_config_path()?,
    };

    let settings = Settings::load(&config_path)?;
    info!("Loaded settings from {}", config_path.display());

    Migrator::prepare(settings)?.run()
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        *msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "unknown panic payload"
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_guard = match init_logging(&cli.log_dir) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    info!("--- Migration Started ---");

    let code = match panic::catch_unwind(AssertUnwindSafe(|| run(cli))) {
        Ok(Ok(_report)) => ExitCode::SUCCESS,
        Ok(Err(e)) => {
            error!(fatal = true, "Migration aborted: {:#}", e);
            ExitCode::FAILURE
        }
        Err(payload) => {
            error!(
                fatal = true,
                "Migration aborted by an unexpected panic: {}",
                panic_message(payload.as_ref())
            );
            ExitCode::FAILURE
        }
    };

    // Flushes the file writer on every exit path
    drop(log_guard);
    code
}
