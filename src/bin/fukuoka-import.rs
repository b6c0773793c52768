//! Load the Fukuoka open-data CSV files into the database.
//!
//! - `fukuoka-import air-quality [--file kankyodata48.csv]`
//! - `fukuoka-import dams [--file fukuoka_9_damu_data.csv]`

use clap::{Parser, Subcommand};
use sea_orm::Database;
use sea_orm_migration::MigratorTrait;
use std::path::PathBuf;
use std::process::ExitCode;

use fukuoka_data_api::config::Config;
use fukuoka_data_api::import::{
    DEFAULT_BATCH_SIZE, ImportError, ImportReport, air_quality, dam_levels,
};
use fukuoka_data_api::telemetry;

#[derive(Parser, Debug)]
#[command(name = "fukuoka-import")]
#[command(about = "Import Fukuoka air-quality and dam-level CSV files", long_about = None)]
struct Cli {
    /// Rows per INSERT statement
    #[arg(short, long, env = "IMPORT_BATCH_SIZE", default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Hourly air-quality measurements (Shift_JIS CSV)
    AirQuality {
        #[arg(short, long, default_value = air_quality::DEFAULT_FILE)]
        file: PathBuf,
    },

    /// Dam water levels (Shift_JIS CSV)
    Dams {
        #[arg(short, long, default_value = dam_levels::DEFAULT_FILE)]
        file: PathBuf,
    },
}

async fn run(cli: Cli) -> Result<ImportReport, ImportError> {
    let database_url = Config::database_url_from_env()?;

    tracing::info!("Connecting to database...");
    let db = Database::connect(&database_url).await?;
    migration::Migrator::up(&db, None).await?;

    let result = match &cli.command {
        Commands::AirQuality { file } => air_quality::import_file(&db, file, cli.batch_size).await,
        Commands::Dams { file } => dam_levels::import_file(&db, file, cli.batch_size).await,
    };

    if let Err(e) = db.close().await {
        tracing::warn!(error = %e, "Failed to close database connection");
    }
    result
}

#[tokio::main]
async fn main() -> ExitCode {
    telemetry::init_tracing();
    let cli = Cli::parse();
    tracing::debug!(?cli, "Starting import");

    match run(cli).await {
        Ok(report) => {
            tracing::info!(
                prepared = report.prepared,
                inserted = report.inserted,
                skipped = report.skipped,
                "Import completed"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Import failed");
            ExitCode::FAILURE
        }
    }
}
