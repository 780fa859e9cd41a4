use std::path::PathBuf;

use activity_tracker::cli::{run_replay, run_summary};
use activity_tracker::config::AppConfig;
use activity_tracker::sessions::store::SessionStore;
use activity_tracker::tracking::models::ActivityKind;
use activity_tracker::{api, error::TrackerError};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "activity-tracker")]
#[command(author, version, about = "Live activity tracking engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the tracking engine over HTTP
    Serve,
    /// Replay a recorded GPX track through the engine
    Replay {
        /// GPX file to replay
        file: String,
        /// Activity kind (running, walking, cycling, hiking)
        #[arg(short, long, default_value = "running")]
        kind: ActivityKind,
        /// Store the resulting session in this directory
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Write the recorded route to this GPX file
        #[arg(long)]
        gpx: Option<String>,
    },
    /// Summarize stored sessions per activity kind
    Summary {
        /// Sessions directory (defaults to TRACKER_SESSIONS_DIR)
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },
}

#[actix_web::main]
async fn main() -> Result<(), TrackerError> {
    let config = AppConfig::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve => api::run_api(config).await?,
        Commands::Replay {
            file,
            kind,
            out,
            gpx,
        } => {
            let store = out.map(SessionStore::new);
            run_replay(&file, kind, store, gpx.as_deref(), config.tracking).await?;
        }
        Commands::Summary { dir } => {
            let store = SessionStore::new(dir.unwrap_or(config.sessions_dir));
            run_summary(&store).await?;
        }
    }

    Ok(())
}
