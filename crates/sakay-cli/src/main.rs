mod ops;
mod ride;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "sakay")]
#[command(about = "Ride booking client for the sakay fleet")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Submit a ride request and follow it until the driver arrives.
    Ride(ride::RideArgs),
    /// Re-attach to an in-flight booking recovered from the last session.
    Resume,
    /// Print the current status of a booking.
    Status {
        #[arg(long)]
        id: i64,
    },
    /// Cancel a booking and clear the local recovery snapshot.
    Cancel {
        #[arg(long)]
        id: i64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = sakay_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Ride(args) => ride::run(&config, args).await,
        Commands::Resume => ride::resume(&config).await,
        Commands::Status { id } => ops::status(&config, id).await,
        Commands::Cancel { id } => ops::cancel(&config, id).await,
    }
}
