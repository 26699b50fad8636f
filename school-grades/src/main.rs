use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use school_core::config::ServiceConfig;
use school_core::{http, logging, metrics, seed, storage};
use std::path::PathBuf;
use tracing::info;

mod gradebook;
mod graphql;
mod server;

#[derive(Parser)]
#[command(name = "school-grades")]
#[command(about = "GraphQL API for SchoolInc grades")]
#[command(version)]
struct Cli {
    /// Port to run the server on
    #[arg(short, long, default_value = "8082")]
    port: u16,

    /// Keep data in memory instead of the database file
    #[arg(long)]
    in_memory: bool,

    /// Give the demo student a few random grades
    #[arg(long)]
    seed: bool,

    /// Optional TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address for the Prometheus exporter, e.g. 0.0.0.0:9103
    #[arg(long)]
    metrics_addr: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load environment variables
    dotenv::dotenv().ok();

    let config = ServiceConfig::load(cli.config.as_deref())?;
    let _guard = logging::init_logging("school_grades", &config.log_dir)?;
    metrics::init_metrics(cli.metrics_addr.as_deref())?;

    info!("Starting grades service on port {}...", cli.port);
    let storage = storage::open_storage(&config, cli.in_memory).await?;

    if cli.seed {
        let mut rng = StdRng::from_entropy();
        seed::seed_grades(storage.as_ref(), &mut rng).await?;
    }

    let app = server::create_server(storage, &config);
    http::serve(app, cli.port).await?;

    Ok(())
}
