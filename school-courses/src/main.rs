use clap::Parser;
use school_core::config::ServiceConfig;
use school_core::{http, logging, metrics, seed, storage};
use std::path::PathBuf;
use tracing::info;

mod catalog;
mod graphql;
mod server;

#[derive(Parser)]
#[command(name = "school-courses")]
#[command(about = "GraphQL API for SchoolInc courses and enrollments")]
#[command(version)]
struct Cli {
    /// Port to run the server on
    #[arg(short, long, default_value = "8081")]
    port: u16,

    /// Keep data in memory instead of the database file
    #[arg(long)]
    in_memory: bool,

    /// Create the default courses and enroll the demo student
    #[arg(long)]
    seed: bool,

    /// Optional TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address for the Prometheus exporter, e.g. 0.0.0.0:9102
    #[arg(long)]
    metrics_addr: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load environment variables
    dotenv::dotenv().ok();

    let config = ServiceConfig::load(cli.config.as_deref())?;
    let _guard = logging::init_logging("school_courses", &config.log_dir)?;
    metrics::init_metrics(cli.metrics_addr.as_deref())?;

    info!("Starting courses service on port {}...", cli.port);
    let storage = storage::open_storage(&config, cli.in_memory).await?;

    if cli.seed {
        seed::seed_courses(storage.as_ref(), catalog::today()).await?;
    }

    let app = server::create_server(storage, &config);
    http::serve(app, cli.port).await?;

    Ok(())
}
