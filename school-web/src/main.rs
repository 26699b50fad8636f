use clap::Parser;
use school_core::logging;
use std::net::SocketAddr;
use tracing::info;

mod error;
mod graphql;
mod handlers;
mod models;
mod router;
mod session;
mod state;
mod templates;

use state::{AppState, WebConfig};

#[derive(Parser)]
#[command(name = "school-web")]
#[command(about = "Web front end for SchoolInc")]
#[command(version)]
struct Cli {
    /// Port to run the web server on (overrides PORT)
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load environment variables
    dotenv::dotenv().ok();

    let mut config = WebConfig::from_env();
    if let Some(port) = cli.port {
        config.port = port;
    }

    let _guard = logging::init_logging("school_web", &config.log_dir)?;

    let app = router::app_router(AppState::new(config.endpoints.clone()), &config.static_dir);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    info!("Web server running on http://{}", addr);
    info!("Users service:   {}", config.endpoints.users);
    info!("Courses service: {}", config.endpoints.courses);
    info!("Grades service:  {}", config.endpoints.grades);

    axum::Server::try_bind(&addr)?
        .serve(app.into_make_service())
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    Ok(())
}
