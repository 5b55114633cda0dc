use gitscope::api::{self, AppState};
use gitscope::{build_session, logging, Config};
use std::net::SocketAddr;
use std::path::Path;
use tracing::info;

const DEFAULT_ADDR: &str = "127.0.0.1:8000";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match std::env::var("GITSCOPE_CONFIG") {
        Ok(path) => Config::from_file(Path::new(&path))?,
        Err(_) => Config::load()?,
    }
    .with_env_overrides();

    logging::init_tracing(config.log_level())?;

    let addr: SocketAddr = std::env::var("GITSCOPE_ADDR")
        .unwrap_or_else(|_| DEFAULT_ADDR.to_string())
        .parse()?;

    let session = build_session(&config)?;
    let app = api::router(AppState::new(session));

    info!("gitscope chat server starting");
    info!("GitHub API: {}", config.github.api_base_url);
    info!("Health check: http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
