use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use masterplan::config::{AppConfig, BackendMode, HostedConfig};
use masterplan::db;
use masterplan::hosted::{HostedClient, HostedHttpClient, InMemoryHosted};
use masterplan::routes::router;
use masterplan::session::SessionService;
use masterplan::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "masterplan=debug".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::new_from_env()?;
    let pool = db::connect(&config.database_url).await?;

    let hosted: Arc<dyn HostedClient> = match config.backend {
        BackendMode::Hosted => Arc::new(HostedHttpClient::new(HostedConfig::new_from_env()?)?),
        BackendMode::Memory => {
            info!("using in-memory backend, data is lost on exit");
            Arc::new(InMemoryHosted::new())
        }
    };

    let session = Arc::new(SessionService::new(hosted.clone(), pool, &config));
    {
        let session = session.clone();
        tokio::spawn(async move {
            if let Err(e) = session.init().await {
                error!("session check failed: {}", e);
            }
        });
    }

    let app = router(AppState::new(hosted, session.clone()));

    info!("listening on http://{}", config.addr);
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("failed to listen for shutdown signal: {}", e);
            }
        })
        .await?;

    session.shutdown().await;
    info!("shut down");

    Ok(())
}
