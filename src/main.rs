mod agent;
mod config;
mod error;
mod routes;
mod state;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Before the subscriber, so RUST_LOG from .env takes effect
    let dotenv_loaded = dotenv::dotenv().is_ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("sql_chat_backend=debug,tower_http=debug")),
        )
        .init();

    if dotenv_loaded {
        info!("Loaded environment from .env");
    }

    let config_paths: Vec<String> = vec![
        std::env::var("CONFIG_PATH").ok(),
        Some("conf.yaml".to_string()),
        Some("conf.yml".to_string()),
        Some("conf.json".to_string()),
    ]
    .into_iter()
    .flatten()
    .collect();

    let mut config = None;
    for path in &config_paths {
        match Config::load(path) {
            Ok(cfg) => {
                info!("Loaded configuration from: {}", path);
                config = Some(cfg);
                break;
            }
            Err(e) => {
                tracing::debug!("Failed to load config from {}: {}", path, e);
            }
        }
    }

    let mut config = config.unwrap_or_else(|| {
        info!("No config file found (tried {:?}); using defaults", config_paths);
        Config::default()
    });
    config.apply_env_overrides();

    let listener = tokio::net::TcpListener::bind(config.server.bind_target()).await?;
    info!("Starting server on {}", listener.local_addr()?);

    let app_state = AppState::new(config)?;
    let app = routes::build_app(app_state);
    axum::serve(listener, app).await?;

    Ok(())
}
