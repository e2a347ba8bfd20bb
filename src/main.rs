use deepstake_server::{config, create_app, ws};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load config
    let config = config::Config::from_env();
    tracing::info!("Starting deepstake server on {}", config.server_addr());
    tracing::info!("Target hand policy: {:?}", config.target_policy);

    // Create the room store; rooms and their timers live here
    let store = Arc::new(ws::RoomStore::new(config.target_policy));

    // Build router using lib function
    let app = create_app(store);

    let listener = tokio::net::TcpListener::bind(config.server_addr()).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
