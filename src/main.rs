use std::sync::Arc;
use teamhealth::{
    build_router,
    room::{start_cleanup_task, RoomService},
    AppState, EventBus, InMemoryRoomRepository, ServerConfig,
};
use tower_http::cors::CorsLayer;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "teamhealth=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env().inspect_err(|e| {
        error!(error = %e, "Invalid configuration");
    })?;

    info!(
        bind_addr = %config.bind_addr,
        subscriber_buffer = config.subscriber_buffer,
        "Starting team health check server"
    );

    // Composition root: one registry and one bus for the whole process
    let room_repository = Arc::new(InMemoryRoomRepository::new());
    let event_bus = EventBus::new(config.subscriber_buffer);
    let room_service = Arc::new(RoomService::new(room_repository, event_bus));

    tokio::spawn(start_cleanup_task(
        Arc::clone(&room_service),
        config.cleanup.clone(),
    ));

    let app_state = AppState::new(room_service, config.keep_alive);
    let app = build_router(app_state).layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!("Server running on http://{}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
