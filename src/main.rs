use events::EventPublisher;
use log::*;
use realtime::{LiveDomainEventHandler, Manager};
use service::{config::Config, logging::Logger};
use session::spawn_sweeper;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() {
    let config = Config::new();
    Logger::init_logger(&config as &Config);

    info!(
        "Starting forum_rs in {} mode (version {})",
        config.runtime_env(),
        env!("CARGO_PKG_VERSION")
    );

    let db = match service::init_database(&config).await {
        Ok(db) => Arc::new(db),
        Err(e) => {
            error!("Failed to establish database connection: {e}");
            std::process::exit(1);
        }
    };

    let sessions = Arc::new(service::init_session_store(&config));
    let shutdown = CancellationToken::new();
    let sweeper = spawn_sweeper(
        Arc::clone(&sessions),
        config.session_sweep_interval(),
        shutdown.clone(),
    );

    let live = Arc::new(Manager::new().with_sender_echo(config.ws_echo_messages_to_sender));

    // Domain events are pushed to the live channels
    let event_publisher = Arc::new(
        EventPublisher::new().with_handler(Arc::new(LiveDomainEventHandler::new(Arc::clone(&live)))),
    );

    let app_state = web::AppState::new(
        service::AppState::new(config, &db, &sessions),
        &live,
        &event_publisher,
    );

    let on_ctrl_c = shutdown.clone();
    let server = web::init_server(app_state, async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {e}");
        }
        info!("Shutdown signal received");
        on_ctrl_c.cancel();
    });

    if let Err(e) = server.await {
        error!("Server failed: {e}");
        shutdown.cancel();
        std::process::exit(1);
    }

    shutdown.cancel();
    if let Err(e) = sweeper.await {
        warn!("Session sweeper did not stop cleanly: {e}");
    }
    info!("Server stopped");
}
