//! HTTP and websocket surface of the forum.
//!
//! Controllers validate the session, hand the request to `domain`, and map
//! domain errors onto status codes. The `/ws` endpoint upgrades to a live
//! channel managed by `realtime`.

use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use events::EventPublisher;
use log::*;
use realtime::Manager;
use sea_orm::DatabaseConnection;
use service::config::Config;
use session::SessionStore;
use std::future::Future;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

mod controller;
mod error;
mod extractors;
mod middleware;
mod params;
mod protect;
pub mod router;
mod ws;

pub use error::{Error, Result};

/// Everything a request handler can reach: infrastructure from `service`,
/// the live channel broadcaster and the domain event publisher.
#[derive(Clone)]
pub struct AppState {
    pub service_state: service::AppState,
    pub live: Arc<Manager>,
    pub event_publisher: Arc<EventPublisher>,
}

impl AppState {
    pub fn new(
        service_state: service::AppState,
        live: &Arc<Manager>,
        event_publisher: &Arc<EventPublisher>,
    ) -> Self {
        Self {
            service_state,
            live: Arc::clone(live),
            event_publisher: Arc::clone(event_publisher),
        }
    }

    pub fn db_conn_ref(&self) -> &DatabaseConnection {
        self.service_state.db_conn_ref()
    }

    pub fn sessions(&self) -> &SessionStore {
        self.service_state.sessions()
    }

    pub fn config(&self) -> &Config {
        &self.service_state.config
    }
}

/// Binds the configured interface and port and serves until `shutdown`
/// resolves.
pub async fn init_server(
    app_state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let config = app_state.config().clone();
    let host = config
        .interface
        .clone()
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let server_url = format!("{host}:{}", config.port);

    let listener = tokio::net::TcpListener::bind(&server_url).await?;

    info!("Server starting... listening for connections on http://{server_url}");

    let app = router::define_routes(app_state).layer(cors_layer(&config));

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}

fn cors_layer(config: &Config) -> CorsLayer {
    let allowed_origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {origin}");
                None
            }
        })
        .collect();

    info!("CORS allowed origins: {allowed_origins:?}");

    CorsLayer::new()
        .allow_methods([Method::DELETE, Method::GET, Method::POST, Method::PUT])
        .allow_credentials(true)
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE])
        .allow_origin(allowed_origins)
}
