//! Wavestream server composition.
//!
//! A single listener serves both the REST listing (`/v1/get_devices`) and
//! the WebSocket streaming channel (`/v1/subscribe_ws`).

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::routing::get;
use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use wavestream_core::DeviceRegistry;
use wavestream_web::{cors_layer, create_router, WebError, WebState};

use crate::connection::{ws_handler, StreamState};
use crate::shutdown::ShutdownController;

/// Configuration for the Wavestream server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to.
    pub bind_addr: SocketAddr,
    /// The only origin allowed to make cross-origin requests.
    pub allowed_origin: String,
    /// How long shutdown waits for streaming sessions to close.
    pub drain_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            allowed_origin: "http://localhost:4200".to_string(),
            drain_timeout: Duration::from_secs(5),
        }
    }
}

/// Errors that stop the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Web(#[from] WebError),
}

/// The Wavestream HTTP + WebSocket server.
pub struct WavestreamServer {
    config: ServerConfig,
    registry: Arc<DeviceRegistry>,
    shutdown: ShutdownController,
}

impl WavestreamServer {
    /// Create a new server with the given configuration and device catalog.
    pub fn new(config: ServerConfig, registry: DeviceRegistry) -> Self {
        Self {
            config,
            registry: Arc::new(registry),
            shutdown: ShutdownController::new(),
        }
    }

    /// Get a handle on the shutdown controller.
    pub fn shutdown_controller(&self) -> ShutdownController {
        self.shutdown.clone()
    }

    /// Build the full router: listing, streaming, CORS and request tracing.
    pub fn router(&self) -> Result<Router, ServerError> {
        let web = create_router(Arc::new(WebState::new(self.registry.clone())));

        let stream = Router::new()
            .route("/v1/subscribe_ws", get(ws_handler))
            .with_state(StreamState {
                registry: self.registry.clone(),
                shutdown: self.shutdown.clone(),
            });

        Ok(web
            .merge(stream)
            .layer(cors_layer(&self.config.allowed_origin)?)
            .layer(TraceLayer::new_for_http()))
    }

    /// Bind the configured address and serve until `signal` resolves.
    pub async fn run<F>(self, signal: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.serve(listener, signal).await
    }

    /// Serve on an already bound listener until `signal` resolves.
    ///
    /// Shutdown order: streaming sessions are sent a close frame and
    /// drained (bounded by `drain_timeout`), then the listener stops
    /// accepting and in-flight HTTP requests finish.
    pub async fn serve<F>(self, listener: TcpListener, signal: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.router()?;
        let addr = listener.local_addr()?;
        info!("Wavestream server listening on {}", addr);

        let controller = self.shutdown.clone();
        let drain_timeout = self.config.drain_timeout;
        let graceful = async move {
            signal.await;
            info!(
                "Shutting down, closing {} streaming sessions",
                controller.active_sessions()
            );
            controller.trigger();
            if !controller.drain(drain_timeout).await {
                warn!(
                    "{} sessions still open after {:?}",
                    controller.active_sessions(),
                    drain_timeout
                );
            }
        };

        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(graceful)
        .await?;

        info!("Server stopped cleanly.");
        Ok(())
    }
}
