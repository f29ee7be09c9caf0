//! # wavestream-web
//!
//! REST API for the Wavestream server.
//!
//! This crate provides:
//! - `GET /v1/get_devices` - the device listing
//! - The CORS policy restricting browser access to one origin
//!
//! ## Usage
//!
//! ```rust,ignore
//! use wavestream_web::{cors_layer, create_router, WebState};
//!
//! let state = Arc::new(WebState::new(registry));
//! let app = create_router(state).layer(cors_layer("http://localhost:4200")?);
//!
//! let listener = TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, app).await?;
//! ```

pub mod routes;

// Re-exports
pub use routes::{cors_layer, create_router};

use std::sync::Arc;
use thiserror::Error;
use wavestream_core::DeviceRegistry;

/// Errors raised while assembling the web layer.
#[derive(Debug, Error)]
pub enum WebError {
    /// The configured CORS origin is not a valid header value.
    #[error("Invalid CORS origin: {0}")]
    InvalidOrigin(String),
}

/// Shared state for all route handlers.
pub struct WebState {
    pub registry: Arc<DeviceRegistry>,
}

impl WebState {
    pub fn new(registry: Arc<DeviceRegistry>) -> Self {
        Self { registry }
    }
}

/// Type alias for shared state in Axum handlers.
pub type AppState = Arc<WebState>;
