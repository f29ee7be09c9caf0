//! Device listing route.
//!
//! # Endpoints
//!
//! ### `GET /v1/get_devices`
//! Returns every registered datastream with its display color, in registry
//! order. Signal types are not exposed.

use axum::{extract::State, response::Json, routing::get, Router};
use tracing::debug;
use wavestream_protocol::DeviceListing;

use crate::AppState;

/// Create device routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/get_devices", get(get_devices))
}

/// GET /v1/get_devices
async fn get_devices(State(state): State<AppState>) -> Json<DeviceListing> {
    debug!("Listing {} datastreams", state.registry.len());
    Json(DeviceListing::from_registry(&state.registry))
}
