//! HTTP route handlers for the Wavestream server.

pub mod devices;

use crate::{AppState, WebError};
use axum::http::{HeaderValue, Method};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Create the REST router.
///
/// Routes are organized as:
/// - `/v1/get_devices` - device listing
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/v1", v1_routes())
        .with_state(state)
}

/// Create v1 API routes.
fn v1_routes() -> Router<AppState> {
    Router::new().merge(devices::routes())
}

/// CORS policy allowing cross-origin reads from a single origin.
///
/// The allow-origin header is only sent back when the request's `Origin`
/// matches.
pub fn cors_layer(origin: &str) -> Result<CorsLayer, WebError> {
    let origin = HeaderValue::from_str(origin)
        .map_err(|_| WebError::InvalidOrigin(origin.to_string()))?;
    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list([origin]))
        .allow_methods([Method::GET]))
}
