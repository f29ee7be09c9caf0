//! # wavestream-server
//!
//! Wavestream streaming server on tokio + axum.
//!
//! This crate provides:
//! - Per-connection streaming sessions driven by a periodic timer
//! - The WebSocket handler for `/v1/subscribe_ws`
//! - Graceful shutdown of all sessions on SIGINT/SIGTERM
//! - Composition with the REST listing from `wavestream-web`

pub mod connection;
pub mod server;
pub mod session;
pub mod shutdown;

pub use server::{ServerConfig, ServerError, WavestreamServer};
pub use session::{CommandOutcome, SessionState, StreamingSession};
pub use shutdown::{termination_signal, SessionGuard, ShutdownController, SHUTDOWN_REASON};
pub use wavestream_core::DeviceRegistry;
