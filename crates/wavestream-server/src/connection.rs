//! WebSocket connection handling for `/v1/subscribe_ws`.
//!
//! Each connection runs one task that owns its [`StreamingSession`]. The
//! task multiplexes three event sources:
//! - Client frames (subscription commands)
//! - Ticks of the session timer
//! - The process-wide shutdown notification

use std::borrow::Cow;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::ws::{close_code, CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, State};
use axum::response::IntoResponse;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use tracing::{debug, error, info, warn};

use wavestream_core::DeviceRegistry;

use crate::session::{CommandOutcome, StreamingSession};
use crate::shutdown::{ShutdownController, SHUTDOWN_REASON};

/// State shared by all streaming connections.
#[derive(Clone)]
pub struct StreamState {
    pub registry: Arc<DeviceRegistry>,
    pub shutdown: ShutdownController,
}

/// Upgrade handler for the streaming route.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(state): State<StreamState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_connection(socket, addr, state))
}

/// Handle a single WebSocket connection until it closes.
async fn handle_connection(socket: WebSocket, addr: SocketAddr, state: StreamState) {
    let mut guard = state.shutdown.register_session();
    info!(
        "Client {} connected ({} active)",
        addr,
        state.shutdown.active_sessions()
    );

    let (mut ws_tx, mut ws_rx) = socket.split();
    let mut session = StreamingSession::new(state.registry.clone());

    loop {
        tokio::select! {
            // Handle incoming frames from client
            msg = ws_rx.next() => {
                let text = match msg {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(Message::Binary(data))) => String::from_utf8_lossy(&data).into_owned(),
                    Some(Ok(Message::Close(frame))) => {
                        info!("Client {} closed connection", addr);
                        // Complete the closing handshake
                        let _ = ws_tx.send(Message::Close(frame)).await;
                        break;
                    }
                    Some(Ok(_)) => continue, // Ping/pong are answered by the transport
                    Some(Err(e)) => {
                        warn!("WebSocket error from {}: {}", addr, e);
                        break;
                    }
                    None => {
                        info!("Client {} disconnected", addr);
                        break;
                    }
                };
                if let Err(e) = handle_client_message(&text, &mut session, &mut ws_tx, addr).await {
                    error!("Failed to reply to {}: {}", addr, e);
                    break;
                }
            }

            // Emit one sample row per timer tick
            _ = session.next_tick() => {
                match session.sample() {
                    Ok(Some(payload)) => {
                        if let Err(e) = ws_tx.send(Message::Text(payload)).await {
                            error!("Failed to send sample to {}: {}", addr, e);
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => warn!("Failed to encode sample for {}: {}", addr, e),
                }
            }

            // Close with "going away" when the server shuts down
            _ = guard.shutdown_requested() => {
                debug!("Closing {} for shutdown", addr);
                let frame = CloseFrame {
                    code: close_code::AWAY,
                    reason: Cow::Borrowed(SHUTDOWN_REASON),
                };
                if let Err(e) = ws_tx.send(Message::Close(Some(frame))).await {
                    warn!("Failed to send close frame to {}: {}", addr, e);
                }
                break;
            }
        }
    }

    session.close();
    drop(guard);
    debug!(
        "Session for {} ended ({} active)",
        addr,
        state.shutdown.active_sessions()
    );
}

/// Apply one client command and send the error frame if it was rejected.
async fn handle_client_message(
    text: &str,
    session: &mut StreamingSession,
    ws_tx: &mut SplitSink<WebSocket, Message>,
    addr: SocketAddr,
) -> Result<(), axum::Error> {
    match session.handle_command(text) {
        Ok(CommandOutcome::Ignored) => {
            debug!("Ignoring blank command from {}", addr);
        }
        Ok(CommandOutcome::Rejected(error)) => {
            warn!("Client {} sent no valid identifiers: {:?}", addr, text.trim());
            ws_tx.send(Message::Text(error)).await?;
        }
        Ok(CommandOutcome::Subscribed {
            datastreams,
            sample_rate,
            output_format,
        }) => {
            info!(
                "Client {} subscribed to {:?} at {} Hz ({})",
                addr, datastreams, sample_rate, output_format
            );
        }
        Err(e) => {
            warn!("Failed to encode reply for {}: {}", addr, e);
        }
    }
    Ok(())
}
