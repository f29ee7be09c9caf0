//! Process lifecycle and graceful shutdown.
//!
//! On a termination signal every live streaming session is told to close
//! with a "going away" frame. The server then waits for the sessions to
//! drain before the listener stops accepting connections.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, info};

/// Close reason sent to streaming clients on shutdown.
pub const SHUTDOWN_REASON: &str = "Server shutting down";

/// Coordinates shutdown across all streaming sessions.
///
/// Cloning is cheap; every clone controls the same set of sessions.
#[derive(Clone)]
pub struct ShutdownController {
    inner: Arc<Inner>,
}

struct Inner {
    shutting_down: watch::Sender<bool>,
    sessions: watch::Sender<usize>,
}

impl ShutdownController {
    pub fn new() -> Self {
        let (shutting_down, _) = watch::channel(false);
        let (sessions, _) = watch::channel(0);
        Self {
            inner: Arc::new(Inner {
                shutting_down,
                sessions,
            }),
        }
    }

    /// Register a live session. The session counts until the guard drops.
    pub fn register_session(&self) -> SessionGuard {
        self.inner.sessions.send_modify(|n| *n += 1);
        SessionGuard {
            controller: self.clone(),
            shutdown_rx: self.inner.shutting_down.subscribe(),
        }
    }

    /// Number of sessions currently registered.
    pub fn active_sessions(&self) -> usize {
        *self.inner.sessions.borrow()
    }

    pub fn is_shutting_down(&self) -> bool {
        *self.inner.shutting_down.borrow()
    }

    /// Tell every session, current and future, to close. Idempotent.
    pub fn trigger(&self) {
        self.inner.shutting_down.send_replace(true);
    }

    /// Wait until no session is registered.
    ///
    /// Returns `false` if sessions were still open when `timeout` elapsed.
    pub async fn drain(&self, timeout: Duration) -> bool {
        let mut rx = self.inner.sessions.subscribe();
        let drained = tokio::time::timeout(timeout, rx.wait_for(|n| *n == 0))
            .await
            .is_ok();
        drained
    }
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}

/// Registration of one live session.
pub struct SessionGuard {
    controller: ShutdownController,
    shutdown_rx: watch::Receiver<bool>,
}

impl SessionGuard {
    /// Resolve once shutdown has been triggered.
    ///
    /// Returns immediately for sessions registered after the trigger.
    pub async fn shutdown_requested(&mut self) {
        let _ = self.shutdown_rx.wait_for(|triggered| *triggered).await;
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.controller
            .inner
            .sessions
            .send_modify(|n| *n = n.saturating_sub(1));
    }
}

/// Resolve on SIGINT (Ctrl+C) or, on unix, SIGTERM.
pub async fn termination_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
