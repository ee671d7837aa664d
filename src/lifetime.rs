//! Host application lifecycle signals.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// The host application's view as seen by a hosted consumer.
///
/// `stopping` is a one-way latch shared by every subsystem of the host.
/// `request_shutdown` asks the host to begin stopping; calling it more than
/// once has no further effect.
pub trait Lifecycle: Send + Sync + 'static {
    /// Token cancelled when the host begins shutting down.
    fn stopping(&self) -> CancellationToken;

    /// Ask the host to shut down, typically after a fatal error.
    fn request_shutdown(&self);
}

/// Default [`Lifecycle`] backed by a single cancellation token.
///
/// Requesting shutdown cancels the same token every subsystem observes, so a
/// fatal error in one consumer drains all of them.
#[derive(Debug, Clone, Default)]
pub struct ApplicationLifetime {
    stopping: CancellationToken,
}

impl ApplicationLifetime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_stopping(&self) -> bool {
        self.stopping.is_cancelled()
    }

    /// Begin shutting down the application.
    pub fn stop_application(&self) {
        if !self.stopping.is_cancelled() {
            info!("Application is shutting down");
        }
        self.stopping.cancel();
    }

    /// Resolves once shutdown has begun.
    pub async fn stopped(&self) {
        self.stopping.cancelled().await
    }

    /// Stop the application when the process receives Ctrl+C.
    pub fn stop_on_ctrl_c(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let lifetime = Arc::clone(self);
        tokio::spawn(async move {
            tokio::select! {
                result = tokio::signal::ctrl_c() => {
                    match result {
                        Ok(()) => info!("Received Ctrl+C, stopping application"),
                        Err(e) => warn!("Failed to listen for Ctrl+C: {e}"),
                    }
                    lifetime.stop_application();
                }
                _ = lifetime.stopped() => {}
            }
        })
    }
}

impl Lifecycle for ApplicationLifetime {
    fn stopping(&self) -> CancellationToken {
        self.stopping.clone()
    }

    fn request_shutdown(&self) {
        self.stop_application();
    }
}
