// src/utils/shutdown.rs

//! Graceful shutdown plumbing.
//!
//! A [`Shutdown`] handle is polled by the poll loop between cycles and while
//! a fetch is in flight. It fires once the paired [`ShutdownTrigger`] is
//! triggered, or dropped.

use tokio::signal;
use tokio::sync::watch;

/// Sending half; triggering is idempotent.
#[derive(Debug)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

impl ShutdownTrigger {
    pub fn trigger(&self) {
        let _ = self.tx.send(true);
    }
}

/// Receiving half, cheap to clone.
#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    /// Create a connected trigger/handle pair.
    pub fn channel() -> (ShutdownTrigger, Shutdown) {
        let (tx, rx) = watch::channel(false);
        (ShutdownTrigger { tx }, Shutdown { rx })
    }

    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once shutdown has been requested.
    pub async fn wait(&mut self) {
        // Err means the trigger was dropped, which also counts as shutdown.
        let _ = self.rx.wait_for(|stop| *stop).await;
    }
}

/// Trigger shutdown on Ctrl-C or SIGTERM.
pub fn listen_for_signals(trigger: ShutdownTrigger) {
    tokio::spawn(async move {
        shutdown_signal().await;
        log::info!("Shutdown signal received, finishing current cycle...");
        trigger.trigger();
    });
}

/// Wait for `CTRL+C` or, on UNIX, `SIGTERM`.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            log::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                log::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
