//! Shutdown coordination
//!
//! Broadcast-based shutdown signalling shared by the supervisor, the scanner
//! loop, the workers, and the status publisher. The first signal starts a
//! graceful stop; a second signal exits the process immediately.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Coordinates graceful shutdown across the supervisor's tasks
pub struct ShutdownCoordinator {
    pub shutdown_tx: broadcast::Sender<()>,
    pub shutdown_requested: Arc<AtomicBool>,
}

impl ShutdownCoordinator {
    pub fn new() -> (Self, broadcast::Receiver<()>) {
        // Large enough that a burst of signals never drops a send
        let (shutdown_tx, shutdown_rx) = broadcast::channel(8);
        let shutdown_requested = Arc::new(AtomicBool::new(false));

        let coordinator = Self {
            shutdown_tx,
            shutdown_requested,
        };

        (coordinator, shutdown_rx)
    }

    /// Subscribe to shutdown notifications
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Trigger shutdown
    pub fn trigger_shutdown(&self) {
        // Release pairs with the Acquire in is_shutdown_requested so observers
        // see everything written before the trigger
        self.shutdown_requested.store(true, Ordering::Release);
        let _ = self.shutdown_tx.send(());
    }

    /// Check if shutdown has been requested
    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown_requested.load(Ordering::Acquire)
    }
}

/// Install process signal handlers that feed the coordinator
///
/// The first interrupt/terminate starts a graceful stop; the second one exits
/// with status 130 without waiting for in-flight loads.
pub fn setup_signal_handlers(
    shutdown_tx: broadcast::Sender<()>,
    shutdown_requested: Arc<AtomicBool>,
) {
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }

        use std::sync::atomic::AtomicUsize;
        use tokio::signal::unix::{signal, SignalKind};
        let signal_count = Arc::new(AtomicUsize::new(0));
        let signals = [
            SignalKind::interrupt(),
            SignalKind::terminate(),
            SignalKind::hangup(),
            SignalKind::quit(),
        ];

        for kind in signals {
            let tx = shutdown_tx.clone();
            let requested = shutdown_requested.clone();
            let sig_ctr = signal_count.clone();

            tokio::spawn(async move {
                if let Ok(mut sig) = signal(kind) {
                    while sig.recv().await.is_some() {
                        let prev = sig_ctr.fetch_add(1, Ordering::AcqRel);
                        requested.store(true, Ordering::Release);
                        let _ = tx.send(());
                        if prev >= 1 {
                            log::warn!("Second shutdown signal received; exiting immediately");
                            std::process::exit(130);
                        }
                    }
                }
            });
        }

        // Generic ctrl_c fallback for terminals where the specific UNIX
        // signals are not delivered as expected
        {
            let tx = shutdown_tx;
            let requested = shutdown_requested;
            let sig_ctr = signal_count;
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    let prev = sig_ctr.fetch_add(1, Ordering::AcqRel);
                    requested.store(true, Ordering::Release);
                    let _ = tx.send(());
                    if prev >= 1 {
                        log::warn!("Ctrl-C received twice; exiting immediately");
                        std::process::exit(130);
                    }
                }
            });
        }
    }

    #[cfg(not(unix))]
    {
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                shutdown_requested.store(true, Ordering::Release);
                let _ = shutdown_tx.send(());
            }
        });
    }
}
