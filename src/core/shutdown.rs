//! Shutdown Coordination
//!
//! A broadcast channel carries the shutdown request to the consumer loop, the
//! in-flight store writes and the stats ticker. The first SIGINT/SIGTERM asks
//! for a graceful stop; a second one exits immediately.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Coordinates graceful shutdown across the application
pub struct ShutdownCoordinator {
    pub shutdown_tx: broadcast::Sender<()>,
    pub shutdown_requested: Arc<AtomicBool>,
}

impl ShutdownCoordinator {
    /// Create a coordinator and its first receiver
    pub fn new() -> (Self, broadcast::Receiver<()>) {
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
        self.shutdown_requested.store(true, Ordering::Release);
        let _ = self.shutdown_tx.send(());
    }

    /// Check if shutdown has been requested
    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown_requested.load(Ordering::Acquire)
    }

    /// Install signal handlers and run `future_fn` with the coordinator
    ///
    /// The closure subscribes for whatever receivers it needs and can trigger
    /// shutdown itself, e.g. once its input is exhausted.
    pub async fn guard_with_coordinator<F, Fut, R, E>(future_fn: F) -> Result<R, E>
    where
        F: FnOnce(Self) -> Fut,
        Fut: std::future::Future<Output = Result<R, E>>,
    {
        let (coordinator, _) = Self::new();

        setup_signal_handlers(
            coordinator.shutdown_tx.clone(),
            coordinator.shutdown_requested.clone(),
        );

        future_fn(coordinator).await
    }
}

/// Wait until a shutdown notification arrives
///
/// A closed channel (every sender dropped) is not a shutdown request; in that
/// case this never completes, so it can sit in a `select!` next to real work.
pub async fn wait_for_shutdown(shutdown: &mut broadcast::Receiver<()>) {
    loop {
        match shutdown.recv().await {
            Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => return,
            Err(broadcast::error::RecvError::Closed) => std::future::pending::<()>().await,
        }
    }
}

/// Install SIGINT/SIGTERM/SIGHUP/SIGQUIT handlers
///
/// The first signal of any kind requests shutdown; a second one exits with
/// status 130 without waiting for in-flight writes.
fn setup_signal_handlers(shutdown_tx: broadcast::Sender<()>, shutdown_requested: Arc<AtomicBool>) {
    #[cfg(unix)]
    {
        // Exit quietly when stdout/stderr is a closed pipe
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }

        use std::sync::atomic::AtomicUsize;
        use tokio::signal::unix::{signal, SignalKind};
        let signal_count = Arc::new(AtomicUsize::new(0));
        let signals = [
            ("SIGINT", SignalKind::interrupt()),
            ("SIGTERM", SignalKind::terminate()),
            ("SIGHUP", SignalKind::hangup()),
            ("SIGQUIT", SignalKind::quit()),
        ];

        for (name, kind) in signals {
            let tx = shutdown_tx.clone();
            let requested = shutdown_requested.clone();
            let count = signal_count.clone();

            let mut stream = match signal(kind) {
                Ok(stream) => stream,
                Err(e) => {
                    log::warn!("Cannot listen for {}: {}", name, e);
                    continue;
                }
            };

            tokio::spawn(async move {
                while stream.recv().await.is_some() {
                    if count.fetch_add(1, Ordering::AcqRel) == 0 {
                        log::info!("{} received, finishing in-flight messages", name);
                        requested.store(true, Ordering::Release);
                        let _ = tx.send(());
                    } else {
                        log::warn!("{} received again; exiting", name);
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
