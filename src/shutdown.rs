//! Bounded graceful shutdown.
//!
//! The process is either `Running` or `ShuttingDown`. A termination signal
//! flips the phase (observers such as the gRPC server wake up through
//! [`GracefulShutdown::subscribe`]) and then every registered cleanup
//! operation runs concurrently under one overall timeout. A failing
//! operation is logged and does not affect its siblings.

use futures::future::{BoxFuture, join_all};
use std::{future::Future, time::Duration};
use tokio::sync::watch;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Running,
    ShuttingDown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// Every operation finished (successfully or not) before the deadline.
    Completed,
    /// The deadline passed first; the caller should force exit.
    TimedOut,
}

type Operation = BoxFuture<'static, anyhow::Result<()>>;

pub struct GracefulShutdown {
    timeout: Duration,
    phase: watch::Sender<Phase>,
    operations: Vec<(String, Operation)>,
}

impl GracefulShutdown {
    pub fn new(timeout: Duration) -> Self {
        let (phase, _) = watch::channel(Phase::Running);
        Self {
            timeout,
            phase,
            operations: Vec::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        *self.phase.borrow()
    }

    /// Register a cleanup operation; it is not polled until shutdown starts.
    pub fn register<F>(&mut self, name: impl Into<String>, operation: F)
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.operations.push((name.into(), Box::pin(operation)));
    }

    /// Future that resolves once the phase becomes `ShuttingDown`.
    pub fn subscribe(&self) -> impl Future<Output = ()> + Send + use<> {
        let mut rx = self.phase.subscribe();
        async move {
            // A dropped sender also means the process is going away.
            let _ = rx.wait_for(|phase| *phase == Phase::ShuttingDown).await;
        }
    }

    /// Wait for `signal`, then run all operations within the timeout.
    pub async fn run<S>(self, signal: S) -> ShutdownOutcome
    where
        S: Future<Output = ()>,
    {
        signal.await;
        self.phase.send_replace(Phase::ShuttingDown);
        info!(
            operations = self.operations.len(),
            timeout_ms = self.timeout.as_millis() as u64,
            "shutting down service"
        );

        let cleanups = self.operations.into_iter().map(|(name, operation)| async move {
            info!(operation = %name, "cleaning up");
            match operation.await {
                Ok(()) => info!(operation = %name, "shutdown gracefully"),
                Err(err) => error!(operation = %name, error = %err, "clean up failed"),
            }
        });

        match tokio::time::timeout(self.timeout, join_all(cleanups)).await {
            Ok(_) => ShutdownOutcome::Completed,
            Err(_) => {
                error!(
                    timeout_ms = self.timeout.as_millis() as u64,
                    "shutdown timeout elapsed, forcing exit"
                );
                ShutdownOutcome::TimedOut
            }
        }
    }
}

/// Resolves on SIGINT or SIGTERM (Ctrl+C elsewhere).
pub async fn termination_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match (
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
        ) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => info!("received SIGTERM"),
                    _ = sigint.recv() => info!("received SIGINT"),
                }
                return;
            }
            (Err(err), _) | (_, Err(err)) => {
                error!(error = %err, "failed to install signal handlers, falling back to ctrl_c");
            }
        }
    }

    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for ctrl_c");
        futures::future::pending::<()>().await;
    }
    info!("received Ctrl+C");
}
