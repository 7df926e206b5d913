//! Shutdown coordination for the proxy.
//!
//! The coordinator owns the signal source and a closer for the bound
//! listener. It waits for the first termination signal, closes the listener
//! once, and then stops listening for signals altogether.

use tokio::task::JoinHandle;

use crate::lifecycle::signals::{ShutdownSignal, SignalSource};
use crate::net::ListenerCloser;
use crate::observability::metrics;

/// Coordinator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownState {
    /// Waiting for a signal.
    Armed,
    /// A signal was observed and the listener closed. Terminal.
    Triggered(ShutdownSignal),
}

/// Closes the listener on the first termination signal.
#[derive(Debug)]
pub struct ShutdownCoordinator<S> {
    closer: ListenerCloser,
    signals: S,
    state: ShutdownState,
}

impl<S: SignalSource> ShutdownCoordinator<S> {
    /// Create an armed coordinator for an already bound listener.
    pub fn new(closer: ListenerCloser, signals: S) -> Self {
        Self {
            closer,
            signals,
            state: ShutdownState::Armed,
        }
    }

    /// Current state.
    pub fn state(&self) -> ShutdownState {
        self.state
    }

    /// Wait for the first signal and close the listener.
    ///
    /// Returns the final state: `Triggered` after a signal, or `Armed` if the
    /// source ended without ever delivering one. The signal source is
    /// dropped on return, so later signals are never acted on.
    pub async fn run(mut self) -> ShutdownState {
        if let Some(signal) = self.signals.recv().await {
            self.trigger(signal);
        }
        self.state
    }

    /// Run on its own task.
    pub fn spawn(self) -> JoinHandle<ShutdownState> {
        tokio::spawn(self.run())
    }

    fn trigger(&mut self, signal: ShutdownSignal) {
        if self.state != ShutdownState::Armed {
            return;
        }
        self.state = ShutdownState::Triggered(signal);
        metrics::record_shutdown_signal(signal.as_str());

        tracing::info!(signal = %signal, "Signal received");
        tracing::info!("Shutting down");

        if let Err(e) = self.closer.close() {
            tracing::warn!(error = %e, "error closing listener");
        }
    }
}
