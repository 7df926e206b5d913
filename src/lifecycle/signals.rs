//! OS signal handling.
//!
//! # Responsibilities
//! - Register handlers for SIGINT and SIGTERM (Ctrl-C on non-unix)
//! - Translate them into [`ShutdownSignal`] values
//!
//! Registration is synchronous so that it is finished before the server
//! starts accepting; anything received afterwards is buffered by Tokio until
//! the coordinator polls for it.

use std::future::Future;
use std::io;

use tokio::sync::mpsc;

/// A request from the operator to stop the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    /// SIGINT / Ctrl-C.
    Interrupt,
    /// SIGTERM.
    Terminate,
}

impl ShutdownSignal {
    /// Conventional signal name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ShutdownSignal::Interrupt => "SIGINT",
            ShutdownSignal::Terminate => "SIGTERM",
        }
    }
}

impl std::fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Anything the shutdown coordinator can wait on.
pub trait SignalSource: Send + 'static {
    /// Wait for the next signal. `None` means no signal will ever arrive.
    fn recv(&mut self) -> impl Future<Output = Option<ShutdownSignal>> + Send + '_;
}

/// Channel-backed source, used when signals come from inside the process.
impl SignalSource for mpsc::Receiver<ShutdownSignal> {
    fn recv(&mut self) -> impl Future<Output = Option<ShutdownSignal>> + Send + '_ {
        mpsc::Receiver::recv(self)
    }
}

/// Process termination signals.
#[cfg(unix)]
#[derive(Debug)]
pub struct OsSignals {
    interrupt: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl OsSignals {
    /// Install handlers for SIGINT and SIGTERM.
    ///
    /// Must be called from within the Tokio runtime.
    pub fn register() -> io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }
}

#[cfg(unix)]
impl SignalSource for OsSignals {
    fn recv(&mut self) -> impl Future<Output = Option<ShutdownSignal>> + Send + '_ {
        async move {
            tokio::select! {
                Some(()) = self.interrupt.recv() => Some(ShutdownSignal::Interrupt),
                Some(()) = self.terminate.recv() => Some(ShutdownSignal::Terminate),
                else => None,
            }
        }
    }
}

/// Process termination signals.
#[cfg(not(unix))]
#[derive(Debug)]
pub struct OsSignals {
    ctrl_c: tokio::signal::windows::CtrlC,
}

#[cfg(not(unix))]
impl OsSignals {
    /// Install the Ctrl-C handler.
    pub fn register() -> io::Result<Self> {
        Ok(Self {
            ctrl_c: tokio::signal::windows::ctrl_c()?,
        })
    }
}

#[cfg(not(unix))]
impl SignalSource for OsSignals {
    fn recv(&mut self) -> impl Future<Output = Option<ShutdownSignal>> + Send + '_ {
        async move { self.ctrl_c.recv().await.map(|()| ShutdownSignal::Interrupt) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_names() {
        assert_eq!(ShutdownSignal::Interrupt.to_string(), "SIGINT");
        assert_eq!(ShutdownSignal::Terminate.as_str(), "SIGTERM");
    }

    #[tokio::test]
    async fn channel_source_yields_in_order() {
        let (tx, mut rx) = mpsc::channel(2);
        tx.send(ShutdownSignal::Terminate).await.unwrap();
        drop(tx);

        assert_eq!(SignalSource::recv(&mut rx).await, Some(ShutdownSignal::Terminate));
        assert_eq!(SignalSource::recv(&mut rx).await, None);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn os_signals_register() {
        OsSignals::register().unwrap();
    }
}
