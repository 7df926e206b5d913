//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Resolve config → Wire cache → Bind listener → Register signals → Serve
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Close listener (once) → Serve loop returns → Exit 0
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → ShutdownSignal
//! ```
//!
//! # Design Decisions
//! - Ordered startup: the listener is bound before anything can close it
//! - The coordinator gets the listener's closer by value, never a shared slot
//! - No drain phase: closing the listener is the whole shutdown

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{ShutdownCoordinator, ShutdownState};
pub use signals::{OsSignals, ShutdownSignal, SignalSource};
pub use startup::{Bootstrap, StartupError};
