//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! bind (listener.rs, resolved address logged)
//!     → accept loop in http::server
//!     → connection.rs (id + in-flight count)
//!     → hand off to the HTTP layer
//!
//! Shutdown:
//!     ListenerCloser::close → pending accept returns Closed → socket dropped
//! ```
//!
//! # Design Decisions
//! - The listener is fully bound before anything can close it
//! - Closing is abrupt: open connections are not drained

pub mod connection;
pub mod listener;

pub use connection::{ConnectionGuard, ConnectionId, ConnectionTracker};
pub use listener::{Listener, ListenerCloser, ListenerError};
