//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! Listener (net)
//!     → server.rs (accept loop, hyper connection per task)
//!     → request.rs (request ID assigned and echoed)
//!     → proxy handler (module artifacts)
//!     → Send to client
//! ```

pub mod request;
pub mod server;

pub use request::{UuidRequestId, X_REQUEST_ID};
pub use server::{HttpServer, ServeError};
