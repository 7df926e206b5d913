//! Module proxy server library.
//!
//! Bootstrap and lifecycle for a Go module proxy: configuration resolution,
//! disk cache wiring, listener management, signal-driven shutdown and the
//! serve loop around the module proxy handler.

pub mod cache;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod proxy;
pub mod resilience;

pub use cache::CacheHandle;
pub use config::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::{Bootstrap, ShutdownCoordinator, StartupError};
pub use proxy::ModuleProxy;
