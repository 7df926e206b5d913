//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! .env file (optional, never overrides the real environment)
//!     → loader.rs (clap: flag > environment variable > default)
//!     → ProxyConfig (immutable)
//!     → read by cache wiring, listener and metrics
//! ```
//!
//! # Design Decisions
//! - Config is immutable once resolved; changes require a restart
//! - Empty values disable optional features
//! - Only flag parsing can fail here; paths and addresses are checked by
//!   the subsystems that use them

pub mod loader;
pub mod schema;

pub use loader::{load_config, load_config_from, load_dotenv, log_dotenv, Cli, ConfigError};
pub use schema::ProxyConfig;
