//! Module proxy server.
//!
//! # Architecture Overview
//!
//! ```text
//!   flags / env / .env ──▶ config ──▶ cache wiring ──▶ net::Listener (bind)
//!                                                          │
//!                              ┌───────────────────────────┴──────────────┐
//!                              ▼                                          ▼
//!                    http::HttpServer::run                  lifecycle::ShutdownCoordinator
//!                    (accept loop, proxy handler)           (SIGINT/SIGTERM → close once)
//!                              │                                          │
//!                              └──────── listener closed ◀────────────────┘
//!                                              │
//!                                              ▼
//!                                        exit 0 / exit 1
//! ```

use std::process::ExitCode;

use module_proxy::config::{load_config, load_dotenv, log_dotenv};
use module_proxy::lifecycle::{Bootstrap, OsSignals, StartupError};
use module_proxy::observability::logging::init_logging;

#[tokio::main]
async fn main() -> ExitCode {
    // `.env` may set RUST_LOG, so it is read before the subscriber exists.
    let dotenv = load_dotenv();
    init_logging();
    log_dotenv(dotenv);

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(StartupError::Config(e)) if e.is_informational() => e.exit(),
        Err(e) => {
            tracing::error!(error = %e, "Fatal error");
            // Printed regardless of the log filter.
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), StartupError> {
    let config = load_config()?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        listen_address = %config.listen_address,
        cache_dir = ?config.cache_dir,
        cache_max_bytes = config.cache_max_bytes,
        "module-proxy starting"
    );

    let bootstrap = Bootstrap::prepare(&config).await?;
    let signals = OsSignals::register().map_err(StartupError::Signals)?;
    bootstrap.serve(signals).await
}
