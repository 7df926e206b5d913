//! Startup orchestration.
//!
//! # Order
//! 1. Wire the disk cache (a bad cache directory never leaves a bound socket)
//! 2. Bind the listener and report its address
//! 3. Start the optional metrics endpoint
//! 4. Hand the listener's closer to the shutdown coordinator
//! 5. Run the serve loop until the listener is closed
//!
//! Any failure is fatal and returned to `main`; nothing is retried.

use std::net::SocketAddr;

use thiserror::Error;

use crate::cache::{wire_cache, CacheConfigError};
use crate::config::{ConfigError, ProxyConfig};
use crate::http::{HttpServer, ServeError};
use crate::lifecycle::shutdown::ShutdownCoordinator;
use crate::lifecycle::signals::SignalSource;
use crate::net::{listener::normalize_address, Listener, ListenerError};
use crate::observability::metrics;
use crate::proxy::ModuleProxy;

/// Every way the process can fail.
#[derive(Debug, Error)]
pub enum StartupError {
    /// Flags or environment could not be parsed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The configured cache directory is unusable.
    #[error(transparent)]
    Cache(#[from] CacheConfigError),

    /// The listen address could not be bound.
    #[error(transparent)]
    Bind(#[from] ListenerError),

    /// Termination signal handlers could not be installed.
    #[error("failed to register signal handlers: {0}")]
    Signals(#[source] std::io::Error),

    /// The metrics endpoint could not be started.
    #[error("failed to start metrics endpoint on {address:?}: {reason}")]
    Metrics {
        /// Configured address.
        address: String,
        /// What went wrong.
        reason: String,
    },

    /// Serving stopped unexpectedly.
    #[error(transparent)]
    Serve(#[from] ServeError),
}

/// A bound server that has not started serving yet.
#[derive(Debug)]
pub struct Bootstrap {
    listener: Listener,
    proxy: ModuleProxy,
}

impl Bootstrap {
    /// Wire the cache and bind the listener for `config`.
    pub async fn prepare(config: &ProxyConfig) -> Result<Self, StartupError> {
        let mut proxy = ModuleProxy::new();
        if let Some(cache) = wire_cache(config).await? {
            proxy = proxy.with_cache(cache);
        }

        let listener = Listener::bind(&config.listen_address).await?;

        if let Some(address) = config.metrics_address.as_deref() {
            start_metrics(address).await?;
        }

        Ok(Self { listener, proxy })
    }

    /// Address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.listener.local_addr()
    }

    /// The handler that will serve requests.
    pub fn proxy(&self) -> &ModuleProxy {
        &self.proxy
    }

    /// Serve until the first signal from `signals` closes the listener.
    ///
    /// The coordinator is started only now, with the bound listener's closer,
    /// so there is no window in which it could act on an unbound listener.
    pub async fn serve<S: SignalSource>(self, signals: S) -> Result<(), StartupError> {
        let coordinator = ShutdownCoordinator::new(self.listener.closer(), signals).spawn();

        let result = HttpServer::new(self.proxy).run(self.listener).await;

        // No more signals are handled once serving has ended.
        coordinator.abort();
        result?;

        tracing::info!("Shutdown complete");
        Ok(())
    }
}

async fn start_metrics(address: &str) -> Result<(), StartupError> {
    let metrics_error = |reason: String| StartupError::Metrics {
        address: address.to_string(),
        reason,
    };

    let addr = tokio::net::lookup_host(&*normalize_address(address))
        .await
        .map_err(|e| metrics_error(e.to_string()))?
        .next()
        .ok_or_else(|| metrics_error("address did not resolve".to_string()))?;

    metrics::init_metrics(addr).map_err(|e| metrics_error(e.to_string()))
}
