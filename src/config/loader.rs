//! Configuration resolution from flags, environment and defaults.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::Parser;
use thiserror::Error;

use crate::config::schema::{ProxyConfig, DEFAULT_LISTEN_ADDRESS};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The command line or an environment override could not be parsed.
    #[error("{0}")]
    Parse(#[from] clap::Error),
}

impl ConfigError {
    /// True for `--help` and `--version`, which are not failures.
    pub fn is_informational(&self) -> bool {
        match self {
            ConfigError::Parse(e) => !e.use_stderr(),
        }
    }

    /// Print the clap message and exit with clap's own status code.
    pub fn exit(&self) -> ! {
        match self {
            ConfigError::Parse(e) => e.exit(),
        }
    }
}

/// Command line of the server. Each flag falls back to its environment
/// variable, then to the compiled-in default.
#[derive(Debug, Parser)]
#[command(name = "module-proxy", about = "Proxy server for Go modules", version)]
pub struct Cli {
    /// Listen address (`host:port` or `:port`).
    #[arg(long, env = "LISTEN", default_value = DEFAULT_LISTEN_ADDRESS)]
    pub listen: String,

    /// Existing directory to use as a persistent disk cache.
    #[arg(long, env = "CACHE_DIR", default_value = "")]
    pub cache_dir: String,

    /// Max number of megabytes to cache.
    #[arg(long, env = "CACHE_MAX_MEGABYTES", default_value_t = 0, value_parser = parse_megabytes)]
    pub cache_max_megabytes: u64,

    /// Address for the Prometheus metrics endpoint (disabled when empty).
    #[arg(long, env = "METRICS_LISTEN", default_value = "")]
    pub metrics_listen: String,
}

/// An empty value counts as unset, i.e. zero.
fn parse_megabytes(value: &str) -> Result<u64, String> {
    if value.is_empty() {
        return Ok(0);
    }
    value
        .parse()
        .map_err(|e| format!("expected a non-negative integer: {e}"))
}

impl From<Cli> for ProxyConfig {
    fn from(cli: Cli) -> Self {
        ProxyConfig::new(
            cli.listen,
            &cli.cache_dir,
            cli.cache_max_megabytes,
            &cli.metrics_listen,
        )
    }
}

/// Load a `.env` file from the working directory, if there is one.
///
/// Variables already present in the environment are left untouched.
/// Returns the file that was loaded, `None` when there is no `.env`.
pub fn load_dotenv() -> Result<Option<PathBuf>, dotenvy::Error> {
    match dotenvy::dotenv() {
        Ok(path) => Ok(Some(path)),
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

/// Report the outcome of [`load_dotenv`] once logging is up.
pub fn log_dotenv(outcome: Result<Option<PathBuf>, dotenvy::Error>) {
    match outcome {
        Ok(Some(path)) => tracing::debug!(path = %path.display(), "Loaded environment file"),
        Ok(None) => {}
        Err(e) => tracing::warn!(error = %e, "Ignoring unreadable environment file"),
    }
}

/// Resolve the configuration from the process arguments and environment.
pub fn load_config() -> Result<ProxyConfig, ConfigError> {
    load_config_from(std::env::args_os())
}

/// Resolve the configuration from explicit arguments (first item is the
/// program name) and the process environment.
pub fn load_config_from<I, T>(args: I) -> Result<ProxyConfig, ConfigError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::try_parse_from(args)?;
    Ok(cli.into())
}
