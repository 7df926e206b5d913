//! Disk cache wiring.
//!
//! # Responsibilities
//! - Validate the configured cache directory before anything is bound
//! - Produce a bounded [`CacheHandle`] for the module proxy handler
//!
//! # Design Decisions
//! - A requested but unusable cache aborts startup; it is never silently
//!   disabled
//! - The handle is read-only here; eviction and the storage layout belong
//!   to whoever populates the directory

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::ProxyConfig;

/// Errors raised while wiring the disk cache.
#[derive(Debug, Error)]
pub enum CacheConfigError {
    /// The directory could not be inspected (missing, permissions, I/O).
    #[error("unable to use the configured cache-dir {path:?}: {source}")]
    Stat {
        /// Configured path.
        path: PathBuf,
        /// Underlying filesystem error.
        #[source]
        source: io::Error,
    },

    /// The path exists but is not a directory.
    #[error("unable to use the configured cache-dir {path:?}: not a directory")]
    NotADirectory {
        /// Configured path.
        path: PathBuf,
    },
}

/// A validated, size-bounded disk cache rooted at an existing directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheHandle {
    root: PathBuf,
    max_bytes: u64,
}

impl CacheHandle {
    /// Validate `root` and bind it to `max_bytes` (zero means unbounded).
    pub async fn open(root: impl Into<PathBuf>, max_bytes: u64) -> Result<Self, CacheConfigError> {
        let root = root.into();
        let metadata = match tokio::fs::metadata(&root).await {
            Ok(metadata) => metadata,
            Err(source) => return Err(CacheConfigError::Stat { path: root, source }),
        };
        if !metadata.is_dir() {
            return Err(CacheConfigError::NotADirectory { path: root });
        }
        Ok(Self { root, max_bytes })
    }

    /// Root directory of the cache.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Configured size bound in bytes; zero means unbounded.
    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Read a cached object by its cache-relative name.
    ///
    /// Returns `Ok(None)` when nothing is cached under `name`. Callers are
    /// expected to have rejected names that could escape the root.
    pub async fn get(&self, name: &str) -> io::Result<Option<Vec<u8>>> {
        let path = self.root.join(name);
        match tokio::fs::metadata(&path).await {
            Ok(metadata) if metadata.is_file() => {}
            Ok(_) => return Ok(None),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        }
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Build the cache handle requested by `config`, if any.
///
/// Returns `Ok(None)` when no cache directory is configured.
pub async fn wire_cache(config: &ProxyConfig) -> Result<Option<CacheHandle>, CacheConfigError> {
    let Some(dir) = config.cache_dir.as_ref() else {
        tracing::info!("No cache-dir configured, running without a disk cache");
        return Ok(None);
    };

    let handle = CacheHandle::open(dir.clone(), config.cache_max_bytes).await?;
    tracing::info!(
        cache_dir = %handle.root().display(),
        max_bytes = handle.max_bytes(),
        "Using disk cache"
    );
    Ok(Some(handle))
}
