//! Resilience subsystem.
//!
//! The only retry in the server is the accept loop: transient accept failures
//! are retried with jittered exponential backoff, everything else stops the
//! server. Startup errors are never retried.

pub mod backoff;
