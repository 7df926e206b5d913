//! Exponential backoff with jitter for the accept loop.

use std::io;
use std::time::Duration;

use rand::Rng;

/// First delay after a transient accept failure.
pub const ACCEPT_BASE_DELAY_MS: u64 = 5;

/// Longest delay between accept attempts.
pub const ACCEPT_MAX_DELAY_MS: u64 = 1000;

/// Calculate exponential backoff delay with jitter.
pub fn calculate_backoff(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    if attempt == 0 {
        return Duration::from_millis(0);
    }

    let exponential_base = 2u64.saturating_pow(attempt - 1);
    let delay_ms = base_ms.saturating_mul(exponential_base);
    let capped_delay = delay_ms.min(max_ms);

    // Apply jitter (0 to 10% of the delay)
    let jitter_range = capped_delay / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped_delay + jitter)
}

/// Whether an accept error is worth retrying instead of stopping the server.
///
/// Covers peers that went away before the accept completed and running out
/// of file descriptors, both of which clear up on their own.
pub fn is_transient_accept_error(error: &io::Error) -> bool {
    use io::ErrorKind::*;

    if matches!(
        error.kind(),
        ConnectionAborted | ConnectionReset | ConnectionRefused | Interrupted | WouldBlock | TimedOut
    ) {
        return true;
    }

    // EMFILE / ENFILE / ENOBUFS / ENOMEM, Linux numbering
    #[cfg(target_os = "linux")]
    if let Some(code) = error.raw_os_error() {
        return matches!(code, 23 | 24 | 105 | 12);
    }

    false
}

/// Tracks consecutive accept failures for the server loop.
#[derive(Debug, Default)]
pub struct AcceptBackoff {
    attempt: u32,
}

impl AcceptBackoff {
    /// Delay before the next accept after another failure.
    pub fn next_delay(&mut self) -> Duration {
        self.attempt = self.attempt.saturating_add(1);
        calculate_backoff(self.attempt, ACCEPT_BASE_DELAY_MS, ACCEPT_MAX_DELAY_MS)
    }

    /// Forget previous failures after a successful accept.
    pub fn reset(&mut self) {
        self.attempt = 0;
    }
}
