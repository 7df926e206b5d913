//! TCP listener with an explicit, shareable close.
//!
//! # Responsibilities
//! - Bind to the configured address and report the resolved address
//! - Accept incoming TCP connections
//! - Let another task close the listener while an accept is pending
//!
//! # Design Decisions
//! - Closed state is a flag, not an error message to be matched
//! - The first close wins; later closes report `AlreadyClosed`
//! - Closing drops the socket so the port is released immediately

use std::borrow::Cow;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// Failed to bind to address.
    #[error("failed to listen on {address:?}: {source}")]
    Bind {
        /// Address as configured.
        address: String,
        /// Underlying network error.
        #[source]
        source: io::Error,
    },

    /// Failed to accept connection.
    #[error("failed to accept: {0}")]
    Accept(#[source] io::Error),

    /// The listener was closed deliberately.
    #[error("listener closed")]
    Closed,

    /// `close` was called on a listener that was already closed.
    #[error("listener already closed")]
    AlreadyClosed,
}

/// Handle that closes a [`Listener`] from another task.
#[derive(Debug, Clone)]
pub struct ListenerCloser {
    closed: Arc<watch::Sender<bool>>,
}

impl ListenerCloser {
    fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { closed: Arc::new(tx) }
    }

    /// Close the listener. A pending `accept` returns [`ListenerError::Closed`].
    ///
    /// Only the first call has an effect; later calls return
    /// [`ListenerError::AlreadyClosed`] for the caller to log.
    pub fn close(&self) -> Result<(), ListenerError> {
        if self.closed.send_replace(true) {
            return Err(ListenerError::AlreadyClosed);
        }
        Ok(())
    }

    /// Whether `close` has been called.
    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    /// Resolve once the listener has been closed.
    pub async fn closed(&self) {
        let mut rx = self.closed.subscribe();
        // The sender lives in `self`, so this cannot observe a dropped channel.
        let _ = rx.wait_for(|closed| *closed).await;
    }
}

/// A bound TCP listener.
pub struct Listener {
    /// The underlying TCP listener, dropped once closed.
    inner: Option<TcpListener>,
    /// Address the socket is actually bound to.
    local_addr: SocketAddr,
    closer: ListenerCloser,
}

impl Listener {
    /// Bind to `address`.
    ///
    /// Accepts `host:port` (host names are resolved) and the `:port` shorthand
    /// for all interfaces: dual-stack `[::]` where IPv6 is available, IPv4
    /// `0.0.0.0` otherwise. Port 0 binds an ephemeral port.
    pub async fn bind(address: &str) -> Result<Self, ListenerError> {
        let bind_error = |source| ListenerError::Bind {
            address: address.to_string(),
            source,
        };

        let mut last_error = None;
        let mut bound = None;
        for candidate in bind_candidates(address) {
            match TcpListener::bind(&*candidate).await {
                Ok(listener) => {
                    bound = Some(listener);
                    break;
                }
                Err(e) => {
                    tracing::debug!(address = %candidate, error = %e, "Bind attempt failed");
                    last_error = Some(e);
                }
            }
        }
        let listener = match (bound, last_error) {
            (Some(listener), _) => listener,
            (None, Some(e)) => return Err(bind_error(e)),
            (None, None) => return Err(bind_error(io::ErrorKind::InvalidInput.into())),
        };
        let local_addr = listener.local_addr().map_err(bind_error)?;

        tracing::info!(address = %local_addr, "Listening on");

        Ok(Self {
            inner: Some(listener),
            local_addr,
            closer: ListenerCloser::new(),
        })
    }

    /// Accept a new connection.
    ///
    /// Returns [`ListenerError::Closed`] once the listener is closed, including
    /// when the close happens while this call is waiting.
    pub async fn accept(&mut self) -> Result<(TcpStream, SocketAddr), ListenerError> {
        if self.closer.is_closed() {
            self.inner = None;
        }
        let Some(inner) = self.inner.as_ref() else {
            return Err(ListenerError::Closed);
        };

        let accepted = tokio::select! {
            biased;
            _ = self.closer.closed() => None,
            result = inner.accept() => Some(result),
        };

        match accepted {
            Some(Ok(conn)) => Ok(conn),
            Some(Err(_)) | None if self.closer.is_closed() => {
                self.inner = None;
                Err(ListenerError::Closed)
            }
            Some(Err(e)) => Err(ListenerError::Accept(e)),
            None => Err(ListenerError::Closed),
        }
    }

    /// Get the local address this listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// A handle that can close this listener from another task.
    pub fn closer(&self) -> ListenerCloser {
        self.closer.clone()
    }

    /// Whether the listener has been closed.
    pub fn is_closed(&self) -> bool {
        self.closer.is_closed()
    }
}

impl std::fmt::Debug for Listener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listener")
            .field("local_addr", &self.local_addr)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Addresses to try, in order, when binding `address`.
///
/// The `:port` shorthand tries the IPv6 wildcard first (which also accepts
/// IPv4 on dual-stack hosts), then the IPv4 wildcard.
fn bind_candidates(address: &str) -> Vec<Cow<'_, str>> {
    if address.starts_with(':') {
        vec![Cow::Owned(format!("[::]{address}")), normalize_address(address)]
    } else {
        vec![Cow::Borrowed(address)]
    }
}

/// Expand the `:port` shorthand to the IPv4 all-interfaces address.
pub(crate) fn normalize_address(address: &str) -> Cow<'_, str> {
    if address.starts_with(':') {
        Cow::Owned(format!("0.0.0.0{address}"))
    } else {
        Cow::Borrowed(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn port_shorthand_binds_all_interfaces() {
        assert_eq!(normalize_address(":8080"), "0.0.0.0:8080");
        assert_eq!(normalize_address("127.0.0.1:8080"), "127.0.0.1:8080");
        assert_eq!(normalize_address("localhost:0"), "localhost:0");
    }

    #[test]
    fn port_shorthand_prefers_dual_stack() {
        assert_eq!(bind_candidates(":8080"), vec!["[::]:8080", "0.0.0.0:8080"]);
        assert_eq!(bind_candidates("127.0.0.1:8080"), vec!["127.0.0.1:8080"]);
    }

    #[tokio::test]
    async fn port_shorthand_accepts_ipv4_clients() {
        let mut listener = Listener::bind(":0").await.unwrap();
        assert!(listener.local_addr().ip().is_unspecified());
        let addr = SocketAddr::from(([127, 0, 0, 1], listener.local_addr().port()));

        // A v6-only wildcard would refuse this; the fallback or dual-stack accepts it.
        match TcpStream::connect(addr).await {
            Ok(_client) => assert!(listener.accept().await.is_ok()),
            Err(e) => assert!(listener.local_addr().is_ipv6(), "{e}"),
        }
    }

    #[tokio::test]
    async fn ephemeral_port_is_resolved() {
        let listener = Listener::bind("127.0.0.1:0").await.unwrap();
        assert_ne!(listener.local_addr().port(), 0);

        let shorthand = Listener::bind(":0").await.unwrap();
        assert_ne!(shorthand.local_addr().port(), 0);
    }

    #[tokio::test]
    async fn occupied_address_is_a_bind_error() {
        let first = Listener::bind("127.0.0.1:0").await.unwrap();
        let taken = first.local_addr().to_string();

        let err = Listener::bind(&taken).await.unwrap_err();
        assert!(matches!(err, ListenerError::Bind { .. }));
    }

    #[tokio::test]
    async fn invalid_address_is_a_bind_error() {
        for address in ["", "not an address", "127.0.0.1:99999"] {
            let err = Listener::bind(address).await.unwrap_err();
            assert!(matches!(err, ListenerError::Bind { .. }), "{address:?}");
        }
    }

    #[tokio::test]
    async fn accepts_connections() {
        let mut listener = Listener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr();

        let client = tokio::spawn(async move { TcpStream::connect(addr).await.unwrap() });
        let (_stream, peer) = listener.accept().await.unwrap();
        let client = client.await.unwrap();
        assert_eq!(peer, client.local_addr().unwrap());
    }

    #[tokio::test]
    async fn close_interrupts_pending_accept() {
        let mut listener = Listener::bind("127.0.0.1:0").await.unwrap();
        let closer = listener.closer();

        let pending = tokio::spawn(async move { listener.accept().await.map(|_| ()) });
        tokio::time::sleep(Duration::from_millis(50)).await;
        closer.close().unwrap();

        let result = tokio::time::timeout(Duration::from_secs(5), pending)
            .await
            .expect("accept returned after close")
            .unwrap();
        assert!(matches!(result, Err(ListenerError::Closed)));
    }

    #[tokio::test]
    async fn second_close_is_reported_not_fatal() {
        let listener = Listener::bind("127.0.0.1:0").await.unwrap();
        let closer = listener.closer();

        assert!(closer.close().is_ok());
        assert!(matches!(closer.close(), Err(ListenerError::AlreadyClosed)));
        assert!(listener.is_closed());
    }

    #[tokio::test]
    async fn close_releases_the_port() {
        let mut listener = Listener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().to_string();

        listener.closer().close().unwrap();
        assert!(matches!(listener.accept().await, Err(ListenerError::Closed)));

        Listener::bind(&addr).await.unwrap();
    }
}
