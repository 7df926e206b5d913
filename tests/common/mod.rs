//! Shared utilities for integration tests.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use module_proxy::lifecycle::{Bootstrap, ShutdownSignal, StartupError};
use module_proxy::ProxyConfig;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A server running on an ephemeral port, stopped through `signals`.
pub struct RunningServer {
    pub addr: SocketAddr,
    pub signals: mpsc::Sender<ShutdownSignal>,
    pub handle: JoinHandle<Result<(), StartupError>>,
}

/// Bootstrap `config` and start serving with a channel as the signal source.
pub async fn start_server(config: ProxyConfig) -> RunningServer {
    let bootstrap = Bootstrap::prepare(&config).await.unwrap();
    let local = bootstrap.local_addr();
    let loopback = if local.is_ipv6() {
        IpAddr::V6(Ipv6Addr::LOCALHOST)
    } else {
        IpAddr::V4(Ipv4Addr::LOCALHOST)
    };
    let addr = SocketAddr::new(loopback, local.port());

    let (tx, rx) = mpsc::channel(4);
    let handle = tokio::spawn(bootstrap.serve(rx));

    RunningServer {
        addr,
        signals: tx,
        handle,
    }
}

impl RunningServer {
    /// Wait for the server to stop, failing the test if it takes too long.
    pub async fn stopped(self) -> Result<(), StartupError> {
        tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("server did not stop")
            .unwrap()
    }
}

/// Minimal HTTP/1.1 exchange. Returns the status code and the raw response.
pub async fn http_request(addr: SocketAddr, method: &str, path: &str) -> (u16, String) {
    http_request_with_headers(addr, method, path, &[]).await
}

/// Like [`http_request`], with extra request headers.
#[allow(dead_code)]
pub async fn http_request_with_headers(
    addr: SocketAddr,
    method: &str,
    path: &str,
    headers: &[(&str, &str)],
) -> (u16, String) {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let mut request = format!("{method} {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n");
    for (name, value) in headers {
        request.push_str(&format!("{name}: {value}\r\n"));
    }
    request.push_str("\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.unwrap();
    let response = String::from_utf8_lossy(&raw).into_owned();
    let status = response
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse().ok())
        .unwrap_or(0);
    (status, response)
}

/// Value of response header `name` (case-insensitive), if present.
#[allow(dead_code)]
pub fn header_value<'a>(response: &'a str, name: &str) -> Option<&'a str> {
    response
        .split("\r\n\r\n")
        .next()?
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case(name))
        .map(|(_, value)| value.trim())
}
