//! The module proxy handler served through the real accept loop.

use module_proxy::lifecycle::ShutdownSignal;
use module_proxy::ProxyConfig;
use uuid::Uuid;

mod common;

fn populated_cache() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let versions = dir.path().join("golang.org/x/text/@v");
    std::fs::create_dir_all(&versions).unwrap();
    std::fs::write(versions.join("list"), "v0.3.0\nv0.3.1\n").unwrap();
    std::fs::write(
        versions.join("v0.3.0.info"),
        r#"{"Version":"v0.3.0","Time":"2017-12-14T13:08:43Z"}"#,
    )
    .unwrap();
    dir
}

#[tokio::test]
async fn serves_cached_artifacts() {
    let cache = populated_cache();
    let config = ProxyConfig::new("127.0.0.1:0", cache.path().to_str().unwrap(), 10, "");
    let server = common::start_server(config).await;

    let (status, response) = common::http_request(server.addr, "GET", "/golang.org/x/text/@v/v0.3.0.info").await;
    assert_eq!(status, 200, "{response}");
    assert!(response.contains("application/json"));
    assert!(response.contains(r#""Version":"v0.3.0""#));

    let (status, response) = common::http_request(server.addr, "GET", "/golang.org/x/text/@v/list").await;
    assert_eq!(status, 200);
    assert!(response.ends_with("v0.3.0\nv0.3.1\n"));

    let (status, _) = common::http_request(server.addr, "GET", "/golang.org/x/text/@v/v9.9.9.info").await;
    assert_eq!(status, 404);

    server.signals.send(ShutdownSignal::Terminate).await.unwrap();
    assert!(server.stopped().await.is_ok());
}

#[tokio::test]
async fn without_cache_everything_is_not_found() {
    let server = common::start_server(ProxyConfig::new("127.0.0.1:0", "", 0, "")).await;

    let (status, _) = common::http_request(server.addr, "GET", "/golang.org/x/text/@v/list").await;
    assert_eq!(status, 404);

    server.signals.send(ShutdownSignal::Terminate).await.unwrap();
    assert!(server.stopped().await.is_ok());
}

#[tokio::test]
async fn rejects_other_methods_and_bad_paths() {
    let cache = populated_cache();
    let config = ProxyConfig::new("127.0.0.1:0", cache.path().to_str().unwrap(), 0, "");
    let server = common::start_server(config).await;

    let (status, response) = common::http_request(server.addr, "POST", "/golang.org/x/text/@v/list").await;
    assert_eq!(status, 405);
    assert!(response.to_ascii_lowercase().contains("allow: get, head"));

    let (status, _) = common::http_request(server.addr, "GET", "/golang.org/x/text/@v/..%2F..%2F..%2Fetc").await;
    assert_eq!(status, 400);

    server.signals.send(ShutdownSignal::Terminate).await.unwrap();
    assert!(server.stopped().await.is_ok());
}

#[tokio::test]
async fn generated_request_id_is_a_uuid() {
    let server = common::start_server(ProxyConfig::new("127.0.0.1:0", "", 0, "")).await;

    let (_, first) = common::http_request(server.addr, "GET", "/").await;
    let (_, second) = common::http_request(server.addr, "GET", "/").await;
    let first = common::header_value(&first, "x-request-id").expect("request id on response");
    let second = common::header_value(&second, "x-request-id").expect("request id on response");

    assert!(Uuid::parse_str(first).is_ok(), "{first}");
    assert_ne!(first, second);

    server.signals.send(ShutdownSignal::Terminate).await.unwrap();
    assert!(server.stopped().await.is_ok());
}

#[tokio::test]
async fn supplied_request_id_is_echoed() {
    let server = common::start_server(ProxyConfig::new("127.0.0.1:0", "", 0, "")).await;

    let (status, response) = common::http_request_with_headers(
        server.addr,
        "GET",
        "/golang.org/x/text/@v/list",
        &[("x-request-id", "abc")],
    )
    .await;
    assert_eq!(status, 404);
    assert_eq!(common::header_value(&response, "x-request-id"), Some("abc"));

    server.signals.send(ShutdownSignal::Terminate).await.unwrap();
    assert!(server.stopped().await.is_ok());
}
