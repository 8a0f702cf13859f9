//! The HTTP/1 front end, over a real socket

use bytes::Bytes;
use drivegate_core::archive::MemoryStore;
use drivegate_core::config::ServerConfig;
use drivegate_core::dns::StaticNameResolver;
use drivegate_core::http::GatewayServer;
use drivegate_core::{ContentKey, Gateway};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

async fn start() -> (SocketAddr, oneshot::Sender<()>) {
    let store = Arc::new(MemoryStore::new());
    let key = ContentKey::derive("site");
    store.publish(
        key,
        vec![
            ("/docs/index.html".to_string(), Bytes::from_static(b"<p>docs</p>")),
            ("/hello.txt".to_string(), Bytes::from_static(b"hello over http")),
        ],
    );
    let mut resolver = StaticNameResolver::new();
    resolver.insert("site", key);
    let gateway = Gateway::builder(store).resolver(Arc::new(resolver)).build();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop, stopped) = oneshot::channel::<()>();
    let config = ServerConfig { access_log: false, ..Default::default() };
    tokio::spawn(async move {
        GatewayServer::new(gateway, config)
            .serve_until(listener, async {
                let _ = stopped.await;
            })
            .await
            .unwrap();
    });
    (addr, stop)
}

async fn raw_request(addr: SocketAddr, method: &str, target: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!(
        "{} {} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
        method, target
    );
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    String::from_utf8_lossy(&response).to_ascii_lowercase()
}

#[tokio::test]
async fn serves_files_over_http() {
    let (addr, stop) = start().await;
    let response = raw_request(addr, "GET", "/site/hello.txt").await;
    assert!(response.starts_with("http/1.1 200"));
    assert!(response.contains("access-control-allow-origin: *"));
    assert!(response.ends_with("hello over http"));
    let _ = stop.send(());
}

#[tokio::test]
async fn redirects_stay_on_the_gateway() {
    let (addr, stop) = start().await;
    let response = raw_request(addr, "GET", "/site/docs").await;
    assert!(response.starts_with("http/1.1 303"));
    assert!(response.contains("location: /site/docs/\r\n"));
    let _ = stop.send(());
}

#[tokio::test]
async fn other_methods_are_rejected() {
    let (addr, stop) = start().await;
    let response = raw_request(addr, "DELETE", "/site/hello.txt").await;
    assert!(response.starts_with("http/1.1 405"));
    let _ = stop.send(());
}
