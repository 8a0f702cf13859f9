//! hyper HTTP/1 server in front of the gateway

use super::{drive_url_for, log_access, rewrite_location};
use crate::config::ServerConfig;
use crate::gateway::{Gateway, GatewayRequest, RespBody};
use anyhow::{Context, Result};
use hyper::body::Incoming;
use hyper::header::{HeaderValue, CONTENT_LENGTH, LOCATION};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::time::Instant;
use tokio::net::TcpListener;

pub struct GatewayServer {
    gateway: Gateway,
    config: ServerConfig,
}

impl GatewayServer {
    pub fn new(gateway: Gateway, config: ServerConfig) -> Self {
        Self { gateway, config }
    }

    /// Bind the configured address and serve until the process ends
    pub async fn serve(self) -> Result<()> {
        let addr = self.config.bind_address();
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;
        self.serve_until(listener, std::future::pending()).await
    }

    /// Serve connections from `listener` until `shutdown` completes
    pub async fn serve_until<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let local = listener.local_addr().context("listener has no local address")?;
        log::info!(target: "drivegate::http", "drivegate listening on http://{}", local);

        tokio::pin!(shutdown);
        loop {
            let (stream, remote_addr) = tokio::select! {
                accepted = listener.accept() => accepted.context("accept failed")?,
                _ = &mut shutdown => {
                    log::info!(target: "drivegate::http", "shutting down");
                    return Ok(());
                }
            };

            let gateway = self.gateway.clone();
            let access_log = self.config.access_log;
            tokio::spawn(async move {
                let service = service_fn(move |req: Request<Incoming>| {
                    let gateway = gateway.clone();
                    async move { handle_http(gateway, req, Some(remote_addr), access_log).await }
                });
                if let Err(err) =
                    http1::Builder::new().serve_connection(TokioIo::new(stream), service).await
                {
                    log::debug!(target: "drivegate::http", "connection from {} ended: {}", remote_addr, err);
                }
            });
        }
    }
}

/// Translate one HTTP request into a gateway request and back
pub async fn handle_http(
    gateway: Gateway,
    req: Request<Incoming>,
    remote: Option<SocketAddr>,
    access_log: bool,
) -> Result<Response<RespBody>, Infallible> {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let request = GatewayRequest {
        url: drive_url_for(req.uri()),
        method: method.clone(),
        headers: req.headers().clone(),
    };
    let mut response = gateway.handle(request).await;

    if let Some(location) = response.headers().get(LOCATION).and_then(|v| v.to_str().ok()) {
        if let Ok(rewritten) = HeaderValue::from_str(&rewrite_location(location)) {
            response.headers_mut().insert(LOCATION, rewritten);
        }
    }

    if access_log {
        let len = response.headers().get(CONTENT_LENGTH).and_then(|v| v.to_str().ok());
        log_access(remote, method.as_str(), &path, response.status().as_u16(), len, start);
    }
    Ok(response)
}
