//! Transports for the archive tools.
//!
//! The daemon always speaks MCP over stdio unless told otherwise, and can
//! additionally expose streamable HTTP with a `/health` probe next to `/mcp`.

use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::get;
use ia_core::control::ArchiveControlPlane;
use ia_core::runner::ArchiveRunner;
use rmcp::serve_server;
use rmcp::transport::io::stdio;
use rmcp::transport::streamable_http_server::{
    StreamableHttpServerConfig,
    StreamableHttpService,
    session::local::LocalSessionManager,
};
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::IaMcp;

pub const DEFAULT_HTTP_ADDR: &str = "127.0.0.1:4030";
const SSE_KEEP_ALIVE: Duration = Duration::from_secs(15);
const SSE_RETRY: Duration = Duration::from_secs(3);

pub type ServeResult = Result<(), Box<dyn Error + Send + Sync>>;

/// Which transports to run. At least one must be enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transports {
    pub stdio: bool,
    pub http: Option<SocketAddr>,
}

/// Runs the enabled transports until the primary one finishes.
///
/// With both enabled, HTTP runs in the background and stdio decides the
/// lifetime of the process; an HTTP failure is logged and stdio keeps going.
///
/// # Errors
/// Returns an error when no transport is enabled or the primary transport fails.
pub async fn serve<R: ArchiveRunner>(
    control: ArchiveControlPlane<R>,
    transports: Transports,
) -> ServeResult {
    match (transports.stdio, transports.http) {
        (false, None) => Err("no MCP transport enabled".into()),
        (false, Some(addr)) => serve_http(control, addr).await,
        (true, None) => serve_stdio(control).await,
        (true, Some(addr)) => {
            let http_control = control.clone();
            tokio::spawn(async move {
                if let Err(err) = serve_http(http_control, addr).await {
                    error!(%err, %addr, "streamable HTTP transport stopped");
                }
            });
            serve_stdio(control).await
        }
    }
}

/// Serves the archive tools over stdio.
///
/// # Errors
/// Returns any transport or server error.
pub async fn serve_stdio<R: ArchiveRunner>(control: ArchiveControlPlane<R>) -> ServeResult {
    info!("serving MCP over stdio");
    let running = serve_server(IaMcp::new(control), stdio()).await?;
    let reason = running.waiting().await?;
    info!(?reason, "stdio transport closed");
    Ok(())
}

/// Binds `addr` and serves the archive tools over streamable HTTP.
///
/// # Errors
/// Returns any bind or server error.
pub async fn serve_http<R: ArchiveRunner>(
    control: ArchiveControlPlane<R>,
    addr: SocketAddr,
) -> ServeResult {
    let listener = TcpListener::bind(addr).await?;
    serve_http_on(control, listener).await
}

/// Serves streamable HTTP on an already bound listener.
///
/// # Errors
/// Returns any server error.
pub async fn serve_http_on<R: ArchiveRunner>(
    control: ArchiveControlPlane<R>,
    listener: TcpListener,
) -> ServeResult {
    info!(addr = %listener.local_addr()?, "serving MCP over streamable HTTP");
    axum::serve(listener, http_router(control)).await?;
    Ok(())
}

/// Routes `/mcp` to a fresh tool server per session, plus `/health`.
#[must_use]
pub fn http_router<R: ArchiveRunner>(control: ArchiveControlPlane<R>) -> Router {
    let service: StreamableHttpService<IaMcp<R>, LocalSessionManager> =
        StreamableHttpService::new(
            move || Ok(IaMcp::new(control.clone())),
            Arc::new(LocalSessionManager::default()),
            StreamableHttpServerConfig {
                sse_keep_alive: Some(SSE_KEEP_ALIVE),
                sse_retry: Some(SSE_RETRY),
                stateful_mode: true,
                ..Default::default()
            },
        );

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .nest_service("/mcp", service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    #[tokio::test]
    async fn refuses_to_run_without_a_transport() {
        let err = serve(
            test_support::control(""),
            Transports {
                stdio: false,
                http: None,
            },
        )
        .await
        .expect_err("no transport");
        assert!(err.to_string().contains("no MCP transport"));
    }

    #[tokio::test]
    async fn http_serves_health_check() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(serve_http_on(test_support::control(""), listener));

        let mut stream = TcpStream::connect(addr).await.expect("connect");
        stream
            .write_all(b"GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .expect("write request");
        let mut response = String::new();
        stream.read_to_string(&mut response).await.expect("read response");

        assert!(response.starts_with("HTTP/1.1 200"), "{response}");
        assert!(response.ends_with("ok"), "{response}");
    }

    #[test]
    fn default_addr_is_loopback() {
        let addr: SocketAddr = DEFAULT_HTTP_ADDR.parse().expect("valid addr");
        assert!(addr.ip().is_loopback());
    }
}
