//! HTTP endpoint exposing the metrics registry for pull-based scraping.
//!
//! Minimal HTTP/1.1 responder: one request per connection, `GET` only.

use crate::registry::ExerciserMetrics;
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info};

/// Path the registry is served on.
pub const METRICS_PATH: &str = "/metrics";

const OPENMETRICS_CONTENT_TYPE: &str = "application/openmetrics-text; version=1.0.0; charset=utf-8";
const REQUEST_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Serve `metrics` on `listener` until the task is dropped.
pub async fn serve_metrics(listener: TcpListener, metrics: Arc<ExerciserMetrics>) -> Result<()> {
    let local_addr = listener
        .local_addr()
        .context("Failed to read metrics listener address")?;
    info!("Starting prometheus server on {}{}", local_addr, METRICS_PATH);

    loop {
        let (stream, addr) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                error!("Error accepting metrics connection: {}", e);
                continue;
            }
        };

        let metrics = Arc::clone(&metrics);
        tokio::spawn(async move {
            debug!("Metrics connection from {}", addr);
            if let Err(e) = handle_connection(stream, &metrics).await {
                error!("Error handling metrics connection from {}: {:#}", addr, e);
            }
        });
    }
}

async fn handle_connection(mut stream: TcpStream, metrics: &ExerciserMetrics) -> Result<()> {
    let request_line = tokio::time::timeout(REQUEST_READ_TIMEOUT, read_request_line(&mut stream))
        .await
        .context("Timed out reading request")??;

    let (status, content_type, body) = route(&request_line, metrics);

    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        content_type,
        body.len(),
        body
    );
    stream.write_all(response.as_bytes()).await?;
    stream.flush().await?;
    Ok(())
}

/// Read the request line and drain headers up to the blank line.
async fn read_request_line(stream: &mut TcpStream) -> Result<String> {
    let mut reader = BufReader::new(stream);
    let mut request_line = String::new();
    reader.read_line(&mut request_line).await?;
    if request_line.trim().is_empty() {
        anyhow::bail!("Empty request");
    }

    let mut header = String::new();
    loop {
        header.clear();
        let read = reader.read_line(&mut header).await?;
        if read == 0 || header.trim().is_empty() {
            break;
        }
    }

    Ok(request_line.trim_end().to_string())
}

fn route(request_line: &str, metrics: &ExerciserMetrics) -> (&'static str, &'static str, String) {
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default();
    let path = parts.next().unwrap_or_default();

    match (method, path) {
        ("GET", METRICS_PATH) => match metrics.encode() {
            Ok(body) => ("200 OK", OPENMETRICS_CONTENT_TYPE, body),
            Err(e) => {
                error!("Failed to encode metrics: {}", e);
                (
                    "500 Internal Server Error",
                    "text/plain",
                    "failed to encode metrics\n".to_string(),
                )
            }
        },
        ("GET", "/health") => ("200 OK", "application/json", r#"{"status":"healthy"}"#.to_string()),
        _ => ("404 Not Found", "text/plain", "not found\n".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    async fn request(addr: std::net::SocketAddr, line: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(format!("{line}\r\nHost: localhost\r\n\r\n").as_bytes())
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    async fn start_server(metrics: Arc<ExerciserMetrics>) -> std::net::SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(serve_metrics(listener, metrics));
        addr
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        let metrics = Arc::new(ExerciserMetrics::new());
        metrics.record_query_error("1", "test_query");
        let addr = start_server(Arc::clone(&metrics)).await;

        let response = request(addr, "GET /metrics HTTP/1.1").await;

        assert!(response.starts_with("HTTP/1.1 200 OK"));
        assert!(response.contains("db_query_errors_total"));
        assert!(response.contains(OPENMETRICS_CONTENT_TYPE));
    }

    #[tokio::test]
    async fn test_health_and_unknown_paths() {
        let addr = start_server(Arc::new(ExerciserMetrics::new())).await;

        let health = request(addr, "GET /health HTTP/1.1").await;
        assert!(health.starts_with("HTTP/1.1 200 OK"));
        assert!(health.contains("healthy"));

        let missing = request(addr, "GET /nope HTTP/1.1").await;
        assert!(missing.starts_with("HTTP/1.1 404 Not Found"));

        let post = request(addr, "POST /metrics HTTP/1.1").await;
        assert!(post.starts_with("HTTP/1.1 404 Not Found"));
    }
}
