//! In-process HTTP target for load tests.
//!
//! Binds an ephemeral port on 127.0.0.1 and answers every path with a fixed
//! status after an optional delay, counting the requests it receives.
//!
//! Behaviors that control the body after the headers went out (a body delay
//! or a truncated body) are served by a raw HTTP/1.1 writer instead of axum.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Router;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// How the mock server answers.
#[derive(Debug, Clone)]
pub struct MockBehavior {
    pub status: u16,
    /// Wait before sending the headers.
    pub delay: Duration,
    /// Wait between the headers and the body.
    pub body_delay: Duration,
    /// Send only half the advertised body, then close the connection.
    pub truncate_body: bool,
    pub body: String,
}

impl MockBehavior {
    /// `200 OK` with a small body and no delay.
    pub fn ok() -> Self {
        Self::status(200)
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            delay: Duration::ZERO,
            body_delay: Duration::ZERO,
            truncate_body: false,
            body: "ok".to_string(),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_body_delay(mut self, delay: Duration) -> Self {
        self.body_delay = delay;
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn truncated(mut self) -> Self {
        self.truncate_body = true;
        self
    }

    fn needs_raw_writer(&self) -> bool {
        self.truncate_body || !self.body_delay.is_zero()
    }
}

struct MockState {
    behavior: MockBehavior,
    hits: AtomicU64,
}

/// Running mock server. Shut down when dropped.
pub struct MockServer {
    addr: SocketAddr,
    state: Arc<MockState>,
    handle: JoinHandle<()>,
}

impl MockServer {
    /// Start a server on an ephemeral port.
    ///
    /// Panics if the port cannot be bound, which only happens in a broken
    /// test environment.
    pub async fn start(behavior: MockBehavior) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock server");
        let addr = listener.local_addr().expect("Mock server has no address");

        let state = Arc::new(MockState {
            behavior,
            hits: AtomicU64::new(0),
        });

        let handle = if state.behavior.needs_raw_writer() {
            tokio::spawn(serve_raw(listener, state.clone()))
        } else {
            let app = Router::new().fallback(respond).with_state(state.clone());
            tokio::spawn(async move {
                let _ = axum::serve(listener, app).await;
            })
        };

        Self {
            addr,
            state,
            handle,
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Base URL, e.g. `http://127.0.0.1:43211/`.
    pub fn url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    /// Number of requests received so far.
    pub fn hits(&self) -> u64 {
        self.state.hits.load(Ordering::SeqCst)
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn respond(State(state): State<Arc<MockState>>) -> (StatusCode, String) {
    state.hits.fetch_add(1, Ordering::SeqCst);

    if !state.behavior.delay.is_zero() {
        tokio::time::sleep(state.behavior.delay).await;
    }

    let status =
        StatusCode::from_u16(state.behavior.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, state.behavior.body.clone())
}

async fn serve_raw(listener: TcpListener, state: Arc<MockState>) {
    while let Ok((stream, _)) = listener.accept().await {
        let state = state.clone();
        tokio::spawn(async move {
            let _ = respond_raw(stream, &state).await;
        });
    }
}

async fn respond_raw(mut stream: TcpStream, state: &MockState) -> std::io::Result<()> {
    // Read the request head; the body of a GET is ignored.
    let mut request = Vec::new();
    let mut buf = [0u8; 1024];
    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut buf).await?;
        if n == 0 {
            return Ok(());
        }
        request.extend_from_slice(&buf[..n]);
    }
    state.hits.fetch_add(1, Ordering::SeqCst);

    let behavior = &state.behavior;
    if !behavior.delay.is_zero() {
        tokio::time::sleep(behavior.delay).await;
    }

    let reason = StatusCode::from_u16(behavior.status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Unknown");
    let body = behavior.body.as_bytes();
    let head = format!(
        "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        behavior.status,
        reason,
        body.len()
    );
    stream.write_all(head.as_bytes()).await?;
    stream.flush().await?;

    if !behavior.body_delay.is_zero() {
        tokio::time::sleep(behavior.body_delay).await;
    }

    let sent = if behavior.truncate_body {
        &body[..body.len() / 2]
    } else {
        body
    };
    stream.write_all(sent).await?;
    stream.shutdown().await
}

/// URL of a local port with nothing listening on it.
///
/// The port is bound and released immediately, so connections to it are
/// refused.
pub fn refused_url() -> String {
    let listener =
        std::net::TcpListener::bind("127.0.0.1:0").expect("Failed to bind throwaway listener");
    let port = listener
        .local_addr()
        .expect("Throwaway listener has no address")
        .port();
    drop(listener);
    format!("http://127.0.0.1:{}/", port)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_server_answers_with_configured_status() {
        let server = MockServer::start(MockBehavior::status(503).with_body("busy")).await;

        let response = reqwest::get(server.url()).await.unwrap();
        assert_eq!(response.status().as_u16(), 503);
        assert_eq!(response.text().await.unwrap(), "busy");
        assert_eq!(server.hits(), 1);
    }

    #[tokio::test]
    async fn test_mock_server_answers_any_path() {
        let server = MockServer::start(MockBehavior::ok()).await;

        let url = format!("{}some/deep/path?q=1", server.url());
        let response = reqwest::get(url).await.unwrap();
        assert_eq!(response.status().as_u16(), 200);
    }

    #[tokio::test]
    async fn test_mock_server_binds_loopback() {
        let server = MockServer::start(MockBehavior::ok()).await;

        assert!(server.addr().ip().is_loopback());
        assert_eq!(server.url(), format!("http://127.0.0.1:{}/", server.addr().port()));
    }

    #[tokio::test]
    async fn test_body_delay_sends_headers_first() {
        let server = MockServer::start(
            MockBehavior::ok()
                .with_body("delayed")
                .with_body_delay(Duration::from_millis(100)),
        )
        .await;

        let response = reqwest::get(server.url()).await.unwrap();
        assert_eq!(response.status().as_u16(), 200);
        assert_eq!(response.text().await.unwrap(), "delayed");
        assert_eq!(server.hits(), 1);
    }

    #[tokio::test]
    async fn test_truncated_body_fails_to_read() {
        let server =
            MockServer::start(MockBehavior::ok().with_body("0123456789").truncated()).await;

        let response = reqwest::get(server.url()).await.unwrap();
        assert_eq!(response.status().as_u16(), 200);
        assert!(response.bytes().await.is_err());
    }

    #[tokio::test]
    async fn test_refused_url_refuses() {
        let err = reqwest::get(refused_url()).await.unwrap_err();
        assert!(err.is_connect());
    }
}
