//! Shared utilities for integration testing.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Handle to a programmable loopback upstream.
pub struct Upstream {
    pub addr: SocketAddr,
    hits: Arc<AtomicU32>,
}

impl Upstream {
    /// Number of requests accepted so far.
    #[allow(dead_code)]
    pub fn hits(&self) -> u32 {
        self.hits.load(Ordering::SeqCst)
    }

    /// Target URL for a path on this upstream.
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Starts an upstream on an ephemeral port that runs `f` for every request
/// and writes the returned status and body.
pub async fn start_upstream<F, Fut>(f: F) -> Upstream
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicU32::new(0));
    let counter = hits.clone();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    counter.fetch_add(1, Ordering::SeqCst);
                    let f = f.clone();
                    tokio::spawn(async move {
                        // Drain the request head before answering.
                        let mut head = [0u8; 4096];
                        let _ = socket.read(&mut head).await;

                        let (status, body) = f().await;
                        let status_text = match status {
                            200 => "200 OK",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };
                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    Upstream { addr, hits }
}

/// Upstream answering every request with a fixed status and body.
#[allow(dead_code)]
pub async fn start_static_upstream(status: u16, body: &str) -> Upstream {
    let body = body.to_owned();
    start_upstream(move || {
        let body = body.clone();
        async move { (status, body) }
    })
    .await
}

/// A well-formed document with two complete entries.
#[allow(dead_code)]
pub const TWO_ENTRY_DOCUMENT: &str = "proxies:
  - username: user
    password: pass
    server: a.example
    port: 4433
    tls: true
    type: http
    sni: s1
  - username: user
    password: pass
    server: b.example
    port: 4444
    tls: true
    type: http
    sni: s2
";
