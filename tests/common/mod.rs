//! Raw HTTP client helpers shared by the socket-level tests.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use wicket::routes::Router;
use wicket::server::listener;
use wicket::store::FileStore;

#[derive(Debug)]
pub struct RawResponse {
    pub status: u16,
    pub reason: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

pub fn router(dir: Option<&Path>) -> Router {
    Router::new(Arc::new(FileStore::new(dir.map(Path::to_path_buf))))
}

/// Starts a server on an ephemeral port and returns its address.
pub async fn spawn_server(dir: Option<&Path>) -> SocketAddr {
    let socket = listener::bind("127.0.0.1:0").await.unwrap();
    let addr = socket.local_addr().unwrap();
    tokio::spawn(listener::serve(
        socket,
        router(dir),
        Some(Duration::from_secs(5)),
    ));
    addr
}

/// Reads one framed response, keeping any extra bytes in `pending`.
///
/// Returns `None` if the peer closes before a full response arrives.
pub async fn read_response<R>(stream: &mut R, pending: &mut Vec<u8>) -> Option<RawResponse>
where
    R: AsyncRead + Unpin,
{
    loop {
        if let Some(head_end) = pending.windows(4).position(|w| w == b"\r\n\r\n") {
            let head = String::from_utf8(pending[..head_end].to_vec()).unwrap();
            let mut lines = head.split("\r\n");
            let status_line = lines.next().unwrap();
            let mut parts = status_line.splitn(3, ' ');
            assert_eq!(parts.next(), Some("HTTP/1.1"));
            let status = parts.next().unwrap().parse().unwrap();
            let reason = parts.next().unwrap_or_default().to_string();

            let headers: Vec<(String, String)> = lines
                .map(|line| {
                    let (k, v) = line.split_once(": ").unwrap();
                    (k.to_string(), v.to_string())
                })
                .collect();
            let length: usize = headers
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case("Content-Length"))
                .map(|(_, v)| v.parse().unwrap())
                .unwrap_or(0);

            let total = head_end + 4 + length;
            if pending.len() >= total {
                let body = pending[head_end + 4..total].to_vec();
                pending.drain(..total);
                return Some(RawResponse {
                    status,
                    reason,
                    headers,
                    body,
                });
            }
        }

        let mut chunk = [0u8; 4096];
        let n = stream.read(&mut chunk).await.unwrap_or(0);
        if n == 0 {
            return None;
        }
        pending.extend_from_slice(&chunk[..n]);
    }
}

/// True when the peer has closed and sent nothing more.
pub async fn is_closed<R>(stream: &mut R) -> bool
where
    R: AsyncRead + Unpin,
{
    let mut byte = [0u8; 1];
    matches!(
        tokio::time::timeout(Duration::from_secs(5), stream.read(&mut byte)).await,
        Ok(Ok(0)) | Ok(Err(_))
    )
}
