//! Connection state machine tests over an in-memory duplex pipe

mod common;

use std::time::Duration;

use common::{is_closed, read_response, router};
use tokio::io::{AsyncWriteExt, DuplexStream, duplex};
use tokio::task::JoinHandle;
use wicket::http::connection::Connection;

fn start(
    dir: Option<&std::path::Path>,
    read_timeout: Option<Duration>,
) -> (DuplexStream, JoinHandle<anyhow::Result<()>>) {
    let (client, server) = duplex(64 * 1024);
    let router = router(dir);
    let handle = tokio::spawn(async move {
        let mut conn = Connection::new(server, router, read_timeout);
        conn.run().await
    });
    (client, handle)
}

#[tokio::test]
async fn test_keep_alive_serves_sequential_requests() {
    let (mut client, _handle) = start(None, None);
    let mut pending = Vec::new();

    for fruit in ["apple", "banana", "cherry"] {
        let req = format!("GET /echo/{fruit} HTTP/1.1\r\nHost: x\r\n\r\n");
        client.write_all(req.as_bytes()).await.unwrap();

        let resp = read_response(&mut client, &mut pending).await.unwrap();
        assert_eq!(resp.status, 200);
        assert_eq!(resp.body, fruit.as_bytes());
        assert_eq!(resp.header("Connection"), None);
    }
}

#[tokio::test]
async fn test_connection_close_ends_connection() {
    let (mut client, handle) = start(None, None);
    let mut pending = Vec::new();

    client
        .write_all(b"GET /user-agent HTTP/1.1\r\nUser-Agent: banana/mango\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();

    let resp = read_response(&mut client, &mut pending).await.unwrap();
    assert_eq!(resp.status, 200);
    assert_eq!(resp.body, b"banana/mango");
    assert_eq!(resp.header("Connection"), Some("close"));
    assert_eq!(resp.headers.last().unwrap().0, "Connection");

    assert!(is_closed(&mut client).await);
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_pipelined_requests_answered_in_order() {
    let (mut client, _handle) = start(None, None);
    let mut pending = Vec::new();

    client
        .write_all(b"GET /echo/one HTTP/1.1\r\n\r\nGET /missing HTTP/1.1\r\n\r\nGET /echo/three HTTP/1.1\r\n\r\n")
        .await
        .unwrap();

    let first = read_response(&mut client, &mut pending).await.unwrap();
    let second = read_response(&mut client, &mut pending).await.unwrap();
    let third = read_response(&mut client, &mut pending).await.unwrap();

    assert_eq!((first.status, first.body.as_slice()), (200, b"one".as_slice()));
    assert_eq!(second.status, 404);
    assert_eq!((third.status, third.body.as_slice()), (200, b"three".as_slice()));
}

#[tokio::test]
async fn test_request_split_across_writes() {
    let dir = tempfile::tempdir().unwrap();
    let (mut client, _handle) = start(Some(dir.path()), None);
    let mut pending = Vec::new();

    let req = b"POST /files/split HTTP/1.1\r\nContent-Length: 11\r\n\r\nhello world";
    for chunk in req.chunks(3) {
        client.write_all(chunk).await.unwrap();
        tokio::time::sleep(Duration::from_millis(2)).await;
    }

    let resp = read_response(&mut client, &mut pending).await.unwrap();
    assert_eq!(resp.status, 201);
    assert_eq!(
        std::fs::read(dir.path().join("split")).unwrap(),
        b"hello world"
    );
}

#[tokio::test]
async fn test_malformed_request_closes_without_response() {
    let (mut client, handle) = start(None, None);

    client.write_all(b"NONSENSE\r\n\r\n").await.unwrap();

    assert!(is_closed(&mut client).await);
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_malformed_header_closes_without_response() {
    let (mut client, handle) = start(None, None);

    client
        .write_all(b"GET / HTTP/1.1\r\nno delimiter here\r\n\r\n")
        .await
        .unwrap();

    assert!(is_closed(&mut client).await);
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_peer_close_mid_body_dispatches_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let (mut client, handle) = start(Some(dir.path()), None);

    client
        .write_all(b"POST /files/partial HTTP/1.1\r\nContent-Length: 10\r\n\r\nabc")
        .await
        .unwrap();
    client.shutdown().await.unwrap();

    handle.await.unwrap().unwrap();
    assert!(!dir.path().join("partial").exists());
}

#[tokio::test]
async fn test_idle_peer_close_is_clean() {
    let (client, handle) = start(None, None);

    drop(client);

    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_read_timeout_closes_stalled_request() {
    let (mut client, handle) = start(None, Some(Duration::from_millis(50)));

    client
        .write_all(b"POST /files/x HTTP/1.1\r\nContent-Length: 5\r\n\r\nab")
        .await
        .unwrap();

    assert!(is_closed(&mut client).await);
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_read_timeout_bounds_whole_request() {
    let (client, handle) = start(None, Some(Duration::from_millis(200)));
    let (_reader, mut writer) = tokio::io::split(client);

    writer
        .write_all(b"POST /files/slow HTTP/1.1\r\nContent-Length: 1000\r\n\r\n")
        .await
        .unwrap();

    // One body byte well inside each timeout window
    tokio::spawn(async move {
        for _ in 0..40 {
            tokio::time::sleep(Duration::from_millis(50)).await;
            if writer.write_all(b"x").await.is_err() {
                break;
            }
        }
    });

    let finished = tokio::time::timeout(Duration::from_secs(2), handle).await;
    assert!(finished.is_ok(), "connection outlived its request deadline");
    finished.unwrap().unwrap().unwrap();
}

#[tokio::test]
async fn test_oversized_body_closes_without_response() {
    let (mut client, handle) = start(None, None);

    client
        .write_all(b"POST /files/big HTTP/1.1\r\nContent-Length: 999999999999\r\n\r\n")
        .await
        .unwrap();

    assert!(is_closed(&mut client).await);
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_read_timeout_resets_between_requests() {
    let (mut client, _handle) = start(None, Some(Duration::from_millis(300)));
    let mut pending = Vec::new();

    for word in ["first", "second", "third"] {
        tokio::time::sleep(Duration::from_millis(150)).await;
        let req = format!("GET /echo/{word} HTTP/1.1\r\n\r\n");
        client.write_all(req.as_bytes()).await.unwrap();

        let resp = read_response(&mut client, &mut pending).await.unwrap();
        assert_eq!(resp.body, word.as_bytes());
    }
}
