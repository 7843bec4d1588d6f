//! Integration tests for the HTTP client against a local canned-response server

use bookshelf_network::{Client, ClientConfig, NetworkError, RetryPolicy};
use serde::Deserialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

#[derive(Debug, Clone)]
struct RecordedRequest {
    method: String,
    path: String,
    body: String,
}

struct FakeServer {
    base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl FakeServer {
    /// Answers one connection per canned response, in order
    async fn start(responses: Vec<(u16, &'static str)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));

        let recorded = Arc::clone(&requests);
        tokio::spawn(async move {
            for (status, body) in responses {
                let Ok((mut stream, _)) = listener.accept().await else {
                    return;
                };
                let request = read_request(&mut stream).await;
                recorded.lock().unwrap().push(request);

                let response = format!(
                    "HTTP/1.1 {} Canned\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });

        Self { base_url, requests }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

async fn read_request(stream: &mut TcpStream) -> RecordedRequest {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 1024];

    let header_end = loop {
        let read = stream.read(&mut chunk).await.unwrap();
        if read == 0 {
            break buffer.len();
        }
        buffer.extend_from_slice(&chunk[..read]);
        if let Some(pos) = buffer.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buffer[..header_end]).to_string();
    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buffer.len() < header_end + content_length {
        let read = stream.read(&mut chunk).await.unwrap();
        if read == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..read]);
    }

    let mut request_line = head.lines().next().unwrap_or_default().split_whitespace();
    RecordedRequest {
        method: request_line.next().unwrap_or_default().to_string(),
        path: request_line.next().unwrap_or_default().to_string(),
        body: String::from_utf8_lossy(&buffer[header_end..]).to_string(),
    }
}

fn fast_client(attempts: usize) -> Client {
    Client::with_config(ClientConfig {
        timeout: Duration::from_secs(5),
        retry_policy: RetryPolicy::new(attempts).with_initial_delay(Duration::from_millis(1)),
        ..ClientConfig::default()
    })
    .unwrap()
}

#[derive(Debug, Deserialize, PartialEq)]
struct Shelf {
    name: String,
    count: u32,
}

#[tokio::test]
async fn test_get_json_decodes_body() {
    let server = FakeServer::start(vec![(200, r#"{"name":"fiction","count":3}"#)]).await;
    let client = fast_client(1);

    let shelf: Shelf = client.get_json(&server.url("/shelf")).await.unwrap();

    assert_eq!(
        shelf,
        Shelf {
            name: "fiction".to_string(),
            count: 3
        }
    );
    let requests = server.requests();
    assert_eq!(requests[0].method, "GET");
    assert_eq!(requests[0].path, "/shelf");
}

#[tokio::test]
async fn test_get_retries_server_errors() {
    let server = FakeServer::start(vec![
        (503, "{}"),
        (200, r#"{"name":"poetry","count":1}"#),
    ])
    .await;
    let client = fast_client(3);

    let shelf: Shelf = client.get_json(&server.url("/shelf")).await.unwrap();

    assert_eq!(shelf.name, "poetry");
    assert_eq!(server.requests().len(), 2);
}

#[tokio::test]
async fn test_get_does_not_retry_client_errors() {
    let server = FakeServer::start(vec![(404, "{}"), (200, "{}")]).await;
    let client = fast_client(3);

    let result: Result<Shelf, _> = client.get_json(&server.url("/missing")).await;

    match result {
        Err(NetworkError::Status { status, .. }) => assert_eq!(status, 404),
        other => panic!("expected 404, got {:?}", other),
    }
    assert_eq!(server.requests().len(), 1);
}

#[tokio::test]
async fn test_decode_failure() {
    let server = FakeServer::start(vec![(200, r#"{"unexpected":true}"#)]).await;
    let client = fast_client(1);

    let result: Result<Shelf, _> = client.get_json(&server.url("/shelf")).await;
    assert!(matches!(result, Err(NetworkError::Decode { .. })));
}

#[tokio::test]
async fn test_patch_sends_json_once() {
    let server = FakeServer::start(vec![(500, "{}"), (200, "{}")]).await;
    let client = fast_client(3);

    let result = client
        .patch_json(&server.url("/books/7"), &serde_json::json!({ "title": "Emma" }))
        .await;

    assert!(matches!(result, Err(NetworkError::Status { status: 500, .. })));
    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "PATCH");
    assert_eq!(requests[0].path, "/books/7");
    let body: serde_json::Value = serde_json::from_str(&requests[0].body).unwrap();
    assert_eq!(body["title"], "Emma");
}
