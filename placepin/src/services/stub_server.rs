//! Loopback HTTP responder for client tests
//!
//! Serves one canned raw response per accepted connection, in order, and
//! records each request line.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Raw HTTP/1.1 response with a complete body
pub fn response(status_line: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status_line,
        body.len(),
        body
    )
}

/// Response announcing more body bytes than are sent before the socket closes
pub fn truncated_response(partial_body: &str) -> String {
    format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        partial_body.len() + 64,
        partial_body
    )
}

/// Start serving `responses`; returns the base URL and the recorded request lines
pub async fn serve(responses: Vec<String>) -> (String, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let mut request_lines = Vec::new();
        for raw in responses {
            let (mut socket, _) = listener.accept().await.unwrap();

            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let text = String::from_utf8_lossy(&request);
            request_lines.push(text.lines().next().unwrap_or_default().to_string());

            socket.write_all(raw.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        }
        request_lines
    });

    (format!("http://{}/json", addr), handle)
}
