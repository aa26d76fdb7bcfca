//! Single-request HTTP server on a loopback port, for tests that need to see
//! exactly what went over the wire.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

pub(crate) struct StubServer {
  base_url: String,
  request: JoinHandle<String>,
}

impl StubServer {
  /// Accept one connection, answer it with `status` and a JSON `body`.
  pub async fn respond(status: u16, body: &str) -> Self {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let body = body.to_string();

    let request = tokio::spawn(async move {
      let (mut socket, _) = listener.accept().await.unwrap();
      let raw = read_request(&mut socket).await;
      let response = format!(
        "HTTP/1.1 {} Stub\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
      );
      socket.write_all(response.as_bytes()).await.unwrap();
      let _ = socket.shutdown().await;
      raw
    });

    Self {
      base_url: format!("http://{}/api", addr),
      request,
    }
  }

  pub fn base_url(&self) -> &str {
    &self.base_url
  }

  /// The raw request (request line, headers and body) the server received.
  pub async fn request(self) -> String {
    self.request.await.unwrap()
  }
}

async fn read_request(socket: &mut TcpStream) -> String {
  let mut buf = Vec::new();
  let mut chunk = [0u8; 4096];

  loop {
    let n = socket.read(&mut chunk).await.unwrap();
    if n == 0 {
      break;
    }
    buf.extend_from_slice(&chunk[..n]);
    if is_complete(&buf) {
      break;
    }
  }

  String::from_utf8_lossy(&buf).into_owned()
}

fn is_complete(buf: &[u8]) -> bool {
  let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
    return false;
  };
  let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
  let body = &buf[end + 4..];

  if head.contains("transfer-encoding: chunked") {
    return body.ends_with(b"0\r\n\r\n");
  }

  let length = head
    .lines()
    .find_map(|line| line.strip_prefix("content-length:"))
    .and_then(|value| value.trim().parse::<usize>().ok())
    .unwrap_or(0);
  body.len() >= length
}
