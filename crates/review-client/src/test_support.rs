//! Loopback HTTP server that answers scripted replies, one per connection.
use tokio::io::{AsyncReadExt as _, AsyncWriteExt as _};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

pub(crate) struct Reply {
    status: &'static str,
    content_type: &'static str,
    body: &'static str,
    gate: Option<oneshot::Receiver<()>>,
}

impl Reply {
    pub fn json(status: &'static str, body: &'static str) -> Self {
        Self::new(status, "application/json", body)
    }

    pub fn text(status: &'static str, body: &'static str) -> Self {
        Self::new(status, "text/plain", body)
    }

    pub fn event_stream(body: &'static str) -> Self {
        Self::new("200 OK", "text/event-stream", body)
    }

    /// Holds the reply back until `gate` fires.
    pub fn after(mut self, gate: oneshot::Receiver<()>) -> Self {
        self.gate = Some(gate);
        self
    }

    fn new(status: &'static str, content_type: &'static str, body: &'static str) -> Self {
        Self {
            status,
            content_type,
            body,
            gate: None,
        }
    }
}

fn content_length(headers: &str) -> usize {
    headers
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.trim()
                .eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse().ok())
                .flatten()
        })
        .unwrap_or(0)
}

async fn read_request(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = socket.read(&mut chunk).await.expect("read");
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        let text = String::from_utf8_lossy(&buf);
        if let Some(end) = text.find("\r\n\r\n")
            && buf.len() >= end + 4 + content_length(&text[..end])
        {
            break;
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// Serves `replies` in order, closing each connection after its reply.
///
/// Returns the base URL and a handle resolving to the raw requests received.
pub(crate) async fn serve(replies: Vec<Reply>) -> (String, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let handle = tokio::spawn(async move {
        let mut requests = Vec::new();
        for reply in replies {
            let (mut socket, _) = listener.accept().await.expect("accept");
            requests.push(read_request(&mut socket).await);
            if let Some(gate) = reply.gate {
                gate.await.ok();
            }
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                reply.status,
                reply.content_type,
                reply.body.len(),
                reply.body
            );
            socket.write_all(response.as_bytes()).await.expect("write");
            socket.shutdown().await.ok();
        }
        requests
    });
    (format!("http://{addr}"), handle)
}
