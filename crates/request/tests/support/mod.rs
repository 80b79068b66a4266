//! In-process HTTP server that answers each connection with a canned reply.
//!
//! Shared by the integration tests of several crates through `#[path]`.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

/// What the server does with one accepted connection.
#[allow(dead_code)]
pub enum Reply {
    /// Answer with a status line, reason phrase and body.
    Respond {
        status: u16,
        reason: &'static str,
        body: &'static str,
    },
    /// Read the request and never answer; report when the client closes
    /// the connection.
    Hang,
}

impl Reply {
    pub fn json(status: u16, reason: &'static str, body: &'static str) -> Self {
        Self::Respond { status, reason, body }
    }
}

/// A request as received by the server.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct Recorded {
    pub method: String,
    pub target: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

#[allow(dead_code)]
impl Recorded {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("request body is JSON")
    }
}

pub struct CannedServer {
    pub base: String,
    requests: mpsc::UnboundedReceiver<Recorded>,
    hangups: mpsc::UnboundedReceiver<String>,
}

#[allow(dead_code)]
impl CannedServer {
    /// Waits for the next recorded request.
    pub async fn next_request(&mut self) -> Recorded {
        tokio::time::timeout(Duration::from_secs(5), self.requests.recv())
            .await
            .expect("timed out waiting for a request")
            .expect("server stopped")
    }

    /// Waits up to `within` for the client to close a held-open connection;
    /// returns the target of the request that was on it.
    pub async fn hangup(&mut self, within: Duration) -> Option<String> {
        tokio::time::timeout(within, self.hangups.recv())
            .await
            .ok()
            .flatten()
    }

    pub fn url(&self, path: &str) -> reqwest::Url {
        reqwest::Url::parse(&format!("{}{}", self.base, path)).expect("valid test URL")
    }
}

/// Serves `replies` in order, one per connection.
pub async fn serve(replies: Vec<Reply>) -> CannedServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let base = format!("http://{}/", listener.local_addr().expect("local addr"));
    let (tx, rx) = mpsc::unbounded_channel();
    let (hangup_tx, hangup_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        for reply in replies {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            tokio::spawn(handle(stream, reply, tx.clone(), hangup_tx.clone()));
        }
    });

    CannedServer {
        base,
        requests: rx,
        hangups: hangup_rx,
    }
}

async fn handle(
    mut stream: TcpStream,
    reply: Reply,
    tx: mpsc::UnboundedSender<Recorded>,
    hangups: mpsc::UnboundedSender<String>,
) {
    let Some(recorded) = read_request(&mut stream).await else {
        return;
    };
    let target = recorded.target.clone();
    let _ = tx.send(recorded);

    match reply {
        Reply::Respond { status, reason, body } => {
            let head = format!(
                "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            let _ = stream.write_all(head.as_bytes()).await;
            let _ = stream.write_all(body.as_bytes()).await;
            let _ = stream.shutdown().await;
        }
        Reply::Hang => {
            // Hold the connection open until the client goes away.
            let mut sink = [0u8; 256];
            while matches!(stream.read(&mut sink).await, Ok(n) if n > 0) {}
            let _ = hangups.send(target);
        }
    }
}

async fn read_request(stream: &mut TcpStream) -> Option<Recorded> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    let head_end = loop {
        if let Some(pos) = find(&buf, b"\r\n\r\n") {
            break pos;
        }
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).into_owned();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_owned();
    let target = request_line.next()?.to_owned();
    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(n, v)| (n.trim().to_owned(), v.trim().to_owned()))
        .collect();

    let content_length = headers
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);

    let mut body = buf[head_end + 4..].to_vec();
    while body.len() < content_length {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }

    Some(Recorded {
        method,
        target,
        headers,
        body,
    })
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}
