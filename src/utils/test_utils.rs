use std::sync::{Arc, Once};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub request_line: String,
    pub headers: Vec<(String, String)>,
    pub body: serde_json::Value,
}

impl CapturedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(header, _)| header.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct CannedResponse {
    status: u16,
    content_type: &'static str,
    body: String,
    /// Keep the connection open after writing `body` instead of closing it.
    stall: bool,
}

impl CannedResponse {
    pub fn sse(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            content_type: "text/event-stream",
            body: body.into(),
            stall: false,
        }
    }

    /// An event stream that sends `body` and then never finishes.
    pub fn stalled_sse(body: impl Into<String>) -> Self {
        Self {
            stall: true,
            ..Self::sse(body)
        }
    }

    pub fn json(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: body.into(),
            stall: false,
        }
    }

    fn head(&self) -> String {
        let reason = if (200..300).contains(&self.status) {
            "OK"
        } else {
            "Error"
        };
        if self.stall {
            // No content-length: the body runs until the connection closes.
            format!(
                "HTTP/1.1 {} {}\r\ncontent-type: {}\r\nconnection: close\r\n\r\n",
                self.status, reason, self.content_type
            )
        } else {
            format!(
                "HTTP/1.1 {} {}\r\ncontent-type: {}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n",
                self.status,
                reason,
                self.content_type,
                self.body.len()
            )
        }
    }
}

pub struct MockServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
}

impl MockServer {
    pub async fn requests(&self) -> Vec<CapturedRequest> {
        self.requests.lock().await.clone()
    }
}

static CLEAR_PROXY_ENV: Once = Once::new();

fn clear_proxy_env() {
    CLEAR_PROXY_ENV.call_once(|| {
        for key in [
            "HTTP_PROXY",
            "http_proxy",
            "HTTPS_PROXY",
            "https_proxy",
            "ALL_PROXY",
            "all_proxy",
        ] {
            std::env::remove_var(key);
        }
        std::env::set_var("NO_PROXY", "*");
        std::env::set_var("no_proxy", "*");
    });
}

/// Serves `responses` in order, one per connection, then stops accepting.
/// Connections beyond the canned list are refused.
pub async fn spawn_mock_server(responses: Vec<CannedResponse>) -> MockServer {
    clear_proxy_env();

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("listener should bind");
    let addr = listener.local_addr().expect("local addr should resolve");
    let requests: Arc<Mutex<Vec<CapturedRequest>>> = Arc::new(Mutex::new(Vec::new()));
    let captured = Arc::clone(&requests);

    tokio::spawn(async move {
        for response in responses {
            let (mut stream, _) = listener.accept().await.map_err(|err| err.to_string())?;
            let (request_line, headers, body) = read_http_request(&mut stream).await?;
            let body = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
            captured.lock().await.push(CapturedRequest {
                request_line,
                headers,
                body,
            });

            stream
                .write_all(response.head().as_bytes())
                .await
                .map_err(|err| err.to_string())?;
            stream
                .write_all(response.body.as_bytes())
                .await
                .map_err(|err| err.to_string())?;
            stream.flush().await.map_err(|err| err.to_string())?;

            if response.stall {
                tokio::spawn(async move {
                    let _held = stream;
                    std::future::pending::<()>().await;
                });
            } else {
                let _ = stream.shutdown().await;
            }
        }
        Ok::<(), String>(())
    });

    MockServer {
        base_url: format!("http://{addr}"),
        requests,
    }
}

async fn read_http_request(
    stream: &mut TcpStream,
) -> Result<(String, Vec<(String, String)>, Vec<u8>), String> {
    let mut buffer = Vec::new();
    let mut header_end = None;
    while header_end.is_none() {
        let mut chunk = [0_u8; 1024];
        let read = stream
            .read(&mut chunk)
            .await
            .map_err(|err| err.to_string())?;
        if read == 0 {
            return Err("Unexpected EOF while reading HTTP headers".to_string());
        }
        buffer.extend_from_slice(&chunk[..read]);
        header_end = buffer
            .windows(4)
            .position(|window| window == b"\r\n\r\n")
            .map(|index| index + 4);
    }

    let header_end = header_end.expect("header end should exist");
    let header_text =
        std::str::from_utf8(&buffer[..header_end]).map_err(|err| err.to_string())?;
    let mut lines = header_text.split("\r\n").filter(|line| !line.is_empty());
    let request_line = lines
        .next()
        .ok_or_else(|| "Missing HTTP request line".to_string())?
        .to_string();

    let mut headers = Vec::new();
    let mut content_length = 0_usize;
    for line in lines {
        let mut parts = line.splitn(2, ':');
        let Some(name) = parts.next() else {
            continue;
        };
        let value = parts.next().unwrap_or_default().trim().to_string();
        if name.eq_ignore_ascii_case("content-length") {
            content_length = value.parse::<usize>().map_err(|err| err.to_string())?;
        }
        headers.push((name.to_string(), value));
    }

    let mut body = buffer[header_end..].to_vec();
    while body.len() < content_length {
        let mut chunk = vec![0_u8; content_length.saturating_sub(body.len())];
        let read = stream
            .read(&mut chunk)
            .await
            .map_err(|err| err.to_string())?;
        if read == 0 {
            return Err("Unexpected EOF while reading HTTP body".to_string());
        }
        body.extend_from_slice(&chunk[..read]);
    }
    body.truncate(content_length);

    Ok((request_line, headers, body))
}
