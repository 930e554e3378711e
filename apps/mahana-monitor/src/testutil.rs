use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use url::Url;

/// Loopback stand-in for the ingest endpoint. Answers every request with the
/// given status line and hands the request bodies back to the test.
pub struct StubIngest {
    addr: SocketAddr,
    pub bodies: mpsc::UnboundedReceiver<String>,
}

impl StubIngest {
    pub fn url(&self, path: &str) -> Url {
        Url::parse(&format!("http://{}{path}", self.addr)).expect("stub url")
    }
}

pub async fn spawn_stub_ingest(status_line: &'static str) -> StubIngest {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind stub");
    let addr = listener.local_addr().expect("stub addr");
    let (tx, bodies) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            let tx = tx.clone();
            tokio::spawn(async move {
                let mut raw = Vec::new();
                let mut chunk = [0u8; 4096];
                loop {
                    let Ok(n) = socket.read(&mut chunk).await else {
                        return;
                    };
                    if n == 0 {
                        return;
                    }
                    raw.extend_from_slice(&chunk[..n]);
                    if let Some(body) = extract_body(&raw) {
                        let _ = tx.send(body);
                        let response = format!(
                            "HTTP/1.1 {status_line}\r\ncontent-length: 2\r\nconnection: close\r\n\r\nOK"
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                        return;
                    }
                }
            });
        }
    });

    StubIngest { addr, bodies }
}

fn extract_body(raw: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(raw);
    let header_end = text.find("\r\n\r\n")?;
    let content_length = text[..header_end].lines().find_map(|line| {
        let (name, value) = line.split_once(':')?;
        if !name.trim().eq_ignore_ascii_case("content-length") {
            return None;
        }
        value.trim().parse::<usize>().ok()
    })?;
    let body = &raw[header_end + 4..];
    if body.len() < content_length {
        return None;
    }
    Some(String::from_utf8_lossy(&body[..content_length]).to_string())
}
