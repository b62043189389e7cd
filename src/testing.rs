//! Local stand-in for the chat webhook, used by tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use crate::session::SessionId;
use crate::webhook::WebhookClient;

/// Webhook client that ignores any proxy configured in the environment
pub fn direct_client(url: &str, session_id: SessionId) -> WebhookClient {
    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    WebhookClient::with_client(client, url, session_id)
}

/// Response returned for one request
#[derive(Debug, Clone)]
pub struct Canned {
    pub status: u16,
    pub body: String,
    pub delay: Duration,
}

impl Canned {
    pub fn ok(body: &str) -> Self {
        Self::status(200, body)
    }

    pub fn status(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

type Responder = Arc<dyn Fn(&str) -> Canned + Send + Sync>;

/// Minimal HTTP/1.1 server that records request bodies
pub struct TestWebhook {
    addr: std::net::SocketAddr,
    requests: Arc<Mutex<Vec<String>>>,
    shutdown: tokio::sync::oneshot::Sender<()>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestWebhook {
    /// Answer every request with the same response
    pub async fn start(canned: Canned) -> Self {
        Self::with_responder(move |_| canned.clone()).await
    }

    /// Pick the response from the request's JSON body
    pub async fn with_responder<F>(responder: F) -> Self
    where
        F: Fn(&str) -> Canned + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let responder: Responder = Arc::new(responder);
        let (shutdown_tx, mut shutdown_rx) = tokio::sync::oneshot::channel();

        let recorded = requests.clone();
        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    accept = listener.accept() => {
                        if let Ok((socket, _)) = accept {
                            tokio::spawn(serve(socket, responder.clone(), recorded.clone()));
                        }
                    }
                }
            }
        });

        Self {
            addr,
            requests,
            shutdown: shutdown_tx,
            handle,
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}/webhook/chatbot", self.addr)
    }

    /// Bodies received so far, in arrival order
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub async fn shutdown(self) {
        let _ = self.shutdown.send(());
        let _ = self.handle.await;
    }
}

async fn serve(mut socket: TcpStream, responder: Responder, requests: Arc<Mutex<Vec<String>>>) {
    let Some(body) = read_body(&mut socket).await else {
        return;
    };
    requests.lock().unwrap().push(body.clone());

    let canned = responder(&body);
    if !canned.delay.is_zero() {
        tokio::time::sleep(canned.delay).await;
    }

    let response = format!(
        "HTTP/1.1 {} Canned\r\n\
         Content-Type: text/plain\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\
         \r\n\
         {}",
        canned.status,
        canned.body.len(),
        canned.body
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}

async fn read_body(socket: &mut TcpStream) -> Option<String> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = find(&buf, b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let content_length = head
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.trim()
                .eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse::<usize>().ok())
                .flatten()
        })
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let end = (header_end + content_length).min(buf.len());
    Some(String::from_utf8_lossy(&buf[header_end..end]).to_string())
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}
