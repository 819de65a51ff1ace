use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// 127.0.0.1 rather than localhost to avoid IPv6 resolution issues
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8000";

pub const SERVER_ERROR_TEXT: &str = "Server error.";
pub const UNREACHABLE_TEXT: &str =
    "Cannot connect to server. Is the backend running? (Check console for network errors)";
pub const FALLBACK_ERROR_TEXT: &str = "Sorry, something went wrong.";

/// Failure classes for one chat exchange, each mapped to a transcript string
/// by [`ChatError::user_message`].
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("backend returned status {status}")]
    Server { status: u16, detail: Option<String> },

    #[error("backend unreachable: {0}")]
    Unreachable(reqwest::Error),

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
}

impl ChatError {
    /// Text shown in the transcript for this failure.
    pub fn user_message(&self) -> String {
        match self {
            ChatError::Server {
                detail: Some(detail),
                ..
            } => detail.clone(),
            ChatError::Server { .. } => SERVER_ERROR_TEXT.to_string(),
            ChatError::Unreachable(_) => UNREACHABLE_TEXT.to_string(),
            ChatError::Request(_) => FALLBACK_ERROR_TEXT.to_string(),
        }
    }
}

#[derive(Serialize)]
struct ChatRequest {
    message: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    answer: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<String>,
}

#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    base_url: String,
}

impl ChatClient {
    // No explicit timeout: transport defaults only
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.to_string(),
        }
    }

    pub async fn ask(&self, message: &str) -> Result<String, ChatError> {
        let url = format!("{}/chat", self.base_url);

        let request = ChatRequest {
            message: message.to_string(),
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(classify_send_error)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::Server {
                status,
                detail: parse_detail(&body),
            });
        }

        let chat_response: ChatResponse = response.json().await?;
        Ok(chat_response.answer)
    }
}

fn classify_send_error(err: reqwest::Error) -> ChatError {
    if err.is_connect() || err.is_timeout() {
        ChatError::Unreachable(err)
    } else {
        ChatError::Request(err)
    }
}

/// Pull a usable `detail` string out of an error body. Missing field,
/// non-string detail (FastAPI validation errors send an array), non-JSON
/// bodies, and empty strings all yield None.
fn parse_detail(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.detail)
        .filter(|d| !d.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn http_response(status_line: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status_line,
            body.len(),
            body
        )
    }

    fn header_end(buf: &[u8]) -> Option<usize> {
        buf.windows(4).position(|w| w == b"\r\n\r\n")
    }

    fn content_length(headers: &str) -> usize {
        headers
            .lines()
            .find_map(|line| {
                let lower = line.to_ascii_lowercase();
                let value = lower.strip_prefix("content-length:")?;
                value.trim().parse::<usize>().ok()
            })
            .unwrap_or(0)
    }

    /// Accept one connection, read the full request, write a canned response.
    async fn serve_once(response: String) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 8192];
            let mut total = 0;
            loop {
                let n = stream.read(&mut buf[total..]).await.unwrap_or(0);
                if n == 0 {
                    break;
                }
                total += n;
                if let Some(end) = header_end(&buf[..total]) {
                    let headers = String::from_utf8_lossy(&buf[..end]);
                    let body_len = total - (end + 4);
                    if body_len >= content_length(&headers) {
                        break;
                    }
                }
                if total == buf.len() {
                    break;
                }
            }
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
        });
        addr
    }

    #[tokio::test]
    async fn returns_answer_on_success() {
        let addr = serve_once(http_response("200 OK", r#"{"answer":"Hi there"}"#)).await;
        let client = ChatClient::new(&format!("http://{}", addr));

        let answer = client.ask("Hello").await.unwrap();
        assert_eq!(answer, "Hi there");
    }

    #[tokio::test]
    async fn surfaces_server_detail() {
        let addr = serve_once(http_response(
            "500 Internal Server Error",
            r#"{"detail":"Missing API key"}"#,
        ))
        .await;
        let client = ChatClient::new(&format!("http://{}", addr));

        let err = client.ask("test").await.unwrap_err();
        match &err {
            ChatError::Server { status, detail } => {
                assert_eq!(*status, 500);
                assert_eq!(detail.as_deref(), Some("Missing API key"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(err.user_message(), "Missing API key");
    }

    #[tokio::test]
    async fn generic_server_text_when_detail_missing() {
        let addr = serve_once(http_response(
            "500 Internal Server Error",
            r#"{"error":"boom"}"#,
        ))
        .await;
        let client = ChatClient::new(&format!("http://{}", addr));

        let err = client.ask("test").await.unwrap_err();
        assert!(matches!(err, ChatError::Server { detail: None, .. }));
        assert_eq!(err.user_message(), SERVER_ERROR_TEXT);
    }

    #[tokio::test]
    async fn generic_server_text_when_detail_not_a_string() {
        // FastAPI validation failures put an array in `detail`
        let addr = serve_once(http_response(
            "422 Unprocessable Entity",
            r#"{"detail":[{"loc":["body","message"],"msg":"field required"}]}"#,
        ))
        .await;
        let client = ChatClient::new(&format!("http://{}", addr));

        let err = client.ask("test").await.unwrap_err();
        assert!(matches!(err, ChatError::Server { detail: None, .. }));
        assert_eq!(err.user_message(), SERVER_ERROR_TEXT);
    }

    #[tokio::test]
    async fn generic_server_text_when_body_not_json() {
        let addr = serve_once(http_response("502 Bad Gateway", "upstream died")).await;
        let client = ChatClient::new(&format!("http://{}", addr));

        let err = client.ask("test").await.unwrap_err();
        assert!(matches!(err, ChatError::Server { detail: None, .. }));
        assert_eq!(err.user_message(), SERVER_ERROR_TEXT);
    }

    #[tokio::test]
    async fn empty_detail_falls_back_to_generic_text() {
        let addr = serve_once(http_response(
            "500 Internal Server Error",
            r#"{"detail":""}"#,
        ))
        .await;
        let client = ChatClient::new(&format!("http://{}", addr));

        let err = client.ask("test").await.unwrap_err();
        assert!(matches!(err, ChatError::Server { detail: None, .. }));
    }

    #[tokio::test]
    async fn unreachable_when_connection_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let client = ChatClient::new(&format!("http://{}", addr));

        let err = client.ask("test").await.unwrap_err();
        assert!(matches!(err, ChatError::Unreachable(_)));
        assert_eq!(err.user_message(), UNREACHABLE_TEXT);
    }

    #[tokio::test]
    async fn fallback_when_success_body_malformed() {
        let addr = serve_once(http_response("200 OK", "not json")).await;
        let client = ChatClient::new(&format!("http://{}", addr));

        let err = client.ask("test").await.unwrap_err();
        assert!(matches!(err, ChatError::Request(_)));
        assert_eq!(err.user_message(), FALLBACK_ERROR_TEXT);
    }

    #[test]
    fn user_messages_cover_all_classes() {
        let with_detail = ChatError::Server {
            status: 500,
            detail: Some("Configuration Error: GROQ Key missing.".to_string()),
        };
        assert_eq!(
            with_detail.user_message(),
            "Configuration Error: GROQ Key missing."
        );

        let without_detail = ChatError::Server {
            status: 503,
            detail: None,
        };
        assert_eq!(without_detail.user_message(), SERVER_ERROR_TEXT);

        let build_err = Client::new().post("not a url").build().unwrap_err();
        assert_eq!(
            ChatError::Request(build_err).user_message(),
            FALLBACK_ERROR_TEXT
        );
    }

    #[test]
    fn parse_detail_requires_non_empty_string() {
        assert_eq!(
            parse_detail(r#"{"detail":"Rate limit hit"}"#).as_deref(),
            Some("Rate limit hit")
        );
        assert_eq!(parse_detail(r#"{"detail":""}"#), None);
        assert_eq!(parse_detail(r#"{"detail":null}"#), None);
        assert_eq!(parse_detail(r#"{"answer":"hi"}"#), None);
        assert_eq!(parse_detail("<html>502</html>"), None);
    }
}
