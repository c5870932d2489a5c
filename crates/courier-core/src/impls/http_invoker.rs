//! HttpInvoker - reqwest による外部アクション
//!
//! # 送信内容
//! - 1 attempt につき 1 回、設定されたエンドポイントへ POST
//! - テンプレート中の `{target}` はパーセントエンコードした target id に置換
//! - body はフォーム（合成済みメッセージと credential）

use std::time::Duration;

use async_trait::async_trait;
use tracing::trace;

use crate::domain::AttemptOutcome;
use crate::domain::outcome::{DETAIL_LIMIT, truncate};
use crate::ports::{ActionInvoker, Invocation};

/// Placeholder replaced by the target id.
pub const TARGET_PLACEHOLDER: &str = "{target}";

#[derive(Debug, Clone)]
pub struct HttpInvokerConfig {
    /// e.g. `https://api.example.com/v1/threads/{target}/messages`
    pub endpoint_template: String,

    /// Form field that carries the credential.
    pub credential_param: String,

    /// Form field that carries the composed message.
    pub message_param: String,

    pub request_timeout: Duration,
}

impl HttpInvokerConfig {
    pub fn new(endpoint_template: impl Into<String>) -> Self {
        Self {
            endpoint_template: endpoint_template.into(),
            credential_param: "access_token".to_string(),
            message_param: "message".to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum HttpInvokerError {
    #[error("endpoint template '{0}' must contain {{target}}")]
    MissingPlaceholder(String),

    #[error("endpoint template '{template}' is not a valid URL: {reason}")]
    InvalidUrl { template: String, reason: String },

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

pub struct HttpInvoker {
    client: reqwest::Client,
    config: HttpInvokerConfig,
}

impl HttpInvoker {
    pub fn new(config: HttpInvokerConfig) -> Result<Self, HttpInvokerError> {
        if !config.endpoint_template.contains(TARGET_PLACEHOLDER) {
            return Err(HttpInvokerError::MissingPlaceholder(
                config.endpoint_template.clone(),
            ));
        }
        let probe = config.endpoint_template.replace(TARGET_PLACEHOLDER, "probe");
        if let Err(e) = reqwest::Url::parse(&probe) {
            return Err(HttpInvokerError::InvalidUrl {
                template: config.endpoint_template.clone(),
                reason: e.to_string(),
            });
        }

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("courier/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn endpoint_for(&self, target: &str) -> String {
        self.config
            .endpoint_template
            .replace(TARGET_PLACEHOLDER, &urlencoding::encode(target))
    }
}

#[async_trait]
impl ActionInvoker for HttpInvoker {
    async fn invoke(&self, call: Invocation<'_>) -> AttemptOutcome {
        let url = self.endpoint_for(call.target);
        trace!(%url, "posting message");

        let form = [
            (self.config.credential_param.as_str(), call.credential),
            (self.config.message_param.as_str(), call.message),
        ];

        let response = match self.client.post(&url).form(&form).send().await {
            Ok(response) => response,
            Err(e) => return AttemptOutcome::failure(None, e.to_string()),
        };

        let status = response.status();
        if status.is_success() {
            return AttemptOutcome::success(Some(status.as_u16()));
        }

        let body = response.text().await.unwrap_or_default();
        AttemptOutcome::failure(Some(status.as_u16()), truncate(&body, DETAIL_LIMIT))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OutcomeKind;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Accept one connection, capture the raw request, answer with `status`.
    async fn one_shot_server(status: &'static str, body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let join = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
                let text = String::from_utf8_lossy(&buf).to_string();
                if let Some(header_end) = text.find("\r\n\r\n") {
                    let content_length = text[..header_end]
                        .lines()
                        .find_map(|l| {
                            let (k, v) = l.split_once(':')?;
                            k.eq_ignore_ascii_case("content-length")
                                .then(|| v.trim().parse::<usize>().ok())?
                        })
                        .unwrap_or(0);
                    if buf.len() >= header_end + 4 + content_length {
                        break;
                    }
                }
            }
            let response = format!(
                "HTTP/1.1 {status}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            String::from_utf8_lossy(&buf).to_string()
        });
        (format!("http://{addr}/threads/{TARGET_PLACEHOLDER}/messages"), join)
    }

    fn call<'a>(target: &'a str, message: &'a str) -> Invocation<'a> {
        Invocation {
            target,
            credential: "secret-token",
            message,
        }
    }

    #[test]
    fn template_without_placeholder_is_rejected() {
        let err = HttpInvoker::new(HttpInvokerConfig::new("https://example.com/send")).err();
        assert!(matches!(err, Some(HttpInvokerError::MissingPlaceholder(_))));
    }

    #[test]
    fn template_that_is_not_a_url_is_rejected() {
        let err = HttpInvoker::new(HttpInvokerConfig::new("not a url {target}")).err();
        assert!(matches!(err, Some(HttpInvokerError::InvalidUrl { .. })));
    }

    #[test]
    fn target_is_percent_encoded() {
        let invoker =
            HttpInvoker::new(HttpInvokerConfig::new("https://example.com/t/{target}/")).unwrap();
        assert_eq!(
            invoker.endpoint_for("a b/c"),
            "https://example.com/t/a%20b%2Fc/"
        );
    }

    #[tokio::test]
    async fn success_status_is_success_outcome() {
        let (template, server) = one_shot_server("200 OK", "{\"id\":\"1\"}").await;
        let invoker = HttpInvoker::new(HttpInvokerConfig::new(template)).unwrap();

        let outcome = invoker.invoke(call("42", "Bot | hi there")).await;
        assert_eq!(outcome.kind, OutcomeKind::Success);
        assert_eq!(outcome.status_code, Some(200));

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /threads/42/messages"));
        assert!(request.contains("access_token=secret-token"));
        assert!(request.contains("message=Bot+%7C+hi+there"));
    }

    #[tokio::test]
    async fn non_success_status_is_failure_with_body() {
        let (template, server) = one_shot_server("401 Unauthorized", "invalid token").await;
        let invoker = HttpInvoker::new(HttpInvokerConfig::new(template)).unwrap();

        let outcome = invoker.invoke(call("42", "m")).await;
        assert_eq!(outcome.kind, OutcomeKind::Failure);
        assert_eq!(outcome.status_code, Some(401));
        assert_eq!(outcome.detail, "invalid token");
        server.await.unwrap();
    }

    #[tokio::test]
    async fn transport_error_is_failure_without_status() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let template = format!("http://{addr}/{TARGET_PLACEHOLDER}");
        let invoker = HttpInvoker::new(
            HttpInvokerConfig::new(template).with_timeout(Duration::from_secs(2)),
        )
        .unwrap();

        let outcome = invoker.invoke(call("42", "m")).await;
        assert_eq!(outcome.kind, OutcomeKind::Failure);
        assert_eq!(outcome.status_code, None);
        assert!(!outcome.detail.is_empty());
    }
}
