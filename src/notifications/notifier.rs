use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifierError {
    #[error("notifier transport error: {0}")]
    Transport(String),

    #[error("notifier rejected message with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Outbound email transport.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), NotifierError>;
}

/// Writes messages to the log instead of delivering them.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), NotifierError> {
        let preview: String = html_body.chars().take(80).collect();
        tracing::info!(to, subject, preview = %preview, "email not delivered: no notifier configured");
        Ok(())
    }
}

#[derive(Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: &'a str,
}

/// JSON-over-HTTP email API client.
#[derive(Clone)]
pub struct HttpNotifier {
    client: Client,
    url: String,
    api_key: Option<String>,
    from: String,
}

impl HttpNotifier {
    pub fn new(
        url: impl Into<String>,
        api_key: Option<String>,
        from: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, NotifierError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| NotifierError::Transport(format!("failed to build HTTP client: {err}")))?;
        Ok(Self {
            client,
            url: url.into(),
            api_key,
            from: from.into(),
        })
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), NotifierError> {
        let mut request = self.client.post(&self.url).json(&SendEmailRequest {
            from: &self.from,
            to,
            subject,
            html: html_body,
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|err| NotifierError::Transport(err.to_string()))?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(to, subject, "email accepted by notifier");
            return Ok(());
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(NotifierError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    use super::*;

    #[tokio::test]
    async fn hanging_email_api_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // accepts and reads, never answers
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            loop {
                if socket.read(&mut buf).await.unwrap_or(0) == 0 {
                    break;
                }
            }
        });

        let notifier = HttpNotifier::new(
            format!("http://{addr}/emails"),
            Some("key".into()),
            "noreply@farmshare.local",
            Duration::from_millis(200),
        )
        .unwrap();

        let started = Instant::now();
        let err = notifier
            .send("ana@example.com", "Order confirmed", "<p>hi</p>")
            .await
            .unwrap_err();

        assert!(matches!(err, NotifierError::Transport(_)), "{err}");
        assert!(started.elapsed() < Duration::from_secs(5));
        server.abort();
    }

    #[tokio::test]
    async fn log_notifier_always_succeeds() {
        LogNotifier
            .send("ana@example.com", "Subject", "<p>body</p>")
            .await
            .unwrap();
    }
}
