use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use crate::errors::{AppError, Result};

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()>;
}

/// Delivers mail through an HTTP gateway accepting `{from, to, subject, text}`.
#[derive(Clone)]
pub struct HttpMailer {
    api_url: String,
    api_key: String,
    from: String,
    client: Client,
}

impl HttpMailer {
    /// `timeout` bounds the whole request; callers may hold a write transaction meanwhile.
    pub fn new(api_url: String, api_key: String, from: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            api_url,
            api_key,
            from,
            client,
        })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .header("Accept", "application/json")
            .json(&json!({
                "from": self.from,
                "to": [to],
                "subject": subject,
                "text": body,
            }))
            .send()
            .await?;

        if response.status().is_success() {
            tracing::info!("Mail '{}' delivered to {}", subject, to);
            Ok(())
        } else {
            Err(AppError::mail(format!(
                "Mail sending failed with status: {}",
                response.status()
            )))
        }
    }
}

/// Used when no gateway is configured: the message only goes to the log.
#[derive(Clone)]
pub struct LogMailer {
    from: String,
}

impl LogMailer {
    pub fn new(from: String) -> Self {
        Self { from }
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        tracing::info!(from = %self.from, to = %to, subject = %subject, "{}", body);
        Ok(())
    }
}

#[cfg(test)]
pub mod testing {
    use std::sync::Mutex;

    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct SentMail {
        pub to: String,
        pub subject: String,
        pub body: String,
    }

    #[derive(Default)]
    pub struct RecordingMailer {
        pub sent: Mutex<Vec<SentMail>>,
    }

    impl RecordingMailer {
        pub fn last(&self) -> Option<SentMail> {
            self.sent.lock().unwrap().last().cloned()
        }

        pub fn count(&self) -> usize {
            self.sent.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
            self.sent.lock().unwrap().push(SentMail {
                to: to.to_string(),
                subject: subject.to_string(),
                body: body.to_string(),
            });
            Ok(())
        }
    }

    pub struct FailingMailer;

    #[async_trait]
    impl Mailer for FailingMailer {
        async fn send(&self, _to: &str, _subject: &str, _body: &str) -> Result<()> {
            Err(AppError::mail("smtp relay refused the message"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn hung_gateway_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        // Accept and never answer.
        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
            drop(socket);
        });

        let mailer = HttpMailer::new(
            format!("http://{}/send", addr),
            "key".to_string(),
            "noreply@example.com".to_string(),
            Duration::from_millis(200),
        )
        .unwrap();

        let started = std::time::Instant::now();
        let result = mailer.send("user@example.com", "Subject", "Body").await;

        assert!(matches!(result, Err(AppError::Mail(_))));
        assert!(started.elapsed() < Duration::from_secs(5));
        server.abort();
    }
}
