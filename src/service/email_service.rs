//! Outbound email through an HTTP relay.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::config::EmailConfig;
use crate::service::retry::{with_retry, RetryConfig, Retryable};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Email relay request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Email relay returned HTTP {status}: {body}")]
    Http { status: u16, body: String },
}

impl Retryable for EmailError {
    fn is_retryable(&self) -> bool {
        match self {
            EmailError::Network(err) => !err.is_builder(),
            EmailError::Http { status, .. } => *status >= 500,
        }
    }
}

#[derive(Debug, Serialize, PartialEq)]
pub struct OutgoingEmail<'a> {
    pub from: &'a str,
    pub to: &'a str,
    pub subject: &'a str,
    pub text: &'a str,
}

#[derive(Clone)]
pub struct EmailClient {
    endpoint: String,
    api_key: String,
    from: String,
    client: reqwest::Client,
    retry_config: RetryConfig,
}

impl EmailClient {
    pub fn new(config: &EmailConfig) -> Result<Self, EmailError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            endpoint: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            from: config.from.clone(),
            client,
            retry_config: RetryConfig::default(),
        })
    }

    pub fn with_retry_config(mut self, retry_config: RetryConfig) -> Self {
        self.retry_config = retry_config;
        self
    }

    pub fn message<'a>(&'a self, to: &'a str, subject: &'a str, text: &'a str) -> OutgoingEmail<'a> {
        OutgoingEmail {
            from: &self.from,
            to,
            subject,
            text,
        }
    }

    pub async fn send(&self, to: &str, subject: &str, text: &str) -> Result<(), EmailError> {
        let payload = &self.message(to, subject, text);

        with_retry(&self.retry_config, "email.send", move || async move {
            let response = self
                .client
                .post(&self.endpoint)
                .bearer_auth(&self.api_key)
                .json(payload)
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(EmailError::Http {
                    status: status.as_u16(),
                    body,
                });
            }
            Ok(())
        })
        .await?;

        info!(to = %to, subject = %subject, "Email sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> EmailConfig {
        EmailConfig {
            api_url: "https://relay.example.com/send/".to_string(),
            api_key: "key".to_string(),
            from: "academy@example.com".to_string(),
        }
    }

    #[test]
    fn test_message_payload() {
        let client = EmailClient::new(&config()).unwrap();
        assert_eq!(client.endpoint, "https://relay.example.com/send");

        let msg = client.message("parent@example.com", "Match day", "See you at 9");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["from"], "academy@example.com");
        assert_eq!(json["to"], "parent@example.com");
        assert_eq!(json["subject"], "Match day");
        assert_eq!(json["text"], "See you at 9");
    }

    #[test]
    fn test_only_server_errors_retry() {
        let server = EmailError::Http {
            status: 502,
            body: String::new(),
        };
        let client = EmailError::Http {
            status: 422,
            body: String::new(),
        };
        assert!(server.is_retryable());
        assert!(!client.is_retryable());
    }
}
