//! Transactional email API client.

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, instrument};

use super::{EmailMessage, MailError, Mailer};
use crate::config::EmailSettings;

#[derive(Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
    text: &'a str,
}

/// Posts `{from, to, subject, html, text}` to `api_url` with a bearer API key.
#[derive(Clone)]
pub struct HttpMailer {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    from: String,
}

impl HttpMailer {
    pub fn new(settings: &EmailSettings) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_url: settings.api_url.clone(),
            api_key: settings.api_key.clone(),
            from: settings.from.clone(),
        })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    #[instrument(skip(self, message), fields(to = %message.to, subject = %message.subject))]
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        let body = SendRequest {
            from: &self.from,
            to: [&message.to],
            subject: &message.subject,
            html: &message.html,
            text: &message.text,
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        debug!("Email accepted by provider");
        Ok(())
    }
}
