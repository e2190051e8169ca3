//! Logging mailer with an in-memory outbox.

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::info;

use super::{EmailMessage, MailError, Mailer};

/// Records every message instead of delivering it.
#[derive(Default)]
pub struct OutboxMailer {
    sent: Mutex<Vec<EmailMessage>>,
}

impl OutboxMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of messages "sent" so far.
    pub fn messages(&self) -> Vec<EmailMessage> {
        self.sent.lock().clone()
    }

    /// Messages addressed to one recipient.
    pub fn messages_to(&self, to: &str) -> Vec<EmailMessage> {
        self.sent
            .lock()
            .iter()
            .filter(|m| m.to == to)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Mailer for OutboxMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        info!(to = %message.to, subject = %message.subject, "Email queued in outbox");
        self.sent.lock().push(message.clone());
        Ok(())
    }
}
