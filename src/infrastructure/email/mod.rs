//! Outbound Email
//!
//! The `Mailer` trait is the seam between notification logic and delivery.
//!
//! - `HttpMailer` posts JSON to a transactional email API
//! - `OutboxMailer` logs messages and keeps them in memory (local runs, tests)

mod http_mailer;
mod outbox;

pub use http_mailer::HttpMailer;
pub use outbox::OutboxMailer;

use async_trait::async_trait;
use serde::Serialize;

/// A rendered email ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// Delivery failure.
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("email transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("email provider rejected message with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Email delivery.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError>;
}
