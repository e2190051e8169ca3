//! Notification Service
//!
//! Renders templates and hands them to the configured [`Mailer`]. Delivery
//! failures are logged and counted but never returned to the caller, so a
//! broken email provider cannot fail an application write.

mod templates;

pub use templates::{escape_html, Templates};

use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::{Opportunity, UserProfile};
use crate::infrastructure::email::{EmailMessage, Mailer};
use crate::infrastructure::metrics;

#[derive(Clone)]
pub struct NotificationService {
    mailer: Arc<dyn Mailer>,
    app_url: Arc<str>,
}

impl NotificationService {
    pub fn new(mailer: Arc<dyn Mailer>, app_url: impl Into<Arc<str>>) -> Self {
        Self {
            mailer,
            app_url: app_url.into(),
        }
    }

    fn templates(&self) -> Templates<'_> {
        Templates {
            app_url: &self.app_url,
        }
    }

    /// Send one message. Returns whether the provider accepted it.
    async fn deliver(&self, template: &'static str, message: EmailMessage) -> bool {
        match self.mailer.send(&message).await {
            Ok(()) => {
                info!(template, to = %message.to, "Email sent");
                metrics::record_email(template, true);
                true
            }
            Err(e) => {
                warn!(template, to = %message.to, error = %e, "Email delivery failed");
                metrics::record_email(template, false);
                false
            }
        }
    }

    pub async fn welcome(&self, user: &UserProfile) -> bool {
        self.deliver("welcome", self.templates().welcome(user)).await
    }

    pub async fn application_received(&self, volunteer: &UserProfile, opportunity: &Opportunity) -> bool {
        let message = self.templates().application_received(volunteer, opportunity);
        self.deliver("application_received", message).await
    }

    pub async fn new_application(
        &self,
        organization: &UserProfile,
        volunteer: &UserProfile,
        opportunity: &Opportunity,
        note: Option<&str>,
    ) -> bool {
        let message = self
            .templates()
            .new_application(organization, volunteer, opportunity, note);
        self.deliver("new_application", message).await
    }

    pub async fn application_accepted(&self, volunteer: &UserProfile, opportunity: &Opportunity) -> bool {
        let message = self.templates().application_accepted(volunteer, opportunity);
        self.deliver("application_accepted", message).await
    }

    pub async fn application_rejected(&self, volunteer: &UserProfile, opportunity: &Opportunity) -> bool {
        let message = self.templates().application_rejected(volunteer, opportunity);
        self.deliver("application_rejected", message).await
    }

    pub async fn application_withdrawn(
        &self,
        organization: &UserProfile,
        volunteer: &UserProfile,
        opportunity: &Opportunity,
    ) -> bool {
        let message = self
            .templates()
            .application_withdrawn(organization, volunteer, opportunity);
        self.deliver("application_withdrawn", message).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::email::{MailError, MockMailer};

    #[tokio::test]
    async fn test_delivery_failure_is_swallowed() {
        let mut mailer = MockMailer::new();
        mailer.expect_send().times(1).returning(|_| {
            Err(MailError::Rejected {
                status: 503,
                body: "unavailable".into(),
            })
        });

        let service = NotificationService::new(Arc::new(mailer), "http://localhost");
        let user = UserProfile::new("u", "u@example.com", None);

        assert!(!service.welcome(&user).await);
    }

    #[tokio::test]
    async fn test_delivery_success() {
        let mut mailer = MockMailer::new();
        mailer
            .expect_send()
            .withf(|m| m.to == "u@example.com" && m.subject.contains("Welcome"))
            .times(1)
            .returning(|_| Ok(()));

        let service = NotificationService::new(Arc::new(mailer), "http://localhost");
        let user = UserProfile::new("u", "u@example.com", None);

        assert!(service.welcome(&user).await);
    }
}
