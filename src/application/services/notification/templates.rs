//! Email templates.
//!
//! Each template produces both an HTML and a plain-text body. Every piece of
//! user-supplied text goes through [`escape_html`] before it reaches the HTML.

use chrono::{DateTime, Utc};

use crate::domain::{Opportunity, UserProfile, UserRole};
use crate::infrastructure::email::EmailMessage;

/// Escape text for safe interpolation into HTML.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn format_time(at: DateTime<Utc>) -> String {
    at.format("%A, %B %-d %Y at %H:%M UTC").to_string()
}

/// Wrap paragraphs in the shared layout.
fn layout(heading: &str, paragraphs: &[String], link: Option<(&str, &str)>) -> String {
    let mut body = format!(
        "<!DOCTYPE html><html><body style=\"font-family:sans-serif;color:#222\"><h2>{}</h2>",
        heading
    );
    for p in paragraphs {
        body.push_str("<p>");
        body.push_str(p);
        body.push_str("</p>");
    }
    if let Some((href, label)) = link {
        body.push_str(&format!(
            "<p><a href=\"{}\" style=\"color:#2563eb\">{}</a></p>",
            escape_html(href),
            label
        ));
    }
    body.push_str("<p style=\"color:#888;font-size:12px\">Volunteer Match</p></body></html>");
    body
}

pub struct Templates<'a> {
    pub app_url: &'a str,
}

impl<'a> Templates<'a> {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.app_url.trim_end_matches('/'), path)
    }

    pub fn welcome(&self, user: &UserProfile) -> EmailMessage {
        let name = user.name_or_email();
        let (intro, path) = match user.role {
            Some(UserRole::Volunteer) => (
                "Browse open opportunities near you and apply in a couple of clicks.",
                "/dashboard/volunteer",
            ),
            Some(UserRole::Organization) => (
                "Post your first opportunity and start receiving applications from volunteers.",
                "/dashboard/organization",
            ),
            None => (
                "Finish setting up your profile to start volunteering or posting opportunities.",
                "/onboarding/role",
            ),
        };
        let link = self.url(path);

        EmailMessage {
            to: user.email.clone(),
            subject: "Welcome to Volunteer Match".into(),
            html: layout(
                &format!("Welcome, {}!", escape_html(name)),
                &[intro.to_string()],
                Some((link.as_str(), "Get started")),
            ),
            text: format!("Welcome, {}!\n\n{}\n\n{}", name, intro, link),
        }
    }

    pub fn application_received(
        &self,
        volunteer: &UserProfile,
        opportunity: &Opportunity,
    ) -> EmailMessage {
        let when = format_time(opportunity.start_time);
        let link = self.url("/dashboard/volunteer");

        EmailMessage {
            to: volunteer.email.clone(),
            subject: format!("Application received: {}", opportunity.title),
            html: layout(
                "We received your application",
                &[
                    format!(
                        "Thanks for applying to <strong>{}</strong> on {}.",
                        escape_html(&opportunity.title),
                        when
                    ),
                    "The organization will review it and you will hear from us once they decide."
                        .into(),
                ],
                Some((link.as_str(), "View your applications")),
            ),
            text: format!(
                "Thanks for applying to {} on {}.\nThe organization will review it and you will hear from us once they decide.\n\n{}",
                opportunity.title, when, link
            ),
        }
    }

    pub fn new_application(
        &self,
        organization: &UserProfile,
        volunteer: &UserProfile,
        opportunity: &Opportunity,
        message: Option<&str>,
    ) -> EmailMessage {
        let volunteer_name = volunteer.name_or_email();
        let link = self.url("/dashboard/organization");

        let mut paragraphs = vec![format!(
            "<strong>{}</strong> applied to <strong>{}</strong>.",
            escape_html(volunteer_name),
            escape_html(&opportunity.title)
        )];
        if let Some(message) = message {
            paragraphs.push(format!("<em>\"{}\"</em>", escape_html(message)));
        }
        paragraphs.push(format!(
            "{} of {} seats are now taken.",
            opportunity.filled_seats, opportunity.total_seats
        ));

        EmailMessage {
            to: organization.email.clone(),
            subject: format!("New application for {}", opportunity.title),
            html: layout("New application", &paragraphs, Some((link.as_str(), "Review applications"))),
            text: format!(
                "{} applied to {}.\n{}{} of {} seats are now taken.\n\n{}",
                volunteer_name,
                opportunity.title,
                message.map(|m| format!("\"{}\"\n", m)).unwrap_or_default(),
                opportunity.filled_seats,
                opportunity.total_seats,
                link
            ),
        }
    }

    pub fn application_accepted(
        &self,
        volunteer: &UserProfile,
        opportunity: &Opportunity,
    ) -> EmailMessage {
        let when = format_time(opportunity.start_time);

        EmailMessage {
            to: volunteer.email.clone(),
            subject: format!("You're in: {}", opportunity.title),
            html: layout(
                "Your application was accepted",
                &[
                    format!(
                        "You have been accepted for <strong>{}</strong>.",
                        escape_html(&opportunity.title)
                    ),
                    format!("When: {}", when),
                    format!("Where: {}", escape_html(&opportunity.location)),
                ],
                Some((self.url("/dashboard/volunteer").as_str(), "See details")),
            ),
            text: format!(
                "You have been accepted for {}.\nWhen: {}\nWhere: {}",
                opportunity.title, when, opportunity.location
            ),
        }
    }

    pub fn application_rejected(
        &self,
        volunteer: &UserProfile,
        opportunity: &Opportunity,
    ) -> EmailMessage {
        EmailMessage {
            to: volunteer.email.clone(),
            subject: format!("Update on your application: {}", opportunity.title),
            html: layout(
                "Application update",
                &[
                    format!(
                        "Unfortunately your application for <strong>{}</strong> was not accepted this time.",
                        escape_html(&opportunity.title)
                    ),
                    "There are plenty of other opportunities waiting for you.".into(),
                ],
                Some((self.url("/opportunities").as_str(), "Browse opportunities")),
            ),
            text: format!(
                "Unfortunately your application for {} was not accepted this time.\nThere are plenty of other opportunities waiting for you.",
                opportunity.title
            ),
        }
    }

    pub fn application_withdrawn(
        &self,
        organization: &UserProfile,
        volunteer: &UserProfile,
        opportunity: &Opportunity,
    ) -> EmailMessage {
        let volunteer_name = volunteer.name_or_email();

        EmailMessage {
            to: organization.email.clone(),
            subject: format!("Application withdrawn: {}", opportunity.title),
            html: layout(
                "An application was withdrawn",
                &[
                    format!(
                        "<strong>{}</strong> withdrew from <strong>{}</strong>.",
                        escape_html(volunteer_name),
                        escape_html(&opportunity.title)
                    ),
                    format!("{} seats are open again.", opportunity.remaining_seats()),
                ],
                Some((self.url("/dashboard/organization").as_str(), "Open dashboard")),
            ),
            text: format!(
                "{} withdrew from {}.\n{} seats are open again.",
                volunteer_name,
                opportunity.title,
                opportunity.remaining_seats()
            ),
        }
    }
}
