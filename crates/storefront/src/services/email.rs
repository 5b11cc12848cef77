//! Transactional email via the Resend HTTP API.
//!
//! Bodies are rendered from askama HTML templates (auto-escaped) and posted
//! to `POST https://api.resend.com/emails` with bearer auth.

use askama::Template;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument};

use joy_junction_core::Email;

use crate::config::EmailConfig;

/// Resend send-email endpoint.
const RESEND_API_URL: &str = "https://api.resend.com/emails";

#[derive(Template)]
#[template(path = "email/newsletter_welcome.html")]
struct NewsletterWelcomeHtml<'a> {
    email: &'a str,
    shop_url: &'a str,
}

#[derive(Template)]
#[template(path = "email/newsletter_notification.html")]
struct NewsletterNotificationHtml<'a> {
    email: &'a str,
}

#[derive(Template)]
#[template(path = "email/contact_notification.html")]
struct ContactNotificationHtml<'a> {
    name: &'a str,
    email: &'a str,
    phone: Option<&'a str>,
    subject: &'a str,
    message: &'a str,
}

#[derive(Template)]
#[template(path = "email/contact_confirmation.html")]
struct ContactConfirmationHtml<'a> {
    name: &'a str,
    message: &'a str,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// HTTP request to the provider failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider rejected the message.
    #[error("Provider error: {status} - {message}")]
    Provider { status: u16, message: String },

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// A single outgoing message.
#[derive(Debug, Clone, Serialize)]
pub struct EmailMessage {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
}

/// Provider error body (`{"name": "...", "message": "..."}`).
#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    #[serde(default)]
    name: Option<String>,
    message: String,
}

/// A submitted contact form, already validated.
#[derive(Debug, Clone, Copy)]
pub struct ContactDetails<'a> {
    pub name: &'a str,
    pub email: &'a Email,
    pub phone: Option<&'a str>,
    pub subject: &'a str,
    pub message: &'a str,
}

/// Email service for newsletter and contact form mail.
#[derive(Clone)]
pub struct EmailService {
    client: reqwest::Client,
    api_key: SecretString,
    from_address: String,
    store_inbox: Email,
    shop_url: String,
    endpoint: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    #[must_use]
    pub fn new(config: &EmailConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: config.api_key.clone(),
            from_address: config.from_address.clone(),
            store_inbox: config.store_inbox.clone(),
            shop_url: config.shop_url.clone(),
            endpoint: RESEND_API_URL.to_string(),
        }
    }

    /// Send a message.
    ///
    /// # Errors
    ///
    /// Returns `EmailError::Provider` if Resend rejects the message and
    /// `EmailError::Http` if the request fails.
    #[instrument(skip(self, message), fields(subject = %message.subject))]
    pub async fn send(&self, message: &EmailMessage) -> Result<(), EmailError> {
        let response = self.build_request(message).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ProviderErrorBody>(&body).map_or_else(
                |_| body.chars().take(200).collect(),
                |err| match err.name {
                    Some(name) => format!("{name}: {}", err.message),
                    None => err.message,
                },
            );
            return Err(EmailError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        info!(recipients = message.to.len(), "Email sent successfully");
        Ok(())
    }

    fn build_request(&self, message: &EmailMessage) -> reqwest::RequestBuilder {
        self.client
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose_secret())
            .json(message)
    }

    fn message(&self, to: &Email, subject: &str, html: String) -> EmailMessage {
        EmailMessage {
            from: self.from_address.clone(),
            to: vec![to.as_str().to_string()],
            subject: subject.to_string(),
            html,
            reply_to: None,
        }
    }

    /// Welcome a new newsletter subscriber.
    ///
    /// # Errors
    ///
    /// Returns error if the template fails to render or the send fails.
    pub async fn send_newsletter_welcome(&self, subscriber: &Email) -> Result<(), EmailError> {
        let html = self.render_newsletter_welcome(subscriber)?;
        self.send(&self.message(subscriber, "Welcome to The Joy Junction!", html))
            .await
    }

    fn render_newsletter_welcome(&self, subscriber: &Email) -> Result<String, askama::Error> {
        NewsletterWelcomeHtml {
            email: subscriber.as_str(),
            shop_url: &self.shop_url,
        }
        .render()
    }

    /// Tell the store inbox about a new subscriber.
    ///
    /// # Errors
    ///
    /// Returns error if the template fails to render or the send fails.
    pub async fn send_newsletter_notification(&self, subscriber: &Email) -> Result<(), EmailError> {
        let html = NewsletterNotificationHtml {
            email: subscriber.as_str(),
        }
        .render()?;
        self.send(&self.message(&self.store_inbox, "New newsletter subscriber", html))
            .await
    }

    /// Forward a contact form submission to the store inbox.
    ///
    /// Replies go straight to the customer.
    ///
    /// # Errors
    ///
    /// Returns error if the template fails to render or the send fails.
    pub async fn send_contact_notification(
        &self,
        contact: ContactDetails<'_>,
    ) -> Result<(), EmailError> {
        let html = render_contact_notification(contact)?;
        let mut message = self.message(
            &self.store_inbox,
            &format!("Contact form: {}", contact.subject),
            html,
        );
        message.reply_to = Some(contact.email.as_str().to_string());
        self.send(&message).await
    }

    /// Confirm receipt to the customer.
    ///
    /// # Errors
    ///
    /// Returns error if the template fails to render or the send fails.
    pub async fn send_contact_confirmation(
        &self,
        contact: ContactDetails<'_>,
    ) -> Result<(), EmailError> {
        let html = ContactConfirmationHtml {
            name: contact.name,
            message: contact.message,
        }
        .render()?;
        self.send(&self.message(contact.email, "We received your message", html))
            .await
    }
}

fn render_contact_notification(contact: ContactDetails<'_>) -> Result<String, askama::Error> {
    ContactNotificationHtml {
        name: contact.name,
        email: contact.email.as_str(),
        phone: contact.phone,
        subject: contact.subject,
        message: contact.message,
    }
    .render()
}
