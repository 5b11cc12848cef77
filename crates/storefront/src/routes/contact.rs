//! Contact form route handler.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use joy_junction_core::Email;

use crate::error::{AppError, Result};
use crate::services::email::ContactDetails;
use crate::state::AppState;

use super::{ApiResponse, body_error, data};

const MAX_NAME_CHARS: usize = 100;
const MAX_PHONE_CHARS: usize = 30;
const MESSAGE_CHARS: std::ops::RangeInclusive<usize> = 10..=5000;
const DEFAULT_SUBJECT: &str = "General Inquiry";

/// Contact form submission.
#[derive(Debug, Default, Deserialize)]
pub struct ContactRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub phone: Option<String>,
    pub subject: Option<String>,
    #[serde(default)]
    pub message: String,
}

/// A submission that passed validation, trimmed.
#[derive(Debug)]
struct ValidContact {
    name: String,
    email: Email,
    phone: Option<String>,
    subject: String,
    message: String,
}

impl ValidContact {
    fn details(&self) -> ContactDetails<'_> {
        ContactDetails {
            name: &self.name,
            email: &self.email,
            phone: self.phone.as_deref(),
            subject: &self.subject,
            message: &self.message,
        }
    }
}

impl ContactRequest {
    /// Check every field, collecting all problems rather than stopping at
    /// the first.
    fn validate(self) -> std::result::Result<ValidContact, Vec<String>> {
        let mut details = Vec::new();

        let name = self.name.trim().to_string();
        if name.is_empty() {
            details.push("name: name is required".to_string());
        } else if name.chars().count() > MAX_NAME_CHARS {
            details.push(format!("name: must be at most {MAX_NAME_CHARS} characters"));
        }

        let email = Email::normalize(&self.email)
            .map_err(|e| details.push(format!("email: {e}")))
            .ok();

        let phone = self
            .phone
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());
        if phone
            .as_ref()
            .is_some_and(|p| p.chars().count() > MAX_PHONE_CHARS)
        {
            details.push(format!("phone: must be at most {MAX_PHONE_CHARS} characters"));
        }

        let message = self.message.trim().to_string();
        if !MESSAGE_CHARS.contains(&message.chars().count()) {
            details.push(format!(
                "message: must be between {} and {} characters",
                MESSAGE_CHARS.start(),
                MESSAGE_CHARS.end()
            ));
        }

        let subject = self
            .subject
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_SUBJECT.to_string());

        match email {
            Some(email) if details.is_empty() => Ok(ValidContact {
                name,
                email,
                phone,
                subject,
                message,
            }),
            _ => Err(details),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactResponse {
    pub sent: bool,
    pub confirmation_sent: bool,
}

/// Forward a contact form to the store inbox and confirm receipt to the
/// customer.
///
/// The confirmation is best-effort: once the inbox has the message the
/// submission counts as sent.
#[instrument(skip_all)]
pub async fn submit(
    State(state): State<AppState>,
    body: std::result::Result<Json<ContactRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<ContactResponse>>> {
    let Json(request) = body.map_err(|e| body_error(&e))?;
    let contact = request.validate().map_err(AppError::Validation)?;

    let mailer = state.email().ok_or_else(|| {
        AppError::ServiceUnavailable("Email service is not configured".to_string())
    })?;

    mailer.send_contact_notification(contact.details()).await?;

    let confirmation_sent = match mailer.send_contact_confirmation(contact.details()).await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "Failed to send contact confirmation");
            false
        }
    };

    info!(
        email = %contact.email,
        subject = %contact.subject,
        confirmation_sent,
        "Contact form submitted"
    );
    Ok(data(ContactResponse {
        sent: true,
        confirmation_sent,
    }))
}
