//! Announcement bar offers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use joy_junction_core::OfferId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    pub id: OfferId,
    pub message: String,
    pub href: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOffer {
    pub id: OfferId,
    pub message: String,
    pub href: Option<String>,
    pub is_active: bool,
}
