//! Outbound integrations used by the route handlers.
//!
//! - `email` - Transactional email (newsletter, contact form) via Resend
//! - `revalidate` - Tag-based revalidation calls to the rendering layer

pub mod email;
pub mod revalidate;

pub use email::{EmailError, EmailService};
pub use revalidate::{RevalidateError, RevalidationClient};
