//! The Joy Junction Core - Shared types library.
//!
//! This crate provides common types used across all Joy Junction components:
//! - `storefront` - Content, newsletter, search and revalidation service
//! - `cli` - Command-line tools for migrations and seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure text utilities - no I/O, no
//! database access, no HTTP clients. This keeps it lightweight and allows it to
//! be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, slugs, ratings and emails
//! - [`description`] - Product description sectioning

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod description;
pub mod types;

pub use description::ProductDescription;
pub use types::*;
