//! External Service Adapters
//!
//! HTTP implementations of the outward-facing ports:
//!
//! - [`storage::BucketStorage`] for `ObjectStorage`, against a
//!   Supabase-compatible storage API
//! - [`mail::HttpMailer`] for `Mailer`, against a Resend-compatible
//!   email API; [`mail::NoopMailer`] when no provider is configured
//! - [`render::RenderServiceClient`] for `DocumentRenderer`, against the
//!   PDF template service

pub mod error;
pub mod mail;
pub mod render;
pub mod storage;

pub use mail::{HttpMailer, NoopMailer};
pub use render::{DisabledRenderer, RenderServiceClient};
pub use storage::BucketStorage;
