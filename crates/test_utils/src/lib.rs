//! Test Utilities
//!
//! Builders and fixtures shared by the integration tests across crates.
//! The in-memory port adapters live in `domain_claims::testing`; this
//! crate only builds domain data.

pub mod builders;
pub mod fixtures;

pub use builders::{IntakeRequestBuilder, UserBuilder};
