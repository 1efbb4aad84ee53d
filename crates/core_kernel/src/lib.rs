//! Core Kernel - Foundational types and utilities for the claims platform
//!
//! This crate provides the fundamental building blocks used across all domain modules:
//! - Strongly-typed identifiers for domain entities
//! - The public tracking code value object
//! - Common error types and the ports-and-adapters base

pub mod error;
pub mod identifiers;
pub mod ports;
pub mod tracking;

pub use error::CoreError;
pub use identifiers::{ClaimId, IntentId, UserId};
pub use ports::{DomainPort, PortError};
pub use tracking::TrackingCode;
