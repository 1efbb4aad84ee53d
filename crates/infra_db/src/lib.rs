//! PostgreSQL Infrastructure
//!
//! Database adapters implementing the domain port traits:
//!
//! - [`repositories::PgClaimStore`] for `ClaimStore`
//! - [`repositories::PgUserDirectory`] for `UserDirectory`
//! - [`repositories::PgOutboxStore`] for `OutboxStore`
//!
//! Claims keep their structured sub-documents (claimant, incident,
//! attachments, message logs) in JSONB columns and write them back whole;
//! scalar columns carry everything that is filtered or joined on.

pub mod error;
pub mod pool;
pub mod repositories;

pub use pool::{connect, run_migrations};
pub use repositories::{PgClaimStore, PgOutboxStore, PgUserDirectory};
