//! Party Domain
//!
//! This crate models the platform's user accounts and their referral
//! relationships:
//!
//! - **Admin** and **Handler** staff manage claims in the back office.
//! - **Producers** (agents) originate claims and may be referred by an
//!   upstream **Organizer**.
//!
//! The one-hop `referred_by` relation stored on each user is resolved into a
//! full ancestor chain by [`OrganizationChain`], up to a configurable depth.

pub mod error;
pub mod ports;
pub mod referral;
pub mod user;

pub use error::PartyError;
pub use ports::{NewUser, UserDirectory};
pub use referral::{OrganizationChain, ReferralResolver};
pub use user::{User, UserRole};
