//! Party Domain Ports
//!
//! The `UserDirectory` trait defines every operation the rest of the system
//! needs from the user store. Adapters:
//!
//! - **Internal**: PostgreSQL repository in `infra_db`
//! - **In-memory**: test directory in `domain_claims::testing`
//!
//! Lookups optionally hydrate the one-hop referrer relation; callers that
//! need the full ancestor chain go through
//! [`OrganizationChain`](crate::referral::OrganizationChain).

use async_trait::async_trait;

use core_kernel::{DomainPort, PortError, UserId};

use crate::user::{User, UserRole};

/// Data for creating a new user account
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
    pub national_id: Option<String>,
    pub phone: Option<String>,
    pub register_number: Option<String>,
    pub referred_by: Option<UserId>,
}

/// Port over the user store
#[async_trait]
pub trait UserDirectory: DomainPort {
    /// Finds a user by id, or `None` when unknown
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, PortError>;

    /// Finds a user by email, or `None` when unknown
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, PortError>;

    /// Persists a new account; fails with `Conflict` on a duplicate email
    async fn create(&self, user: NewUser) -> Result<User, PortError>;

    /// Lists the direct referees of a user, newest first
    async fn find_referred_by(&self, id: UserId) -> Result<Vec<User>, PortError>;

    /// Lists every account, newest first
    async fn list(&self) -> Result<Vec<User>, PortError>;

    /// Sets the approval flag; returns the updated user
    async fn set_approved(&self, id: UserId, approved: bool) -> Result<User, PortError>;
}
