//! User aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::UserId;

/// Role of a platform user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Back-office administrator
    Admin,
    /// Staff member who actively manages assigned claims
    Handler,
    /// External agent who originates/refers claims
    Producer,
    /// Upstream referrer of producers, receives roll-up notifications
    Organizer,
}

impl UserRole {
    /// Returns true for roles that may be assigned as a claim handler
    pub fn can_handle_claims(&self) -> bool {
        matches!(self, UserRole::Admin | UserRole::Handler)
    }
}

/// A platform user account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: UserId,
    /// Full name
    pub name: String,
    /// Email address (unique across accounts)
    pub email: String,
    /// Bcrypt password hash
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    /// Role
    pub role: UserRole,
    /// Approval flag gating login
    pub is_approved: bool,
    /// National identity number
    pub national_id: Option<String>,
    /// Contact phone
    pub phone: Option<String>,
    /// Professional register number (producers)
    pub register_number: Option<String>,
    /// One-hop upstream referrer
    pub referred_by: Option<UserId>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Creates a new unapproved user with the given role
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
        role: UserRole,
    ) -> Self {
        Self {
            id: UserId::new_v7(),
            name: name.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            role,
            is_approved: false,
            national_id: None,
            phone: None,
            register_number: None,
            referred_by: None,
            created_at: Utc::now(),
        }
    }

    /// Sets the upstream referrer
    pub fn with_referrer(mut self, referrer: UserId) -> Self {
        self.referred_by = Some(referrer);
        self
    }

    /// Marks the account as approved
    pub fn approve(&mut self) {
        self.is_approved = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_roles() {
        assert!(UserRole::Admin.can_handle_claims());
        assert!(UserRole::Handler.can_handle_claims());
        assert!(!UserRole::Producer.can_handle_claims());
        assert!(!UserRole::Organizer.can_handle_claims());
    }

    #[test]
    fn test_new_user_starts_unapproved() {
        let user = User::new("Ana Gomez", "ana@example.com", "$2b$10$hash", UserRole::Producer);
        assert!(!user.is_approved);
        assert!(user.referred_by.is_none());
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User::new("Ana Gomez", "ana@example.com", "$2b$10$hash", UserRole::Producer);
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("$2b$10$hash"));
    }
}
