//! Account request and response bodies

use serde::{Deserialize, Serialize};
use validator::Validate;

use domain_party::{User, UserRole};

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterBody {
    #[validate(length(min = 2, message = "name is too short"))]
    pub name: String,
    #[validate(email(message = "email is not valid"))]
    pub email: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: String,
    pub role: UserRole,
    pub national_id: Option<String>,
    pub phone: Option<String>,
    pub register_number: Option<String>,
    /// Referral identifier of the upstream organizer or producer
    pub referral_code: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginBody {
    #[validate(email)]
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}
