//! HTTP handlers

pub mod auth;
pub mod claims;
pub mod health;
pub mod users;
