//! HTTP Interface
//!
//! One router serves three audiences:
//!
//! - the public: claim intake (multipart) and tracking lookups
//! - network users (producers, organizers): their referred claims
//! - staff: claim management, status changes, accounts
//!
//! Authentication rides on the [`auth::AuthContext`] extractor; handlers
//! that take it are protected, the rest are public.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post, put};
use axum::Router;

use domain_claims::{ClaimService, Notifier};
use domain_party::UserDirectory;

pub mod auth;
pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;

pub use config::ApiConfig;
pub use error::ApiError;

/// Headroom over the per-file limit for multipart framing and text fields
const BODY_LIMIT_SLACK: usize = 2 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub claims: Arc<ClaimService>,
    pub directory: Arc<dyn UserDirectory>,
    pub notifier: Arc<Notifier>,
    pub tokens: Arc<auth::TokenManager>,
    pub body_limit: usize,
}

impl AppState {
    pub fn new(
        claims: Arc<ClaimService>,
        directory: Arc<dyn UserDirectory>,
        notifier: Arc<Notifier>,
        tokens: Arc<auth::TokenManager>,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            claims,
            directory,
            notifier,
            tokens,
            body_limit: max_upload_bytes + BODY_LIMIT_SLACK,
        }
    }
}

pub fn router(state: AppState) -> Router {
    let body_limit = state.body_limit;
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/v1/auth/register", post(handlers::auth::register))
        .route("/api/v1/auth/login", post(handlers::auth::login))
        .route(
            "/api/v1/claims",
            post(handlers::claims::create).get(handlers::claims::list),
        )
        .route("/api/v1/claims/mine", get(handlers::claims::mine))
        .route("/api/v1/claims/network", get(handlers::claims::network))
        .route("/api/v1/claims/track/:code", get(handlers::claims::track))
        .route(
            "/api/v1/claims/:id",
            get(handlers::claims::get)
                .patch(handlers::claims::patch)
                .delete(handlers::claims::remove),
        )
        .route(
            "/api/v1/claims/:id/status",
            put(handlers::claims::update_status),
        )
        .route(
            "/api/v1/claims/:id/handler",
            put(handlers::claims::assign_handler),
        )
        .route(
            "/api/v1/claims/:id/messages",
            post(handlers::claims::append_message),
        )
        .route(
            "/api/v1/claims/:id/notes",
            post(handlers::claims::append_note),
        )
        .route(
            "/api/v1/claims/:id/files/:category",
            get(handlers::claims::file_url),
        )
        .route("/api/v1/users", get(handlers::users::list))
        .route("/api/v1/users/referred", get(handlers::users::referred))
        .route("/api/v1/users/:id/approve", put(handlers::users::approve))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::trace())
        .layer(middleware::set_request_id())
        .layer(middleware::propagate_request_id())
        .layer(middleware::cors())
        .with_state(state)
}
