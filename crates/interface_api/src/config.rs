//! API configuration
//!
//! Settings come from the environment with the `CLAIMTRACK_` prefix
//! (`.env` files are honored in development). Storage and JWT settings
//! are mandatory; the mail provider and document renderer degrade to
//! no-ops when unset so local stacks run without external accounts.

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

/// Fallback recipient for internal claim alerts
pub const DEFAULT_ADMIN_EMAIL: &str = "claims-desk@claimtrack.app";

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub listen_addr: String,
    pub database_url: String,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub admin_email: String,
    pub storage_url: String,
    pub storage_bucket: String,
    pub storage_api_key: String,
    pub mail_api_key: Option<String>,
    pub mail_from: String,
    pub renderer_url: Option<String>,
    pub max_upload_bytes: usize,
    pub signed_url_ttl_secs: u64,
    pub outbox_poll_secs: u64,
}

impl ApiConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Config::builder()
            .set_default("listen_addr", "0.0.0.0:8080")?
            .set_default("database_max_connections", 10)?
            .set_default("jwt_ttl_hours", 24)?
            .set_default("admin_email", DEFAULT_ADMIN_EMAIL)?
            .set_default("storage_bucket", "claim-documents")?
            .set_default("mail_from", "ClaimTrack <no-reply@claimtrack.app>")?
            .set_default("max_upload_bytes", 10 * 1024 * 1024)?
            .set_default("signed_url_ttl_secs", 300)?
            .set_default("outbox_poll_secs", 5)?
            .add_source(Environment::with_prefix("CLAIMTRACK"))
            .build()?
            .try_deserialize()
    }
}
