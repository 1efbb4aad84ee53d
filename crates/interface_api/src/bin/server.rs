//! Claims API server
//!
//! Wires the PostgreSQL and HTTP adapters into the claim lifecycle,
//! spawns the outbox worker, and serves the router.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use domain_claims::{
    ClaimService, DocumentRenderer, IntakeLimits, Mailer, Notifier, OutboxStore, OutboxWorker,
};
use domain_party::UserDirectory;
use infra_db::{PgClaimStore, PgOutboxStore, PgUserDirectory};
use infra_external::{BucketStorage, DisabledRenderer, HttpMailer, NoopMailer, RenderServiceClient};
use interface_api::auth::TokenManager;
use interface_api::{ApiConfig, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = ApiConfig::load()?;

    let pool = infra_db::connect(&cfg.database_url, cfg.database_max_connections).await?;
    infra_db::run_migrations(&pool).await?;

    let store = Arc::new(PgClaimStore::new(pool.clone()));
    let directory: Arc<dyn UserDirectory> = Arc::new(PgUserDirectory::new(pool.clone()));
    let outbox: Arc<dyn OutboxStore> = Arc::new(PgOutboxStore::new(pool));

    let storage = Arc::new(BucketStorage::new(
        cfg.storage_url.clone(),
        cfg.storage_bucket.clone(),
        cfg.storage_api_key.clone(),
    )?);
    let renderer: Arc<dyn DocumentRenderer> = match &cfg.renderer_url {
        Some(url) => Arc::new(RenderServiceClient::new(url.clone())?),
        None => Arc::new(DisabledRenderer),
    };
    let mailer: Arc<dyn Mailer> = match &cfg.mail_api_key {
        Some(key) => Arc::new(HttpMailer::new(key.clone(), cfg.mail_from.clone())?),
        None => Arc::new(NoopMailer),
    };

    let notifier = Arc::new(Notifier::new(Arc::clone(&outbox), cfg.admin_email.clone()));
    let service = Arc::new(
        ClaimService::new(
            store,
            storage,
            renderer,
            Arc::clone(&directory),
            Arc::clone(&notifier),
        )
        .with_limits(IntakeLimits {
            max_file_bytes: cfg.max_upload_bytes,
        })
        .with_signed_url_ttl(cfg.signed_url_ttl_secs),
    );

    let worker = OutboxWorker::new(outbox, mailer)
        .with_poll_interval(Duration::from_secs(cfg.outbox_poll_secs));
    tokio::spawn(worker.run());

    let state = AppState::new(
        service,
        directory,
        notifier,
        Arc::new(TokenManager::new(&cfg.jwt_secret, cfg.jwt_ttl_hours)),
        cfg.max_upload_bytes,
    );
    let app = interface_api::router(state);

    let listener = TcpListener::bind(&cfg.listen_addr).await?;
    info!(addr = %cfg.listen_addr, "claims api listening");
    axum::serve(listener, app).await?;
    Ok(())
}
