//! PostgreSQL notification outbox
//!
//! Backs the durable delivery queue. The schema keeps a partial index on
//! pending rows so the worker's due-scan stays cheap as sent and dead
//! rows accumulate. A single worker per deployment drains the queue, so
//! the due-scan does not take row locks.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use core_kernel::{ClaimId, DomainPort, IntentId, PortError};
use domain_claims::{NotificationIntent, OutboxStore};

use crate::error::db_error;
use crate::repositories::{enum_from_text, enum_text};

const INTENT_COLUMNS: &str = "id, claim_id, recipient, to_address, subject, html_body, \
     status, attempts, next_attempt_at, last_error, created_at";

pub struct PgOutboxStore {
    pool: PgPool,
}

impl PgOutboxStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn intent_from_row(row: &PgRow) -> Result<NotificationIntent, PortError> {
    let recipient: String = row.try_get("recipient").map_err(db_error)?;
    let status: String = row.try_get("status").map_err(db_error)?;
    let claim_id: Option<Uuid> = row.try_get("claim_id").map_err(db_error)?;
    Ok(NotificationIntent {
        id: IntentId::from_uuid(row.try_get("id").map_err(db_error)?),
        claim_id: claim_id.map(ClaimId::from_uuid),
        recipient: enum_from_text(&recipient, "recipient")?,
        to: row.try_get("to_address").map_err(db_error)?,
        subject: row.try_get("subject").map_err(db_error)?,
        html_body: row.try_get("html_body").map_err(db_error)?,
        status: enum_from_text(&status, "status")?,
        attempts: row.try_get::<i32, _>("attempts").map_err(db_error)? as u32,
        next_attempt_at: row.try_get("next_attempt_at").map_err(db_error)?,
        last_error: row.try_get("last_error").map_err(db_error)?,
        created_at: row.try_get("created_at").map_err(db_error)?,
    })
}

impl DomainPort for PgOutboxStore {}

#[async_trait]
impl OutboxStore for PgOutboxStore {
    async fn enqueue(&self, intent: &NotificationIntent) -> Result<(), PortError> {
        sqlx::query(
            "INSERT INTO notification_outbox (id, claim_id, recipient, to_address, \
             subject, html_body, status, attempts, next_attempt_at, last_error, \
             created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(intent.id.as_uuid())
        .bind(intent.claim_id.map(|c| *c.as_uuid()))
        .bind(enum_text(&intent.recipient)?)
        .bind(&intent.to)
        .bind(&intent.subject)
        .bind(&intent.html_body)
        .bind(enum_text(&intent.status)?)
        .bind(intent.attempts as i32)
        .bind(intent.next_attempt_at)
        .bind(&intent.last_error)
        .bind(intent.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn due(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<NotificationIntent>, PortError> {
        let rows = sqlx::query(&format!(
            "SELECT {INTENT_COLUMNS} FROM notification_outbox \
             WHERE status = 'pending' AND next_attempt_at <= $1 \
             ORDER BY next_attempt_at ASC LIMIT $2"
        ))
        .bind(now)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        rows.iter().map(intent_from_row).collect()
    }

    async fn mark_sent(&self, id: IntentId) -> Result<(), PortError> {
        let result = sqlx::query(
            "UPDATE notification_outbox SET status = 'sent', last_error = NULL \
             WHERE id = $1",
        )
        .bind(id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        if result.rows_affected() == 0 {
            return Err(PortError::not_found("NotificationIntent", id));
        }
        Ok(())
    }

    async fn mark_retry(
        &self,
        id: IntentId,
        attempts: u32,
        next_attempt_at: DateTime<Utc>,
        error: &str,
    ) -> Result<(), PortError> {
        let result = sqlx::query(
            "UPDATE notification_outbox SET attempts = $2, next_attempt_at = $3, \
             last_error = $4 WHERE id = $1",
        )
        .bind(id.as_uuid())
        .bind(attempts as i32)
        .bind(next_attempt_at)
        .bind(error)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        if result.rows_affected() == 0 {
            return Err(PortError::not_found("NotificationIntent", id));
        }
        Ok(())
    }

    async fn mark_dead(&self, id: IntentId, attempts: u32, error: &str) -> Result<(), PortError> {
        let result = sqlx::query(
            "UPDATE notification_outbox SET status = 'dead', attempts = $2, \
             last_error = $3 WHERE id = $1",
        )
        .bind(id.as_uuid())
        .bind(attempts as i32)
        .bind(error)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        if result.rows_affected() == 0 {
            return Err(PortError::not_found("NotificationIntent", id));
        }
        Ok(())
    }
}
