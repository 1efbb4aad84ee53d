//! PostgreSQL claim store
//!
//! Scalar columns carry everything that gets filtered on; the structured
//! sub-documents (claimant, flags, incident, counterparty, attachments,
//! message logs) live in JSONB and are written back whole on update. Two
//! staff members editing the same claim concurrently therefore race on
//! those columns; last writer wins.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, QueryBuilder, Row};
use uuid::Uuid;

use core_kernel::{ClaimId, DomainPort, PortError, TrackingCode, UserId};
use domain_claims::{Claim, ClaimFilter, ClaimStore};

use crate::error::db_error;
use crate::repositories::{enum_from_text, enum_text, from_json_column, json_column};

const CLAIM_COLUMNS: &str = "id, tracking_code, status, claimant, claimant_role, flags, \
     incident, counterparty, bank_account, attachments, created_by, handler, \
     messages, notes, created_at, updated_at";

pub struct PgClaimStore {
    pool: PgPool,
}

impl PgClaimStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn claim_from_row(row: &PgRow) -> Result<Claim, PortError> {
    let status: String = row.try_get("status").map_err(db_error)?;
    let role: String = row.try_get("claimant_role").map_err(db_error)?;
    let tracking: String = row.try_get("tracking_code").map_err(db_error)?;
    Ok(Claim {
        id: ClaimId::from_uuid(row.try_get("id").map_err(db_error)?),
        tracking_code: tracking
            .parse::<TrackingCode>()
            .map_err(|e| PortError::internal(format!("corrupt tracking_code column: {e}")))?,
        status: enum_from_text(&status, "status")?,
        claimant: from_json_column(row.try_get("claimant").map_err(db_error)?, "claimant")?,
        claimant_role: enum_from_text(&role, "claimant_role")?,
        flags: from_json_column(row.try_get("flags").map_err(db_error)?, "flags")?,
        incident: from_json_column(row.try_get("incident").map_err(db_error)?, "incident")?,
        counterparty: from_json_column(
            row.try_get("counterparty").map_err(db_error)?,
            "counterparty",
        )?,
        bank_account: row.try_get("bank_account").map_err(db_error)?,
        attachments: from_json_column(
            row.try_get("attachments").map_err(db_error)?,
            "attachments",
        )?,
        created_by: row
            .try_get::<Option<Uuid>, _>("created_by")
            .map_err(db_error)?
            .map(UserId::from_uuid),
        handler: row
            .try_get::<Option<Uuid>, _>("handler")
            .map_err(db_error)?
            .map(UserId::from_uuid),
        messages: from_json_column(row.try_get("messages").map_err(db_error)?, "messages")?,
        notes: from_json_column(row.try_get("notes").map_err(db_error)?, "notes")?,
        created_at: row.try_get("created_at").map_err(db_error)?,
        updated_at: row.try_get("updated_at").map_err(db_error)?,
    })
}

impl DomainPort for PgClaimStore {}

#[async_trait]
impl ClaimStore for PgClaimStore {
    async fn insert(&self, claim: &Claim) -> Result<(), PortError> {
        sqlx::query(
            "INSERT INTO claims (id, tracking_code, status, claimant, \
             claimant_national_id, claimant_role, flags, incident, counterparty, \
             bank_account, attachments, created_by, handler, messages, notes, \
             created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, \
             $15, $16, $17)",
        )
        .bind(claim.id.as_uuid())
        .bind(claim.tracking_code.as_str())
        .bind(enum_text(&claim.status)?)
        .bind(json_column(&claim.claimant, "claimant")?)
        .bind(&claim.claimant.national_id)
        .bind(enum_text(&claim.claimant_role)?)
        .bind(json_column(&claim.flags, "flags")?)
        .bind(json_column(&claim.incident, "incident")?)
        .bind(json_column(&claim.counterparty, "counterparty")?)
        .bind(&claim.bank_account)
        .bind(json_column(&claim.attachments, "attachments")?)
        .bind(claim.created_by.map(|u| *u.as_uuid()))
        .bind(claim.handler.map(|u| *u.as_uuid()))
        .bind(json_column(&claim.messages, "messages")?)
        .bind(json_column(&claim.notes, "notes")?)
        .bind(claim.created_at)
        .bind(claim.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn update(&self, claim: &Claim) -> Result<(), PortError> {
        let result = sqlx::query(
            "UPDATE claims SET status = $2, claimant = $3, claimant_national_id = $4, \
             flags = $5, incident = $6, counterparty = $7, bank_account = $8, \
             attachments = $9, created_by = $10, handler = $11, messages = $12, \
             notes = $13, updated_at = $14 \
             WHERE id = $1",
        )
        .bind(claim.id.as_uuid())
        .bind(enum_text(&claim.status)?)
        .bind(json_column(&claim.claimant, "claimant")?)
        .bind(&claim.claimant.national_id)
        .bind(json_column(&claim.flags, "flags")?)
        .bind(json_column(&claim.incident, "incident")?)
        .bind(json_column(&claim.counterparty, "counterparty")?)
        .bind(&claim.bank_account)
        .bind(json_column(&claim.attachments, "attachments")?)
        .bind(claim.created_by.map(|u| *u.as_uuid()))
        .bind(claim.handler.map(|u| *u.as_uuid()))
        .bind(json_column(&claim.messages, "messages")?)
        .bind(json_column(&claim.notes, "notes")?)
        .bind(claim.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(PortError::not_found("Claim", claim.id));
        }
        Ok(())
    }

    async fn get(&self, id: ClaimId) -> Result<Option<Claim>, PortError> {
        let row = sqlx::query(&format!("SELECT {CLAIM_COLUMNS} FROM claims WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;
        row.as_ref().map(claim_from_row).transpose()
    }

    async fn find_by_tracking(&self, code: &TrackingCode) -> Result<Option<Claim>, PortError> {
        let row = sqlx::query(&format!(
            "SELECT {CLAIM_COLUMNS} FROM claims WHERE tracking_code = $1"
        ))
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;
        row.as_ref().map(claim_from_row).transpose()
    }

    async fn list(&self, filter: &ClaimFilter) -> Result<Vec<Claim>, PortError> {
        let mut qb = QueryBuilder::new(format!("SELECT {CLAIM_COLUMNS} FROM claims WHERE TRUE"));
        if let Some(status) = filter.status {
            qb.push(" AND status = ").push_bind(enum_text(&status)?);
        }
        if let Some(creator) = filter.created_by {
            qb.push(" AND created_by = ").push_bind(*creator.as_uuid());
        }
        if let Some(handler) = filter.handler {
            qb.push(" AND handler = ").push_bind(*handler.as_uuid());
        }
        if let Some(creators) = &filter.created_by_any {
            let ids: Vec<Uuid> = creators.iter().map(|u| *u.as_uuid()).collect();
            qb.push(" AND created_by = ANY(").push_bind(ids).push(")");
        }
        qb.push(" ORDER BY created_at DESC");

        let rows = qb.build().fetch_all(&self.pool).await.map_err(db_error)?;
        rows.iter().map(claim_from_row).collect()
    }

    async fn delete(&self, id: ClaimId) -> Result<(), PortError> {
        let result = sqlx::query("DELETE FROM claims WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        if result.rows_affected() == 0 {
            return Err(PortError::not_found("Claim", id));
        }
        Ok(())
    }
}
