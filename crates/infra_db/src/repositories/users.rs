//! PostgreSQL user directory

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use core_kernel::{DomainPort, PortError, UserId};
use domain_party::{NewUser, User, UserDirectory};

use crate::error::db_error;
use crate::repositories::{enum_from_text, enum_text};

const USER_COLUMNS: &str = "id, name, email, password_hash, role, is_approved, \
     national_id, phone, register_number, referred_by, created_at";

pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_one(&self, id: UserId) -> Result<User, PortError> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| PortError::not_found("User", id))
    }
}

fn user_from_row(row: &PgRow) -> Result<User, PortError> {
    let role: String = row.try_get("role").map_err(db_error)?;
    Ok(User {
        id: UserId::from_uuid(row.try_get("id").map_err(db_error)?),
        name: row.try_get("name").map_err(db_error)?,
        email: row.try_get("email").map_err(db_error)?,
        password_hash: row.try_get("password_hash").map_err(db_error)?,
        role: enum_from_text(&role, "role")?,
        is_approved: row.try_get("is_approved").map_err(db_error)?,
        national_id: row.try_get("national_id").map_err(db_error)?,
        phone: row.try_get("phone").map_err(db_error)?,
        register_number: row.try_get("register_number").map_err(db_error)?,
        referred_by: row
            .try_get::<Option<Uuid>, _>("referred_by")
            .map_err(db_error)?
            .map(UserId::from_uuid),
        created_at: row.try_get("created_at").map_err(db_error)?,
    })
}

impl DomainPort for PgUserDirectory {}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, PortError> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, PortError> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn create(&self, new_user: NewUser) -> Result<User, PortError> {
        let mut user = User::new(
            new_user.name,
            new_user.email,
            new_user.password_hash,
            new_user.role,
        );
        user.national_id = new_user.national_id;
        user.phone = new_user.phone;
        user.register_number = new_user.register_number;
        user.referred_by = new_user.referred_by;

        sqlx::query(
            "INSERT INTO users (id, name, email, password_hash, role, is_approved, \
             national_id, phone, register_number, referred_by, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(user.id.as_uuid())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(enum_text(&user.role)?)
        .bind(user.is_approved)
        .bind(&user.national_id)
        .bind(&user.phone)
        .bind(&user.register_number)
        .bind(user.referred_by.map(|u| *u.as_uuid()))
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(user)
    }

    async fn find_referred_by(&self, id: UserId) -> Result<Vec<User>, PortError> {
        let rows = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE referred_by = $1 \
             ORDER BY created_at DESC"
        ))
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        rows.iter().map(user_from_row).collect()
    }

    async fn list(&self) -> Result<Vec<User>, PortError> {
        let rows = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        rows.iter().map(user_from_row).collect()
    }

    async fn set_approved(&self, id: UserId, approved: bool) -> Result<User, PortError> {
        let result = sqlx::query("UPDATE users SET is_approved = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(approved)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        if result.rows_affected() == 0 {
            return Err(PortError::not_found("User", id));
        }
        self.fetch_one(id).await
    }
}
