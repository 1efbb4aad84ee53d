//! Registration and login
//!
//! Producer and organizer accounts self-register but start unapproved;
//! an admin flips the approval flag before the account can log in.
//! Admin accounts are provisioned out of band, never through this
//! endpoint.

use std::str::FromStr;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use tracing::{info, warn};
use validator::Validate;

use core_kernel::UserId;
use domain_party::{NewUser, PartyError, User, UserRole};

use crate::auth::{hash_password, verify_password};
use crate::dto::users::{AuthResponse, LoginBody, RegisterBody};
use crate::error::ApiError;
use crate::AppState;

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterBody>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    body.validate()?;
    if body.role == UserRole::Admin {
        return Err(ApiError::forbidden(
            "admin accounts are provisioned manually",
        ));
    }

    let referred_by = match body.referral_code.as_deref() {
        Some(code) => match UserId::from_str(code) {
            Ok(id) => state.directory.find_by_id(id).await?.map(|u| u.id),
            Err(_) => {
                warn!(code, "registration carried an invalid referral code");
                None
            }
        },
        None => None,
    };

    let user = state
        .directory
        .create(NewUser {
            name: body.name,
            email: body.email.clone(),
            password_hash: hash_password(&body.password)?,
            role: body.role,
            national_id: body.national_id,
            phone: body.phone,
            register_number: body.register_number,
            referred_by,
        })
        .await
        .map_err(|e| {
            if e.is_conflict() {
                PartyError::EmailTaken(body.email.clone()).into()
            } else {
                ApiError::from(e)
            }
        })?;

    info!(user = %user.id, role = ?user.role, "account registered");
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginBody>,
) -> Result<Json<AuthResponse>, ApiError> {
    body.validate()?;

    let user = state
        .directory
        .find_by_email(&body.email)
        .await?
        .ok_or(PartyError::InvalidCredentials)?;
    if !verify_password(&body.password, &user.password_hash) {
        return Err(PartyError::InvalidCredentials.into());
    }
    if !user.is_approved {
        return Err(PartyError::NotApproved.into());
    }

    let token = state.tokens.issue(&user)?;
    Ok(Json(AuthResponse { token, user }))
}
