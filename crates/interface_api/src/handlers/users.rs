//! Account administration

use axum::extract::{Path, State};
use axum::Json;
use tracing::info;

use core_kernel::UserId;
use domain_party::User;

use crate::auth::AuthContext;
use crate::error::ApiError;
use crate::AppState;

pub async fn list(
    State(state): State<AppState>,
    ctx: AuthContext,
) -> Result<Json<Vec<User>>, ApiError> {
    ctx.require_admin()?;
    Ok(Json(state.directory.list().await?))
}

pub async fn approve(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<UserId>,
) -> Result<Json<User>, ApiError> {
    ctx.require_admin()?;
    let user = state.directory.set_approved(id, true).await?;
    info!(user = %id, approver = %ctx.user_id, "account approved");
    state.notifier.account_approved(&user).await;
    Ok(Json(user))
}

/// Direct referees of the calling user
pub async fn referred(
    State(state): State<AppState>,
    ctx: AuthContext,
) -> Result<Json<Vec<User>>, ApiError> {
    Ok(Json(state.directory.find_referred_by(ctx.user_id).await?))
}
