//! Claim endpoints
//!
//! Intake and tracking are public; everything else requires a token.
//! Producers see the claims filed through their own link, organizers see
//! their network, staff see everything plus their own caseload.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use core_kernel::ClaimId;
use domain_claims::{Claim, ClaimFilter, ClaimPatch, CreatedClaim, DocumentCategory, TrackingView};
use domain_party::UserRole;

use crate::auth::AuthContext;
use crate::dto::claims::{
    parse_intake, EntryBody, FileQuery, HandlerBody, ListQuery, StatusBody, TrackQuery,
};
use crate::error::ApiError;
use crate::AppState;

/// Public intake endpoint
pub async fn create(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<CreatedClaim>), ApiError> {
    let request = parse_intake(multipart).await?;
    let created = state.claims.create(request).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Public progress lookup
pub async fn track(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Query(query): Query<TrackQuery>,
) -> Result<Json<TrackingView>, ApiError> {
    let view = state.claims.track(&code, &query.national_id).await?;
    Ok(Json(view))
}

/// Staff listing, optionally narrowed to one status
pub async fn list(
    State(state): State<AppState>,
    ctx: AuthContext,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Claim>>, ApiError> {
    ctx.require_staff()?;
    let filter = match query.status {
        Some(status) => ClaimFilter::with_status(status),
        None => ClaimFilter::all(),
    };
    Ok(Json(state.claims.list(&filter).await?))
}

/// The caller's own caseload: claims they handle for staff, claims filed
/// through their referral link for everyone else
pub async fn mine(
    State(state): State<AppState>,
    ctx: AuthContext,
) -> Result<Json<Vec<Claim>>, ApiError> {
    let filter = if ctx.is_staff() {
        ClaimFilter::by_handler(ctx.user_id)
    } else {
        ClaimFilter::by_creator(ctx.user_id)
    };
    Ok(Json(state.claims.list(&filter).await?))
}

/// Claims filed anywhere in an organizer's network
pub async fn network(
    State(state): State<AppState>,
    ctx: AuthContext,
) -> Result<Json<Vec<Claim>>, ApiError> {
    if ctx.role != UserRole::Organizer && !ctx.is_staff() {
        return Err(ApiError::forbidden("organizer access required"));
    }
    Ok(Json(state.claims.list_for_organizer(ctx.user_id).await?))
}

pub async fn get(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<ClaimId>,
) -> Result<Json<Claim>, ApiError> {
    let claim = state.claims.get(id).await?;
    authorize_read(&ctx, &claim)?;
    Ok(Json(claim))
}

pub async fn patch(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<ClaimId>,
    Json(body): Json<ClaimPatch>,
) -> Result<Json<Claim>, ApiError> {
    ctx.require_staff()?;
    Ok(Json(state.claims.apply_patch(id, body).await?))
}

pub async fn remove(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<ClaimId>,
) -> Result<StatusCode, ApiError> {
    ctx.require_admin()?;
    state.claims.remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn update_status(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<ClaimId>,
    Json(body): Json<StatusBody>,
) -> Result<Json<Claim>, ApiError> {
    ctx.require_staff()?;
    Ok(Json(state.claims.update_status(id, body.status).await?))
}

pub async fn assign_handler(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<ClaimId>,
    Json(body): Json<HandlerBody>,
) -> Result<Json<Claim>, ApiError> {
    ctx.require_staff()?;
    Ok(Json(state.claims.assign_handler(id, body.handler_id).await?))
}

pub async fn append_message(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<ClaimId>,
    Json(body): Json<EntryBody>,
) -> Result<Json<Claim>, ApiError> {
    ctx.require_staff()?;
    let author = ctx.user_id.to_string();
    Ok(Json(state.claims.append_message(id, &author, body.text).await?))
}

pub async fn append_note(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<ClaimId>,
    Json(body): Json<EntryBody>,
) -> Result<Json<Claim>, ApiError> {
    ctx.require_staff()?;
    let author = ctx.user_id.to_string();
    Ok(Json(state.claims.append_note(id, &author, body.text).await?))
}

/// Signed download URL for one attached file
pub async fn file_url(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path((id, category)): Path<(ClaimId, String)>,
    Query(query): Query<FileQuery>,
) -> Result<Json<Value>, ApiError> {
    let category: DocumentCategory = category.parse()?;
    let claim = state.claims.get(id).await?;
    authorize_read(&ctx, &claim)?;
    let url = state.claims.file_url(id, category, query.index).await?;
    Ok(Json(json!({ "url": url })))
}

/// Staff read anything; network users only the claims filed through
/// their own link
fn authorize_read(ctx: &AuthContext, claim: &Claim) -> Result<(), ApiError> {
    if ctx.is_staff() || claim.created_by == Some(ctx.user_id) {
        Ok(())
    } else {
        Err(ApiError::forbidden("no access to this claim"))
    }
}
