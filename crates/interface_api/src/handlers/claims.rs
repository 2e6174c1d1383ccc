//! Claims handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;

use core_kernel::{ClaimId, ItemId};
use domain_claims::{Actor, ItemLine, ReviewDecision};

use crate::dto::claims::*;
use crate::{error::ApiError, AppState};

/// Creates a claim, optionally with items, as a draft or straight to submitted
pub async fn create_claim(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<CreateClaimRequest>,
) -> Result<(StatusCode, Json<ClaimResponse>), ApiError> {
    let details = request.form.into_details()?;
    let claim = state
        .claims
        .create_claim(&actor, details, request.items, request.intent)
        .await?;
    Ok((StatusCode::CREATED, Json(ClaimResponse::from(&claim))))
}

/// Lists the claims on the actor's dashboard
pub async fn list_claims(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Vec<ClaimResponse>>, ApiError> {
    let claims = state.claims.list_claims(&actor).await?;
    Ok(Json(claims.iter().map(ClaimResponse::from).collect()))
}

/// Gets a claim by ID
pub async fn get_claim(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<ClaimResponse>, ApiError> {
    let claim = state.claims.get_claim(&actor, ClaimId::from(id)).await?;
    Ok(Json(ClaimResponse::from(&claim)))
}

/// Edits the claim form and saves or submits it
pub async fn update_claim(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateClaimRequest>,
) -> Result<Json<ClaimResponse>, ApiError> {
    let details = request.form.into_details()?;
    let claim = state
        .claims
        .update_claim(&actor, ClaimId::from(id), details, request.intent)
        .await?;
    Ok(Json(ClaimResponse::from(&claim)))
}

pub async fn delete_claim(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.claims.delete_claim(&actor, ClaimId::from(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn submit_claim(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<ClaimResponse>, ApiError> {
    let claim = state.claims.submit_claim(&actor, ClaimId::from(id)).await?;
    Ok(Json(ClaimResponse::from(&claim)))
}

/// Approves or rejects a submitted claim
pub async fn review_claim(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(request): Json<ReviewRequest>,
) -> Result<Json<ClaimResponse>, ApiError> {
    let decision = match request.decision {
        ReviewAction::Approve => ReviewDecision::Approve { note: request.note },
        ReviewAction::Reject => ReviewDecision::Reject { note: request.note },
    };
    let claim = state
        .claims
        .review_claim(&actor, ClaimId::from(id), decision)
        .await?;
    Ok(Json(ClaimResponse::from(&claim)))
}

/// Adds an item; the response carries the recomputed total
pub async fn add_item(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(line): Json<ItemLine>,
) -> Result<(StatusCode, Json<ClaimResponse>), ApiError> {
    let claim = state
        .claims
        .record_item(&actor, ClaimId::from(id), line)
        .await?;
    Ok((StatusCode::CREATED, Json(ClaimResponse::from(&claim))))
}

pub async fn update_item(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path((id, item_id)): Path<(Uuid, Uuid)>,
    Json(line): Json<ItemLine>,
) -> Result<Json<ClaimResponse>, ApiError> {
    let claim = state
        .claims
        .update_item(&actor, ClaimId::from(id), ItemId::from(item_id), line)
        .await?;
    Ok(Json(ClaimResponse::from(&claim)))
}

/// Removes an item with its receipts
pub async fn remove_item(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path((id, item_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ClaimResponse>, ApiError> {
    let claim = state
        .claims
        .remove_item(&actor, ClaimId::from(id), ItemId::from(item_id))
        .await?;
    Ok(Json(ClaimResponse::from(&claim)))
}
