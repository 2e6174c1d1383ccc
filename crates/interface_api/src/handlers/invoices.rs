//! Receipt upload and removal

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;

use core_kernel::{ClaimId, InvoiceId, ItemId};
use domain_claims::Actor;

use crate::dto::claims::{ClaimResponse, InvoiceResponse};
use crate::{error::ApiError, AppState};

/// Multipart field carrying the receipt
pub const FILE_FIELD: &str = "file";

/// Attaches a receipt to an item
///
/// Expects `multipart/form-data` with the file in the `file` field.
pub async fn upload_invoice(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path((id, item_id)): Path<(Uuid, Uuid)>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<InvoiceResponse>), ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;

        let invoice = state
            .claims
            .attach_invoice(
                &actor,
                ClaimId::from(id),
                ItemId::from(item_id),
                &file_name,
                bytes.to_vec(),
            )
            .await?;
        return Ok((StatusCode::CREATED, Json(InvoiceResponse::from(&invoice))));
    }

    Err(ApiError::validation(FILE_FIELD, "No file was uploaded"))
}

/// Removes a single receipt from an editable claim
pub async fn delete_invoice(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<ClaimResponse>, ApiError> {
    let claim = state
        .claims
        .remove_invoice(&actor, InvoiceId::from(id))
        .await?;
    Ok(Json(ClaimResponse::from(&claim)))
}
