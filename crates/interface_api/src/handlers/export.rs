//! Department export download

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Extension,
};
use tracing::{info, warn};

use domain_claims::Actor;

use crate::{error::ApiError, AppState};

/// Header reporting how many receipts were left out of the archive
pub const SKIPPED_RECEIPTS_HEADER: &str = "x-skipped-receipts";

/// Builds the department archive and streams it back as a zip download
///
/// Answers 409 `no_data` when the department has no approved or packed claims.
pub async fn export_department(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<Response, ApiError> {
    let archive = state.exports.export_department(&actor).await?;

    for skipped in &archive.skipped {
        warn!(
            stored = %skipped.stored_path,
            archive = %skipped.archive_path,
            reason = %skipped.reason,
            "Receipt left out of export"
        );
    }
    info!(
        department = %actor.department,
        themes = archive.theme_count,
        rows = archive.row_count,
        receipts = archive.receipt_count,
        "Department exported"
    );

    let headers = [
        (header::CONTENT_TYPE, "application/zip".to_string()),
        (header::CONTENT_DISPOSITION, content_disposition(&archive.file_name)),
        (
            header::HeaderName::from_static(SKIPPED_RECEIPTS_HEADER),
            archive.skipped.len().to_string(),
        ),
    ];
    Ok((headers, archive.bytes).into_response())
}

/// `attachment` disposition with an ASCII fallback and the UTF-8 name
fn content_disposition(file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|c| if c.is_ascii_graphic() && c != '"' && c != '\\' { c } else { '_' })
        .collect();
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        percent_encode(file_name)
    )
}

fn percent_encode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(char::from(byte))
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}
