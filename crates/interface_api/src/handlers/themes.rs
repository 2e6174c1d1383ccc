//! Theme lookup

use axum::{extract::State, Extension, Json};

use domain_claims::Actor;

use crate::dto::themes::ThemeResponse;
use crate::{error::ApiError, AppState};

/// Themes already used in the actor's department, newest first
pub async fn list_themes(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Vec<ThemeResponse>>, ApiError> {
    let themes = state.claims.list_themes(&actor).await?;
    Ok(Json(themes.iter().map(ThemeResponse::from).collect()))
}
