//! API middleware

use axum::{
    body::Body,
    extract::State,
    http::{header, Request},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use tracing::{info, warn};

use domain_claims::Actor;

use crate::auth::{authenticate, bearer_token};
use crate::error::ApiError;
use crate::AppState;

/// Authentication middleware
///
/// Resolves the bearer token to an [`Actor`] and stores it in the request
/// extensions, where handlers pick it up as `Extension<Actor>`.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = bearer_token(header).inspect_err(|_| {
        warn!("Missing or invalid Authorization header");
    })?;

    let actor = authenticate(state.users.as_ref(), token, &state.config.jwt_secret)
        .await
        .inspect_err(|e| warn!(error = %e, "Authentication failed"))?;

    request.extensions_mut().insert(actor);
    Ok(next.run(request).await)
}

/// Audit logging middleware
///
/// Logs every API request with the acting user and the outcome
pub async fn audit_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let (user_id, role) = request
        .extensions()
        .get::<Actor>()
        .map(|a| (a.user_id.to_string(), a.role.as_str()))
        .unwrap_or_else(|| ("anonymous".to_string(), "none"));

    let start = Utc::now();

    let response = next.run(request).await;

    let duration = Utc::now() - start;
    let status = response.status();

    info!(
        method = %method,
        uri = %uri,
        user = %user_id,
        role = role,
        status = %status.as_u16(),
        duration_ms = duration.num_milliseconds(),
        "API request"
    );

    response
}
