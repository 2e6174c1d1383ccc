//! HTTP API Layer
//!
//! The REST surface of the expense tracker, built on Axum.
//!
//! # Architecture
//!
//! - **Handlers**: thin request handlers calling `ClaimService` and `ExportService`
//! - **Middleware**: bearer authentication producing an explicit `Actor`, audit logging
//! - **DTOs**: request/response bodies
//! - **Error Handling**: domain errors mapped to status codes in one place
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, AppState};
//!
//! let state = AppState::new(store, users, blobs, config)?;
//! axum::serve(listener, create_router(state)).await?;
//! ```

pub mod config;
pub mod error;
pub mod middleware;
pub mod handlers;
pub mod dto;
pub mod auth;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use core_kernel::{CoreError, HealthCheckable};
use domain_claims::{BlobStore, ClaimService, ClaimStore, UserDirectory};
use domain_export::ExportService;

use crate::config::ApiConfig;
use crate::handlers::{claims, export, health, invoices, themes};
use crate::middleware::{audit_middleware, auth_middleware};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub claims: ClaimService,
    pub exports: ExportService,
    pub users: Arc<dyn UserDirectory>,
    /// Adapters probed by the readiness check
    pub dependencies: Vec<Arc<dyn HealthCheckable>>,
    pub config: ApiConfig,
}

impl AppState {
    /// Wires the services onto the given adapters
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Configuration` if the configured timezone is unknown
    pub fn new<S, U, B>(
        store: Arc<S>,
        users: Arc<U>,
        blobs: Arc<B>,
        config: ApiConfig,
    ) -> Result<Self, CoreError>
    where
        S: ClaimStore,
        U: UserDirectory,
        B: BlobStore,
    {
        let timezone = config.timezone()?;

        let dependencies = vec![
            store.clone() as Arc<dyn HealthCheckable>,
            users.clone() as Arc<dyn HealthCheckable>,
            blobs.clone() as Arc<dyn HealthCheckable>,
        ];
        let store: Arc<dyn ClaimStore> = store;
        let users: Arc<dyn UserDirectory> = users;
        let blobs: Arc<dyn BlobStore> = blobs;

        Ok(Self {
            claims: ClaimService::new(store.clone(), blobs.clone(), timezone),
            exports: ExportService::new(store, users.clone(), blobs, timezone),
            users,
            dependencies,
            config,
        })
    }
}

/// Creates the main API router
pub fn create_router(state: AppState) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    let claims_routes = Router::new()
        .route("/", post(claims::create_claim))
        .route("/", get(claims::list_claims))
        .route("/:id", get(claims::get_claim))
        .route("/:id", put(claims::update_claim))
        .route("/:id", delete(claims::delete_claim))
        .route("/:id/submit", post(claims::submit_claim))
        .route("/:id/review", post(claims::review_claim))
        .route("/:id/items", post(claims::add_item))
        .route("/:id/items/:item_id", put(claims::update_item))
        .route("/:id/items/:item_id", delete(claims::remove_item))
        .route(
            "/:id/items/:item_id/invoices",
            post(invoices::upload_invoice)
                .layer(DefaultBodyLimit::max(state.config.max_upload_bytes)),
        );

    // Protected API routes
    let api_routes = Router::new()
        .nest("/claims", claims_routes)
        .route("/invoices/:id", delete(invoices::delete_invoice))
        .route("/themes", get(themes::list_themes))
        .route("/export", get(export::export_department))
        .layer(axum_middleware::from_fn(audit_middleware))
        .layer(axum_middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Combine all routes
    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
