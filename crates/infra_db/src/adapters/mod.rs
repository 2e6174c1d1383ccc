//! Domain Adapters
//!
//! Implementations of the `domain_claims` ports on PostgreSQL. Each adapter
//! wraps a repository, converts rows to domain values and maps
//! `DatabaseError` into `PortError`.
//!
//! ```rust,ignore
//! use infra_db::adapters::PostgresClaimStore;
//! use domain_claims::ClaimStore;
//! use std::sync::Arc;
//!
//! let store: Arc<dyn ClaimStore> = Arc::new(PostgresClaimStore::new(pool));
//! let claim = store.get_claim(claim_id).await?;
//! ```

pub mod claims;
pub mod users;

pub use claims::PostgresClaimStore;
pub use users::PostgresUserDirectory;

use sqlx::PgPool;

use core_kernel::HealthCheckResult;

/// Runs `SELECT 1` and reports the outcome under `adapter_id`
pub(crate) async fn ping(pool: &PgPool, adapter_id: &str) -> HealthCheckResult {
    let start = std::time::Instant::now();

    let result = sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(pool)
        .await;

    let latency_ms = start.elapsed().as_millis() as u64;

    match result {
        Ok(_) => HealthCheckResult::healthy(adapter_id, latency_ms),
        Err(e) => HealthCheckResult::unhealthy(adapter_id, latency_ms, format!("Database error: {}", e)),
    }
}
