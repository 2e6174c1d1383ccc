//! Infrastructure Database Layer
//!
//! PostgreSQL persistence for the reimbursement tracker using SQLx.
//!
//! # Architecture
//!
//! Repositories own the SQL and work on plain row types. Adapters implement
//! the domain ports (`ClaimStore`, `UserDirectory`) on top of them and
//! translate rows into domain aggregates.
//!
//! A claim is written whole inside one transaction: header, items and
//! invoices are upserted, dropped children are deleted, and the stored
//! `total_amount` is recomputed from the stored items before commit.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, run_migrations, DatabaseConfig, PostgresClaimStore};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/expenses")).await?;
//! run_migrations(&pool).await?;
//! let store = PostgresClaimStore::new(pool);
//! ```

pub mod pool;
pub mod error;
pub mod repositories;
pub mod adapters;

pub use pool::{DatabasePool, create_pool, create_pool_from_url, run_migrations, DatabaseConfig};
pub use error::DatabaseError;
pub use adapters::{PostgresClaimStore, PostgresUserDirectory};
