//! Reimbursement Claim Domain
//!
//! This crate implements the claim aggregate (a reimbursement with its line
//! items and receipt invoices), the status lifecycle, the department
//! visibility rules, and the ports the lifecycle needs from storage.
//!
//! # Claim Lifecycle
//!
//! ```text
//! (new) -> Draft -> Submitted -> Packed
//!            ^          |
//!            |          v
//!            +------ Rejected
//! ```
//!
//! Only the owning applicant edits a claim, and only while it is `Draft` or
//! `Rejected`. A lead of the claim's department approves (`Packed`) or
//! rejects a `Submitted` claim.

pub mod user;
pub mod theme;
pub mod claim;
pub mod item;
pub mod invoice;
pub mod workflow;
pub mod visibility;
pub mod lifecycle;
pub mod ports;
pub mod error;

pub use user::{Actor, Role, User};
pub use theme::ActivityTheme;
pub use claim::{Claim, ClaimDetails, ClaimRecord, ClaimStatus};
pub use item::{Item, ItemLine, ItemRecord, DEFAULT_UNIT};
pub use invoice::Invoice;
pub use workflow::{ClaimAction, SaveIntent};
pub use lifecycle::{ClaimService, ReviewDecision};
pub use ports::{BlobStore, ClaimQuery, ClaimStore, UserDirectory};
pub use error::ClaimError;
