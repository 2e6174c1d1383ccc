//! Request handlers
//!
//! Every protected handler receives the authenticated [`domain_claims::Actor`]
//! as an `Extension` and passes it explicitly to the service it calls.

pub mod claims;
pub mod invoices;
pub mod themes;
pub mod export;
pub mod health;
