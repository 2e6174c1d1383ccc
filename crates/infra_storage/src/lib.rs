//! Receipt file storage
//!
//! [`LocalBlobStore`] implements the `BlobStore` port on the local
//! filesystem. Paths handed to it are relative, slash-separated keys such as
//! `invoices/2024/05/12/3f2a9c1b_receipt.jpg`; they are resolved under a
//! configured media root and may never escape it.

pub mod error;
pub mod local;

pub use error::StorageError;
pub use local::LocalBlobStore;
