//! Export Packager
//!
//! Builds the archive a department lead downloads: every submitted or packed
//! claim of the department, grouped by theme name.
//!
//! ```text
//! expense_export_{department}_{YYYYmmddHHMM}.zip
//! ├── 00_skipped_receipts.txt            (only if some receipts were unreadable)
//! ├── 01_expense_summary_{department}.xlsx
//! ├── 02_activity_statement_{theme}.docx (one per theme)
//! └── receipts/
//!     └── 1-{theme}/
//!         ├── 1.1-{item}/{original filename}
//!         └── 1.2-{item}/{original filename}
//! ```
//!
//! The claims are read once, then everything else, including reading the
//! receipt files, works from that snapshot.

pub mod grouping;
pub mod summary;
pub mod narrative;
pub mod receipts;
pub mod packager;
pub mod error;

pub use grouping::{group_by_theme, ExportClaim, ThemeGroup};
pub use summary::SummaryRow;
pub use narrative::NarrativeDocument;
pub use receipts::{ReceiptEntry, SkippedReceipt};
pub use packager::{ExportArchive, ExportService};
pub use error::ExportError;
