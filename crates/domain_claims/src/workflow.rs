//! Claim status transitions
//!
//! | From      | Action     | Performed by          | To        |
//! |-----------|------------|-----------------------|-----------|
//! | Draft     | save-draft | owner                 | Draft     |
//! | Draft     | submit     | owner                 | Submitted |
//! | Rejected  | save-draft | owner                 | Draft     |
//! | Rejected  | submit     | owner                 | Submitted |
//! | Submitted | approve    | lead (same department)| Packed    |
//! | Submitted | reject     | lead (same department)| Rejected  |

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::claim::ClaimStatus;

/// An action that moves a claim through its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimAction {
    SaveDraft,
    Submit,
    Approve,
    Reject,
    /// Any change to items or invoices
    Edit,
    Delete,
}

impl fmt::Display for ClaimAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ClaimAction::SaveDraft => "save as draft",
            ClaimAction::Submit => "submit",
            ClaimAction::Approve => "approve",
            ClaimAction::Reject => "reject",
            ClaimAction::Edit => "edit",
            ClaimAction::Delete => "delete",
        };
        f.write_str(s)
    }
}

/// Who may perform an action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Performer {
    Owner,
    DepartmentLead,
}

impl ClaimAction {
    pub fn performer(&self) -> Performer {
        match self {
            ClaimAction::Approve | ClaimAction::Reject => Performer::DepartmentLead,
            _ => Performer::Owner,
        }
    }
}

/// What the owner asked for when saving the claim form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveIntent {
    #[default]
    Draft,
    Submit,
}

impl From<SaveIntent> for ClaimAction {
    fn from(intent: SaveIntent) -> Self {
        match intent {
            SaveIntent::Draft => ClaimAction::SaveDraft,
            SaveIntent::Submit => ClaimAction::Submit,
        }
    }
}

/// Returns the status reached by applying `action` in `from`, if allowed
///
/// `Edit` and `Delete` never change the status; they are listed so that the
/// same table answers whether content may be touched.
pub fn next_status(from: ClaimStatus, action: ClaimAction) -> Option<ClaimStatus> {
    use ClaimAction::*;
    use ClaimStatus::*;
    match (from, action) {
        (Draft | Rejected, SaveDraft) => Some(Draft),
        (Draft | Rejected, Submit) => Some(Submitted),
        (Submitted, Approve) => Some(Packed),
        (Submitted, Reject) => Some(Rejected),
        (Draft | Rejected, Edit | Delete) => Some(from),
        _ => None,
    }
}
