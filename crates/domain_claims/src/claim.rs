//! Claim aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{ActivityDate, ClaimId, InvoiceId, ItemId, Money, ThemeId, UserId};
use crate::error::ClaimError;
use crate::invoice::Invoice;
use crate::item::{Item, ItemLine};
use crate::theme::ActivityTheme;
use crate::workflow::{next_status, ClaimAction};

/// Longest accepted theme name or location
pub const MAX_TEXT_LEN: usize = 200;
/// Longest accepted leader name
pub const MAX_LEADER_LEN: usize = 100;

/// Claim status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    /// Being prepared by the applicant
    Draft,
    /// Waiting for the department lead
    Submitted,
    /// Approved and included in exports
    Packed,
    /// Sent back to the applicant with a note
    Rejected,
}

impl ClaimStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimStatus::Draft => "draft",
            ClaimStatus::Submitted => "submitted",
            ClaimStatus::Packed => "packed",
            ClaimStatus::Rejected => "rejected",
        }
    }

    /// Whether the owner may change content
    pub fn is_editable(&self) -> bool {
        matches!(self, ClaimStatus::Draft | ClaimStatus::Rejected)
    }

    /// Whether the claim is included in department exports
    pub fn is_exportable(&self) -> bool {
        matches!(self, ClaimStatus::Submitted | ClaimStatus::Packed)
    }
}

impl fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClaimStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(ClaimStatus::Draft),
            "submitted" => Ok(ClaimStatus::Submitted),
            "packed" => Ok(ClaimStatus::Packed),
            "rejected" => Ok(ClaimStatus::Rejected),
            other => Err(format!("Unknown claim status: {}", other)),
        }
    }
}

/// Header fields of a claim, as entered on the claim form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimDetails {
    /// Activity theme name
    pub theme: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub activity_date: Option<ActivityDate>,
    #[serde(default)]
    pub location: String,
    /// Person in charge of the activity
    #[serde(default)]
    pub leader: String,
}

impl ClaimDetails {
    pub fn new(theme: impl Into<String>) -> Self {
        Self {
            theme: theme.into(),
            ..Default::default()
        }
    }

    /// Trims text fields and checks what every save needs
    pub fn normalized(mut self) -> Result<Self, ClaimError> {
        self.theme = self.theme.trim().to_string();
        self.description = self.description.trim().to_string();
        self.location = self.location.trim().to_string();
        self.leader = self.leader.trim().to_string();

        if self.theme.is_empty() {
            return Err(ClaimError::validation("theme", "Activity theme is required"));
        }
        check_len("theme", &self.theme, MAX_TEXT_LEN)?;
        check_len("location", &self.location, MAX_TEXT_LEN)?;
        check_len("leader", &self.leader, MAX_LEADER_LEN)?;
        Ok(self)
    }
}

fn check_len(field: &str, value: &str, max: usize) -> Result<(), ClaimError> {
    if value.chars().count() > max {
        return Err(ClaimError::validation(
            field,
            format!("Must be at most {} characters", max),
        ));
    }
    Ok(())
}

/// Stored claim fields, used to rebuild a claim from storage
#[derive(Debug, Clone)]
pub struct ClaimRecord {
    pub id: ClaimId,
    pub applicant_id: UserId,
    pub department: String,
    pub theme_id: Option<ThemeId>,
    pub details: ClaimDetails,
    pub status: ClaimStatus,
    pub reviewer_note: String,
    pub items: Vec<Item>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A reimbursement claim with its items and their invoices
///
/// The aggregate guards two invariants: `total_amount` is always the sum of
/// the item amounts, and content changes are only accepted while the status
/// is `Draft` or `Rejected`. Who may change it is decided by
/// [`crate::visibility`] before any method here is called.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    id: ClaimId,
    applicant_id: UserId,
    department: String,
    theme_id: Option<ThemeId>,
    details: ClaimDetails,
    status: ClaimStatus,
    items: Vec<Item>,
    total_amount: Money,
    reviewer_note: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Claim {
    /// Creates a draft owned by `applicant_id`
    ///
    /// The department is copied from the applicant and never changes.
    pub fn new(applicant_id: UserId, department: impl Into<String>, details: ClaimDetails) -> Self {
        let now = Utc::now();
        Self {
            id: ClaimId::new_v7(),
            applicant_id,
            department: department.into(),
            theme_id: None,
            details,
            status: ClaimStatus::Draft,
            items: Vec::new(),
            total_amount: Money::zero(),
            reviewer_note: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuilds a claim from storage, recomputing the total from its items
    pub fn restore(record: ClaimRecord) -> Self {
        let mut claim = Self {
            id: record.id,
            applicant_id: record.applicant_id,
            department: record.department,
            theme_id: record.theme_id,
            details: record.details,
            status: record.status,
            items: record.items,
            total_amount: Money::zero(),
            reviewer_note: record.reviewer_note,
            created_at: record.created_at,
            updated_at: record.updated_at,
        };
        claim.recompute_total();
        claim
    }

    pub fn id(&self) -> ClaimId {
        self.id
    }

    pub fn applicant_id(&self) -> UserId {
        self.applicant_id
    }

    pub fn department(&self) -> &str {
        &self.department
    }

    pub fn theme_id(&self) -> Option<ThemeId> {
        self.theme_id
    }

    pub fn details(&self) -> &ClaimDetails {
        &self.details
    }

    pub fn status(&self) -> ClaimStatus {
        self.status
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    pub fn reviewer_note(&self) -> &str {
        &self.reviewer_note
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn item(&self, item_id: ItemId) -> Option<&Item> {
        self.items.iter().find(|i| i.id() == item_id)
    }

    /// Finds an invoice anywhere in the claim
    pub fn invoice(&self, invoice_id: InvoiceId) -> Option<&Invoice> {
        self.items
            .iter()
            .flat_map(|i| i.invoices())
            .find(|inv| inv.id == invoice_id)
    }

    /// Every stored blob path referenced by this claim
    pub fn stored_paths(&self) -> Vec<String> {
        self.items
            .iter()
            .flat_map(|i| i.invoices())
            .map(|inv| inv.stored_path.clone())
            .collect()
    }

    // ------------------------------------------------------------------
    // Content changes (Draft / Rejected only)
    // ------------------------------------------------------------------

    /// Replaces the header fields
    ///
    /// Changing the theme text drops the link to the previously resolved
    /// theme; it is resolved again on the next submit.
    pub fn set_details(&mut self, details: ClaimDetails) -> Result<(), ClaimError> {
        self.ensure_allows(ClaimAction::Edit)?;
        if details.theme != self.details.theme {
            self.theme_id = None;
        }
        self.details = details;
        self.touch();
        Ok(())
    }

    /// Appends an item and returns its id
    pub fn add_item(&mut self, line: &ItemLine) -> Result<ItemId, ClaimError> {
        self.ensure_allows(ClaimAction::Edit)?;
        let item = Item::new(self.id, line)?;
        let id = item.id();
        self.items.push(item);
        self.recompute_total();
        self.touch();
        Ok(id)
    }

    pub fn update_item(&mut self, item_id: ItemId, line: &ItemLine) -> Result<(), ClaimError> {
        self.ensure_allows(ClaimAction::Edit)?;
        let item = self
            .items
            .iter_mut()
            .find(|i| i.id() == item_id)
            .ok_or_else(|| ClaimError::not_found("Item", item_id))?;
        item.apply(line)?;
        self.recompute_total();
        self.touch();
        Ok(())
    }

    /// Removes an item together with its invoices and returns it
    pub fn remove_item(&mut self, item_id: ItemId) -> Result<Item, ClaimError> {
        self.ensure_allows(ClaimAction::Edit)?;
        let index = self
            .items
            .iter()
            .position(|i| i.id() == item_id)
            .ok_or_else(|| ClaimError::not_found("Item", item_id))?;
        let removed = self.items.remove(index);
        self.recompute_total();
        self.touch();
        Ok(removed)
    }

    pub fn attach_invoice(&mut self, invoice: Invoice) -> Result<(), ClaimError> {
        self.ensure_allows(ClaimAction::Edit)?;
        let item = self
            .items
            .iter_mut()
            .find(|i| i.id() == invoice.item_id)
            .ok_or_else(|| ClaimError::not_found("Item", invoice.item_id))?;
        item.push_invoice(invoice);
        self.touch();
        Ok(())
    }

    pub fn remove_invoice(&mut self, invoice_id: InvoiceId) -> Result<Invoice, ClaimError> {
        self.ensure_allows(ClaimAction::Edit)?;
        let removed = self
            .items
            .iter_mut()
            .find_map(|i| i.take_invoice(invoice_id))
            .ok_or_else(|| ClaimError::not_found("Invoice", invoice_id))?;
        self.touch();
        Ok(removed)
    }

    // ------------------------------------------------------------------
    // Status transitions
    // ------------------------------------------------------------------

    /// Keeps the claim as a draft (a rejected claim returns to `Draft`)
    pub fn save_draft(&mut self) -> Result<(ClaimStatus, ClaimStatus), ClaimError> {
        self.transition(ClaimAction::SaveDraft)
    }

    /// Submits the claim for review under an already resolved theme
    ///
    /// The theme supplies the activity date when the claim has none.
    pub fn submit(
        &mut self,
        theme: &ActivityTheme,
    ) -> Result<(ClaimStatus, ClaimStatus), ClaimError> {
        self.ensure_allows(ClaimAction::Submit)?;
        self.check_submittable()?;
        if self.details.activity_date.is_none() {
            self.details.activity_date = Some(theme.activity_date);
        }
        self.theme_id = Some(theme.id);
        self.transition(ClaimAction::Submit)
    }

    /// Approves the claim; the note replaces any earlier review note
    pub fn approve(&mut self, note: Option<String>) -> Result<(ClaimStatus, ClaimStatus), ClaimError> {
        let change = self.transition(ClaimAction::Approve)?;
        self.set_review_note(note);
        Ok(change)
    }

    pub fn reject(&mut self, note: Option<String>) -> Result<(ClaimStatus, ClaimStatus), ClaimError> {
        let change = self.transition(ClaimAction::Reject)?;
        self.set_review_note(note);
        Ok(change)
    }

    fn set_review_note(&mut self, note: Option<String>) {
        self.reviewer_note = note.map(|n| n.trim().to_string()).unwrap_or_default();
    }

    /// Checks the fields a submitted claim must carry, except the date,
    /// which may still come from the theme
    pub fn check_submittable(&self) -> Result<(), ClaimError> {
        if self.details.theme.is_empty() {
            return Err(ClaimError::validation("theme", "Activity theme is required"));
        }
        if self.details.location.is_empty() {
            return Err(ClaimError::validation("location", "Activity location is required"));
        }
        if self.details.leader.is_empty() {
            return Err(ClaimError::validation("leader", "Person in charge is required"));
        }
        if self.items.is_empty() {
            return Err(ClaimError::validation("items", "At least one item is required"));
        }
        Ok(())
    }

    /// Fails with `InvalidState` unless the current status allows `action`
    pub fn ensure_allows(&self, action: ClaimAction) -> Result<(), ClaimError> {
        next_status(self.status, action)
            .map(|_| ())
            .ok_or(ClaimError::InvalidState {
                status: self.status,
                action,
            })
    }

    fn transition(&mut self, action: ClaimAction) -> Result<(ClaimStatus, ClaimStatus), ClaimError> {
        let from = self.status;
        let to = next_status(from, action).ok_or(ClaimError::InvalidState {
            status: from,
            action,
        })?;
        self.status = to;
        self.touch();
        Ok((from, to))
    }

    fn recompute_total(&mut self) {
        self.total_amount = self.items.iter().map(Item::amount).sum();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
