//! Claims DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use core_kernel::{ActivityDate, Money};
use domain_claims::{Claim, ClaimDetails, ClaimStatus, Invoice, Item, ItemLine, SaveIntent};

use crate::error::ApiError;

/// Claim form fields shared by create and edit
///
/// The activity date arrives as three optional numbers; all three blank
/// means "not set", anything in between is rejected.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClaimFormRequest {
    pub theme: String,
    pub description: String,
    pub activity_year: Option<i32>,
    pub activity_month: Option<u32>,
    pub activity_day: Option<u32>,
    pub location: String,
    pub leader: String,
}

impl ClaimFormRequest {
    pub fn into_details(self) -> Result<ClaimDetails, ApiError> {
        let activity_date =
            ActivityDate::from_parts(self.activity_year, self.activity_month, self.activity_day)
                .map_err(|e| ApiError::validation("activity_date", e.to_string()))?;

        Ok(ClaimDetails {
            theme: self.theme,
            description: self.description,
            activity_date,
            location: self.location,
            leader: self.leader,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateClaimRequest {
    #[serde(flatten)]
    pub form: ClaimFormRequest,
    #[serde(default)]
    pub items: Vec<ItemLine>,
    #[serde(default)]
    pub intent: SaveIntent,
}

#[derive(Debug, Deserialize)]
pub struct UpdateClaimRequest {
    #[serde(flatten)]
    pub form: ClaimFormRequest,
    #[serde(default)]
    pub intent: SaveIntent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewAction {
    Approve,
    Reject,
}

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub decision: ReviewAction,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct InvoiceResponse {
    pub id: Uuid,
    pub item_id: Uuid,
    pub file_name: String,
    pub uploaded_at: DateTime<Utc>,
}

impl From<&Invoice> for InvoiceResponse {
    fn from(invoice: &Invoice) -> Self {
        Self {
            id: *invoice.id.as_uuid(),
            item_id: *invoice.item_id.as_uuid(),
            file_name: invoice.file_name.clone(),
            uploaded_at: invoice.uploaded_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ItemResponse {
    pub id: Uuid,
    pub name: String,
    pub quantity: u32,
    pub unit: String,
    pub price: Money,
    pub amount: Money,
    pub invoices: Vec<InvoiceResponse>,
}

impl From<&Item> for ItemResponse {
    fn from(item: &Item) -> Self {
        Self {
            id: *item.id().as_uuid(),
            name: item.name().to_string(),
            quantity: item.quantity(),
            unit: item.unit().to_string(),
            price: item.price(),
            amount: item.amount(),
            invoices: item.invoices().iter().map(InvoiceResponse::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ClaimResponse {
    pub id: Uuid,
    pub applicant_id: Uuid,
    pub department: String,
    pub theme: String,
    pub theme_id: Option<Uuid>,
    pub description: String,
    /// `YYYY-MM-DD`, or absent while not set
    pub activity_date: Option<String>,
    pub location: String,
    pub leader: String,
    pub status: ClaimStatus,
    pub total_amount: Money,
    pub reviewer_note: String,
    pub items: Vec<ItemResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Claim> for ClaimResponse {
    fn from(claim: &Claim) -> Self {
        let details = claim.details();
        Self {
            id: *claim.id().as_uuid(),
            applicant_id: *claim.applicant_id().as_uuid(),
            department: claim.department().to_string(),
            theme: details.theme.clone(),
            theme_id: claim.theme_id().map(|t| *t.as_uuid()),
            description: details.description.clone(),
            activity_date: details.activity_date.map(|d| d.to_string()),
            location: details.location.clone(),
            leader: details.leader.clone(),
            status: claim.status(),
            total_amount: claim.total_amount(),
            reviewer_note: claim.reviewer_note().to_string(),
            items: claim.items().iter().map(ItemResponse::from).collect(),
            created_at: claim.created_at(),
            updated_at: claim.updated_at(),
        }
    }
}
