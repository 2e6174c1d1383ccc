//! Test Data Builders
//!
//! Builds claims directly in the status a test needs, walking the same
//! transitions the service would.

use core_kernel::UserId;
use domain_claims::{ActivityTheme, Claim, ClaimDetails, ClaimStatus, Invoice, ItemLine, User};

use crate::fixtures::{ClaimFixtures, ARTS};

/// Builder for [`Claim`]
#[derive(Debug, Clone)]
pub struct ClaimBuilder {
    applicant_id: UserId,
    department: String,
    details: ClaimDetails,
    lines: Vec<ItemLine>,
    receipts: Vec<String>,
    status: ClaimStatus,
    note: Option<String>,
}

impl Default for ClaimBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ClaimBuilder {
    /// A draft gala claim for a fresh applicant in Arts
    pub fn new() -> Self {
        Self {
            applicant_id: UserId::new(),
            department: ARTS.to_string(),
            details: ClaimFixtures::gala_details(),
            lines: ClaimFixtures::gala_lines(),
            receipts: Vec::new(),
            status: ClaimStatus::Draft,
            note: None,
        }
    }

    /// Owner and department taken from `user`
    pub fn owned_by(mut self, user: &User) -> Self {
        self.applicant_id = user.id;
        self.department = user.department.clone();
        self
    }

    pub fn details(mut self, details: ClaimDetails) -> Self {
        self.details = details;
        self
    }

    pub fn theme(mut self, theme: impl Into<String>) -> Self {
        self.details.theme = theme.into();
        self
    }

    pub fn lines(mut self, lines: Vec<ItemLine>) -> Self {
        self.lines = lines;
        self
    }

    /// Attaches one receipt per file name to the first item
    pub fn receipts(mut self, file_names: &[&str]) -> Self {
        self.receipts = file_names.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn status(mut self, status: ClaimStatus) -> Self {
        self.status = status;
        self
    }

    pub fn rejected_with(mut self, note: impl Into<String>) -> Self {
        self.status = ClaimStatus::Rejected;
        self.note = Some(note.into());
        self
    }

    /// Builds the claim under a theme keyed by its own name and department
    pub fn build(self) -> Claim {
        let date = self.details.activity_date.unwrap_or_else(ClaimFixtures::gala_date);
        let theme = ActivityTheme::new(self.details.theme.clone(), self.department.clone(), date);
        self.build_under(&theme)
    }

    /// Builds the claim under `theme`
    ///
    /// # Panics
    ///
    /// Panics when the builder holds lines or a form the domain rejects.
    pub fn build_under(self, theme: &ActivityTheme) -> Claim {
        let mut claim = Claim::new(self.applicant_id, &self.department, self.details);
        for line in &self.lines {
            claim.add_item(line).expect("builder item line is invalid");
        }
        if let Some(first) = claim.items().first().map(|i| i.id()) {
            for file_name in &self.receipts {
                let invoice = Invoice::new(first, file_name, ClaimFixtures::upload_date());
                claim.attach_invoice(invoice).expect("builder receipt is invalid");
            }
        }

        if self.status != ClaimStatus::Draft {
            claim.submit(theme).expect("builder claim cannot be submitted");
        }
        match self.status {
            ClaimStatus::Draft | ClaimStatus::Submitted => {}
            ClaimStatus::Packed => {
                claim.approve(None).expect("builder claim cannot be approved");
            }
            ClaimStatus::Rejected => {
                claim.reject(self.note).expect("builder claim cannot be rejected");
            }
        }
        claim
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::UserFixtures;

    #[test]
    fn test_default_is_draft_gala() {
        let claim = ClaimBuilder::new().build();
        assert_eq!(claim.status(), ClaimStatus::Draft);
        assert_eq!(claim.total_amount(), ClaimFixtures::gala_total());
        assert!(claim.theme_id().is_none());
    }

    #[test]
    fn test_builds_each_status() {
        let amy = UserFixtures::amy();
        for status in [ClaimStatus::Submitted, ClaimStatus::Packed, ClaimStatus::Rejected] {
            let claim = ClaimBuilder::new().owned_by(&amy).status(status).build();
            assert_eq!(claim.status(), status);
            assert_eq!(claim.applicant_id(), amy.id);
            assert!(claim.theme_id().is_some());
        }
    }

    #[test]
    fn test_rejection_note_and_receipts() {
        let claim = ClaimBuilder::new()
            .receipts(&["a.jpg", "b.pdf"])
            .rejected_with("blurry")
            .build();
        assert_eq!(claim.reviewer_note(), "blurry");
        assert_eq!(claim.items()[0].invoices().len(), 2);
        assert_eq!(claim.stored_paths().len(), 2);
    }
}
