//! Claim lifecycle service
//!
//! Every operation takes the acting user explicitly, loads the claim whole,
//! applies the change to the aggregate, and writes it back with a single
//! [`ClaimStore::save_claim`] call. A failed validation returns before the
//! save, so nothing is partially persisted.
//!
//! Writes of a loaded claim carry the status it was loaded with; a claim that
//! moved on in between is not overwritten.

use std::sync::Arc;
use tracing::{info, warn};

use core_kernel::{ClaimId, InvoiceId, ItemId, Timezone};

use crate::claim::{Claim, ClaimDetails, ClaimStatus};
use crate::error::ClaimError;
use crate::invoice::Invoice;
use crate::item::ItemLine;
use crate::ports::{BlobStore, ClaimStore};
use crate::theme::ActivityTheme;
use crate::user::Actor;
use crate::visibility::{ensure_can_act, ensure_can_view, listing_query};
use crate::workflow::{ClaimAction, SaveIntent};

/// Review outcome chosen by a lead
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewDecision {
    Approve { note: Option<String> },
    Reject { note: Option<String> },
}

/// Application service for the claim lifecycle
#[derive(Clone)]
pub struct ClaimService {
    store: Arc<dyn ClaimStore>,
    blobs: Arc<dyn BlobStore>,
    timezone: Timezone,
}

impl ClaimService {
    pub fn new(store: Arc<dyn ClaimStore>, blobs: Arc<dyn BlobStore>, timezone: Timezone) -> Self {
        Self {
            store,
            blobs,
            timezone,
        }
    }

    /// Creates a claim with its initial items
    ///
    /// With `SaveIntent::Submit` the claim is submitted right away; the
    /// whole unit is validated before anything is stored.
    pub async fn create_claim(
        &self,
        actor: &Actor,
        details: ClaimDetails,
        items: Vec<ItemLine>,
        intent: SaveIntent,
    ) -> Result<Claim, ClaimError> {
        if !actor.can_file_claims() {
            return Err(ClaimError::denied("Administrators cannot file claims"));
        }
        let details = details.normalized()?;
        let mut claim = Claim::new(actor.user_id, &actor.department, details);
        for line in &items {
            claim.add_item(line)?;
        }
        if intent == SaveIntent::Submit {
            self.submit_resolved(&mut claim).await?;
        }
        self.store.save_claim(&claim, None).await?;

        info!(
            claim_id = %claim.id(),
            actor = %actor.user_id,
            status = %claim.status(),
            items = claim.items().len(),
            "Claim created"
        );
        Ok(claim)
    }

    /// Replaces the header fields and saves as draft or submits
    pub async fn update_claim(
        &self,
        actor: &Actor,
        claim_id: ClaimId,
        details: ClaimDetails,
        intent: SaveIntent,
    ) -> Result<Claim, ClaimError> {
        let mut claim = self.load_for(actor, claim_id, ClaimAction::from(intent)).await?;
        let loaded = claim.status();
        claim.set_details(details.normalized()?)?;
        let (from, to) = match intent {
            SaveIntent::Draft => claim.save_draft()?,
            SaveIntent::Submit => self.submit_resolved(&mut claim).await?,
        };
        self.store.save_claim(&claim, Some(loaded)).await?;
        log_transition(&claim, actor, from, to);
        Ok(claim)
    }

    /// Submits a claim as it stands
    pub async fn submit_claim(&self, actor: &Actor, claim_id: ClaimId) -> Result<Claim, ClaimError> {
        let mut claim = self.load_for(actor, claim_id, ClaimAction::Submit).await?;
        let loaded = claim.status();
        let (from, to) = self.submit_resolved(&mut claim).await?;
        self.store.save_claim(&claim, Some(loaded)).await?;
        log_transition(&claim, actor, from, to);
        Ok(claim)
    }

    /// Approves or rejects a submitted claim
    ///
    /// # Arguments
    ///
    /// * `actor` - A lead of the claim's department
    /// * `claim_id` - The submitted claim
    /// * `decision` - Approve or reject, each with an optional note
    ///
    /// # Errors
    ///
    /// - `PermissionDenied` for applicants or leads of other departments
    /// - `InvalidState` unless the claim is `Submitted`
    /// - `Storage` with a conflict when the claim changed after it was read
    pub async fn review_claim(
        &self,
        actor: &Actor,
        claim_id: ClaimId,
        decision: ReviewDecision,
    ) -> Result<Claim, ClaimError> {
        let action = match decision {
            ReviewDecision::Approve { .. } => ClaimAction::Approve,
            ReviewDecision::Reject { .. } => ClaimAction::Reject,
        };
        let mut claim = self.load_for(actor, claim_id, action).await?;
        let loaded = claim.status();
        let (from, to) = match decision {
            ReviewDecision::Approve { note } => claim.approve(note)?,
            ReviewDecision::Reject { note } => claim.reject(note)?,
        };
        self.store.save_claim(&claim, Some(loaded)).await?;
        log_transition(&claim, actor, from, to);
        Ok(claim)
    }

    /// Adds an item and returns the claim with its new total
    pub async fn record_item(
        &self,
        actor: &Actor,
        claim_id: ClaimId,
        line: ItemLine,
    ) -> Result<Claim, ClaimError> {
        let mut claim = self.load_for(actor, claim_id, ClaimAction::Edit).await?;
        let loaded = claim.status();
        let item_id = claim.add_item(&line)?;
        self.store.save_claim(&claim, Some(loaded)).await?;
        info!(claim_id = %claim_id, item_id = %item_id, total = %claim.total_amount(), "Item recorded");
        Ok(claim)
    }

    pub async fn update_item(
        &self,
        actor: &Actor,
        claim_id: ClaimId,
        item_id: ItemId,
        line: ItemLine,
    ) -> Result<Claim, ClaimError> {
        let mut claim = self.load_for(actor, claim_id, ClaimAction::Edit).await?;
        let loaded = claim.status();
        claim.update_item(item_id, &line)?;
        self.store.save_claim(&claim, Some(loaded)).await?;
        info!(claim_id = %claim_id, item_id = %item_id, total = %claim.total_amount(), "Item updated");
        Ok(claim)
    }

    /// Removes an item with its invoices
    pub async fn remove_item(
        &self,
        actor: &Actor,
        claim_id: ClaimId,
        item_id: ItemId,
    ) -> Result<Claim, ClaimError> {
        let mut claim = self.load_for(actor, claim_id, ClaimAction::Edit).await?;
        let loaded = claim.status();
        let removed = claim.remove_item(item_id)?;
        self.store.save_claim(&claim, Some(loaded)).await?;
        info!(claim_id = %claim_id, item_id = %item_id, total = %claim.total_amount(), "Item removed");

        let paths: Vec<String> = removed.invoices().iter().map(|i| i.stored_path.clone()).collect();
        self.discard_blobs(&paths).await;
        Ok(claim)
    }

    /// Stores an uploaded receipt and attaches it to an item
    ///
    /// # Arguments
    ///
    /// * `file_name` - Name as sent by the client; directories are stripped
    /// * `bytes` - File content, must not be empty
    ///
    /// # Returns
    ///
    /// The new invoice; the file is removed again if the claim cannot be saved
    pub async fn attach_invoice(
        &self,
        actor: &Actor,
        claim_id: ClaimId,
        item_id: ItemId,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<Invoice, ClaimError> {
        let mut claim = self.load_for(actor, claim_id, ClaimAction::Edit).await?;
        let loaded = claim.status();
        if claim.item(item_id).is_none() {
            return Err(ClaimError::not_found("Item", item_id));
        }
        if bytes.is_empty() {
            return Err(ClaimError::validation("file", "Uploaded file is empty"));
        }

        let today = self.timezone.local_date(chrono::Utc::now());
        let invoice = Invoice::new(item_id, file_name, today);
        self.blobs.put(&invoice.stored_path, bytes).await?;

        claim.attach_invoice(invoice.clone())?;
        if let Err(e) = self.store.save_claim(&claim, Some(loaded)).await {
            self.discard_blobs(std::slice::from_ref(&invoice.stored_path)).await;
            return Err(e.into());
        }
        info!(
            claim_id = %claim_id,
            item_id = %item_id,
            invoice_id = %invoice.id,
            path = %invoice.stored_path,
            "Invoice attached"
        );
        Ok(invoice)
    }

    /// Removes a single receipt
    pub async fn remove_invoice(&self, actor: &Actor, invoice_id: InvoiceId) -> Result<Claim, ClaimError> {
        let found = self.store.find_claim_by_invoice(invoice_id).await?;
        let mut claim = self.load_for(actor, found.id(), ClaimAction::Edit).await?;
        let loaded = claim.status();
        let removed = claim.remove_invoice(invoice_id)?;
        self.store.save_claim(&claim, Some(loaded)).await?;
        info!(claim_id = %claim.id(), invoice_id = %invoice_id, "Invoice removed");

        self.discard_blobs(std::slice::from_ref(&removed.stored_path)).await;
        Ok(claim)
    }

    /// Deletes a draft or rejected claim with everything it owns
    pub async fn delete_claim(&self, actor: &Actor, claim_id: ClaimId) -> Result<(), ClaimError> {
        let claim = self.load_for(actor, claim_id, ClaimAction::Delete).await?;
        claim.ensure_allows(ClaimAction::Delete)?;
        self.store.delete_claim(claim_id, Some(claim.status())).await?;
        info!(claim_id = %claim_id, actor = %actor.user_id, "Claim deleted");

        self.discard_blobs(&claim.stored_paths()).await;
        Ok(())
    }

    /// Loads a claim the actor may see
    pub async fn get_claim(&self, actor: &Actor, claim_id: ClaimId) -> Result<Claim, ClaimError> {
        let claim = self.store.get_claim(claim_id).await?;
        ensure_can_view(actor, &claim)?;
        Ok(claim)
    }

    /// Claims shown on the actor's dashboard, newest first
    pub async fn list_claims(&self, actor: &Actor) -> Result<Vec<Claim>, ClaimError> {
        let query = listing_query(actor)?;
        Ok(self.store.find_claims(query).await?)
    }

    /// Themes of the actor's department, newest first
    pub async fn list_themes(&self, actor: &Actor) -> Result<Vec<ActivityTheme>, ClaimError> {
        if !actor.can_file_claims() {
            return Err(ClaimError::denied("Administrators do not handle claim content"));
        }
        Ok(self.store.list_themes(&actor.department).await?)
    }

    async fn load_for(
        &self,
        actor: &Actor,
        claim_id: ClaimId,
        action: ClaimAction,
    ) -> Result<Claim, ClaimError> {
        let claim = self.store.get_claim(claim_id).await?;
        ensure_can_view(actor, &claim)?;
        ensure_can_act(actor, &claim, action)?;
        Ok(claim)
    }

    /// Resolves the claim's theme and submits it
    async fn submit_resolved(&self, claim: &mut Claim) -> Result<(ClaimStatus, ClaimStatus), ClaimError> {
        claim.ensure_allows(ClaimAction::Submit)?;
        claim.check_submittable()?;
        let theme = self.resolve_theme(claim).await?;
        claim.submit(&theme)
    }

    /// Get-or-create of the `(theme, department)` theme
    ///
    /// The store's uniqueness constraint decides races: when the insert
    /// conflicts, the theme written by the other request is read back.
    async fn resolve_theme(&self, claim: &Claim) -> Result<ActivityTheme, ClaimError> {
        let name = claim.details().theme.as_str();
        let department = claim.department();

        if let Some(theme) = self.store.find_theme(name, department).await? {
            return Ok(theme);
        }

        let date = claim.details().activity_date.ok_or_else(|| {
            ClaimError::validation("activity_date", "Activity date is required for a new theme")
        })?;
        let theme = ActivityTheme::new(name, department, date);
        match self.store.insert_theme(&theme).await {
            Ok(()) => {
                info!(theme_id = %theme.id, theme = %name, department = %department, "Theme created");
                Ok(theme)
            }
            Err(e) if e.is_conflict() => {
                self.store
                    .find_theme(name, department)
                    .await?
                    .ok_or(ClaimError::Storage(e))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn discard_blobs(&self, paths: &[String]) {
        for path in paths {
            if let Err(e) = self.blobs.delete(path).await {
                warn!(path = %path, error = %e, "Failed to remove stored file");
            }
        }
    }
}

fn log_transition(claim: &Claim, actor: &Actor, from: ClaimStatus, to: ClaimStatus) {
    info!(
        claim_id = %claim.id(),
        actor = %actor.user_id,
        from = %from,
        to = %to,
        "Claim status changed"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::mock::{MockBlobStore, MockClaimStore};
    use crate::user::{Role, User};
    use async_trait::async_trait;
    use core_kernel::{ActivityDate, DomainPort, HealthCheckResult, HealthCheckable, PortError};
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::sync::Mutex;

    struct Harness {
        service: ClaimService,
        store: Arc<MockClaimStore>,
        blobs: Arc<MockBlobStore>,
        applicant: Actor,
        lead: Actor,
    }

    fn harness() -> Harness {
        let store = Arc::new(MockClaimStore::new());
        let blobs = Arc::new(MockBlobStore::new());
        let service = ClaimService::new(store.clone(), blobs.clone(), Timezone::default());
        Harness {
            service,
            store,
            blobs,
            applicant: User::new("amy", Role::Applicant, "Arts").actor(),
            lead: User::new("lee", Role::Lead, "Arts").actor(),
        }
    }

    fn gala() -> ClaimDetails {
        ClaimDetails {
            theme: "Spring Gala".to_string(),
            description: "Decorations for the gala".to_string(),
            activity_date: Some(ActivityDate::new(2024, 4, 20).unwrap()),
            location: "Main Hall".to_string(),
            leader: "Zhang Wei".to_string(),
        }
    }

    fn gala_items() -> Vec<ItemLine> {
        vec![
            ItemLine::new("Flowers", 2, dec!(15.00)),
            ItemLine::new("Banner", 1, dec!(80.00)),
        ]
    }

    // ========================================================================
    // Creation and submission
    // ========================================================================

    mod creation_tests {
        use super::*;

        #[tokio::test]
        async fn test_create_with_items_computes_total() {
            let h = harness();
            let claim = h
                .service
                .create_claim(&h.applicant, gala(), gala_items(), SaveIntent::Draft)
                .await
                .unwrap();

            assert_eq!(claim.status(), ClaimStatus::Draft);
            assert_eq!(claim.total_amount().amount(), dec!(110.00));
            assert_eq!(claim.department(), "Arts");

            let stored = h.store.get_claim(claim.id()).await.unwrap();
            assert_eq!(stored.total_amount().amount(), dec!(110.00));
        }

        #[tokio::test]
        async fn test_invalid_item_saves_nothing() {
            let h = harness();
            let mut items = gala_items();
            items.push(ItemLine::new("Broken", 0, dec!(1.00)));

            let err = h
                .service
                .create_claim(&h.applicant, gala(), items, SaveIntent::Draft)
                .await
                .unwrap_err();
            assert!(matches!(err, ClaimError::Validation { .. }));
            assert_eq!(h.store.claim_count().await, 0);
        }

        #[tokio::test]
        async fn test_admin_cannot_create() {
            let h = harness();
            let admin = User::new("root", Role::Admin, "Arts").actor();
            let err = h
                .service
                .create_claim(&admin, gala(), vec![], SaveIntent::Draft)
                .await
                .unwrap_err();
            assert!(matches!(err, ClaimError::PermissionDenied(_)));
        }

        #[tokio::test]
        async fn test_same_theme_twice_reuses_one_theme() {
            let h = harness();
            let other = User::new("bob", Role::Applicant, "Arts").actor();

            let first = h
                .service
                .create_claim(&h.applicant, gala(), gala_items(), SaveIntent::Submit)
                .await
                .unwrap();
            let second = h
                .service
                .create_claim(&other, gala(), gala_items(), SaveIntent::Submit)
                .await
                .unwrap();

            assert_eq!(h.store.theme_count().await, 1);
            assert_eq!(first.theme_id(), second.theme_id());
            assert!(first.theme_id().is_some());
        }

        #[tokio::test]
        async fn test_blank_date_inherits_theme_date() {
            let h = harness();
            h.service
                .create_claim(&h.applicant, gala(), gala_items(), SaveIntent::Submit)
                .await
                .unwrap();

            let undated = ClaimDetails {
                activity_date: None,
                ..gala()
            };
            let claim = h
                .service
                .create_claim(&h.applicant, undated, gala_items(), SaveIntent::Submit)
                .await
                .unwrap();
            assert_eq!(claim.details().activity_date, Some(ActivityDate::new(2024, 4, 20).unwrap()));
        }

        #[tokio::test]
        async fn test_new_theme_without_date_is_rejected() {
            let h = harness();
            let undated = ClaimDetails {
                activity_date: None,
                ..gala()
            };
            let err = h
                .service
                .create_claim(&h.applicant, undated, gala_items(), SaveIntent::Submit)
                .await
                .unwrap_err();
            assert!(matches!(err, ClaimError::Validation { ref field, .. } if field == "activity_date"));
            assert_eq!(h.store.claim_count().await, 0);
            assert_eq!(h.store.theme_count().await, 0);
        }

        #[tokio::test]
        async fn test_submit_without_leader_is_rejected() {
            let h = harness();
            let details = ClaimDetails {
                leader: String::new(),
                ..gala()
            };
            let err = h
                .service
                .create_claim(&h.applicant, details, gala_items(), SaveIntent::Submit)
                .await
                .unwrap_err();
            assert!(matches!(err, ClaimError::Validation { ref field, .. } if field == "leader"));
        }
    }

    // ========================================================================
    // Review loop
    // ========================================================================

    mod review_tests {
        use super::*;

        #[tokio::test]
        async fn test_reject_then_resubmit() {
            let h = harness();
            let claim = h
                .service
                .create_claim(&h.applicant, gala(), gala_items(), SaveIntent::Submit)
                .await
                .unwrap();

            let rejected = h
                .service
                .review_claim(
                    &h.lead,
                    claim.id(),
                    ReviewDecision::Reject {
                        note: Some("Banner receipt missing".to_string()),
                    },
                )
                .await
                .unwrap();
            assert_eq!(rejected.status(), ClaimStatus::Rejected);
            assert_eq!(
                h.store.get_claim(claim.id()).await.unwrap().reviewer_note(),
                "Banner receipt missing"
            );

            h.service
                .record_item(&h.applicant, claim.id(), ItemLine::new("Tape", 1, dec!(3.50)))
                .await
                .unwrap();
            let resubmitted = h.service.submit_claim(&h.applicant, claim.id()).await.unwrap();
            assert_eq!(resubmitted.status(), ClaimStatus::Submitted);
            assert_eq!(resubmitted.total_amount().amount(), dec!(113.50));
        }

        #[tokio::test]
        async fn test_approve_packs_claim() {
            let h = harness();
            let claim = h
                .service
                .create_claim(&h.applicant, gala(), gala_items(), SaveIntent::Submit)
                .await
                .unwrap();
            let packed = h
                .service
                .review_claim(&h.lead, claim.id(), ReviewDecision::Approve { note: None })
                .await
                .unwrap();
            assert_eq!(packed.status(), ClaimStatus::Packed);

            let err = h
                .service
                .update_claim(&h.applicant, claim.id(), gala(), SaveIntent::Draft)
                .await
                .unwrap_err();
            assert!(matches!(err, ClaimError::InvalidState { status: ClaimStatus::Packed, .. }));
        }

        #[tokio::test]
        async fn test_lead_of_other_department_cannot_review() {
            let h = harness();
            let claim = h
                .service
                .create_claim(&h.applicant, gala(), gala_items(), SaveIntent::Submit)
                .await
                .unwrap();
            let outsider = User::new("sam", Role::Lead, "Sports").actor();

            let err = h
                .service
                .review_claim(&outsider, claim.id(), ReviewDecision::Approve { note: None })
                .await
                .unwrap_err();
            assert!(matches!(err, ClaimError::PermissionDenied(_)));

            let err = h.service.get_claim(&outsider, claim.id()).await.unwrap_err();
            assert!(matches!(err, ClaimError::PermissionDenied(_)));
        }

        #[tokio::test]
        async fn test_approving_a_draft_is_invalid_state() {
            let h = harness();
            let owner = User::new("amy", Role::Lead, "Arts").actor();
            let claim = h
                .service
                .create_claim(&owner, gala(), gala_items(), SaveIntent::Draft)
                .await
                .unwrap();
            let err = h
                .service
                .review_claim(&owner, claim.id(), ReviewDecision::Approve { note: None })
                .await
                .unwrap_err();
            assert!(matches!(err, ClaimError::InvalidState { status: ClaimStatus::Draft, .. }));
        }
    }

    // ========================================================================
    // Items, invoices and deletion
    // ========================================================================

    mod content_tests {
        use super::*;

        #[tokio::test]
        async fn test_item_changes_on_submitted_claim_are_invalid_state() {
            let h = harness();
            let claim = h
                .service
                .create_claim(&h.applicant, gala(), gala_items(), SaveIntent::Submit)
                .await
                .unwrap();
            let item_id = claim.items()[0].id();

            let err = h
                .service
                .update_item(&h.applicant, claim.id(), item_id, ItemLine::new("Flowers", 9, dec!(15)))
                .await
                .unwrap_err();
            assert!(matches!(err, ClaimError::InvalidState { status: ClaimStatus::Submitted, .. }));

            let stored = h.store.get_claim(claim.id()).await.unwrap();
            assert_eq!(stored.total_amount().amount(), dec!(110.00));
        }

        #[tokio::test]
        async fn test_other_applicant_cannot_edit() {
            let h = harness();
            let claim = h
                .service
                .create_claim(&h.applicant, gala(), gala_items(), SaveIntent::Draft)
                .await
                .unwrap();
            let other = User::new("bob", Role::Applicant, "Arts").actor();
            let err = h
                .service
                .record_item(&other, claim.id(), ItemLine::new("Tape", 1, dec!(1)))
                .await
                .unwrap_err();
            assert!(matches!(err, ClaimError::PermissionDenied(_)));
        }

        #[tokio::test]
        async fn test_attach_and_remove_invoice() {
            let h = harness();
            let claim = h
                .service
                .create_claim(&h.applicant, gala(), gala_items(), SaveIntent::Draft)
                .await
                .unwrap();
            let item_id = claim.items()[0].id();

            let invoice = h
                .service
                .attach_invoice(&h.applicant, claim.id(), item_id, "flowers.jpg", b"jpeg".to_vec())
                .await
                .unwrap();
            assert!(invoice.stored_path.starts_with("invoices/"));
            assert!(h.blobs.contains(&invoice.stored_path).await);

            let updated = h.service.remove_invoice(&h.applicant, invoice.id).await.unwrap();
            assert!(updated.invoice(invoice.id).is_none());
            assert!(!h.blobs.contains(&invoice.stored_path).await);
        }

        #[tokio::test]
        async fn test_removing_item_removes_its_invoices() {
            let h = harness();
            let claim = h
                .service
                .create_claim(&h.applicant, gala(), gala_items(), SaveIntent::Draft)
                .await
                .unwrap();
            let item_id = claim.items()[0].id();
            let invoice = h
                .service
                .attach_invoice(&h.applicant, claim.id(), item_id, "a.pdf", b"pdf".to_vec())
                .await
                .unwrap();

            let updated = h.service.remove_item(&h.applicant, claim.id(), item_id).await.unwrap();
            assert_eq!(updated.total_amount().amount(), dec!(80.00));
            assert!(h.store.find_claim_by_invoice(invoice.id).await.is_err());
            assert!(h.blobs.is_empty().await);
        }

        #[tokio::test]
        async fn test_delete_claim_cascades() {
            let h = harness();
            let claim = h
                .service
                .create_claim(&h.applicant, gala(), gala_items(), SaveIntent::Draft)
                .await
                .unwrap();
            let item_id = claim.items()[1].id();
            h.service
                .attach_invoice(&h.applicant, claim.id(), item_id, "banner.png", b"png".to_vec())
                .await
                .unwrap();

            h.service.delete_claim(&h.applicant, claim.id()).await.unwrap();
            assert_eq!(h.store.claim_count().await, 0);
            assert!(h.blobs.is_empty().await);
        }

        #[tokio::test]
        async fn test_submitted_claim_cannot_be_deleted() {
            let h = harness();
            let claim = h
                .service
                .create_claim(&h.applicant, gala(), gala_items(), SaveIntent::Submit)
                .await
                .unwrap();
            let err = h.service.delete_claim(&h.applicant, claim.id()).await.unwrap_err();
            assert!(matches!(err, ClaimError::InvalidState { .. }));
        }

        #[tokio::test]
        async fn test_unknown_claim_is_not_found() {
            let h = harness();
            let err = h.service.get_claim(&h.applicant, ClaimId::new()).await.unwrap_err();
            assert!(matches!(err, ClaimError::NotFound { .. }));
        }
    }

    // ========================================================================
    // Listing
    // ========================================================================

    mod listing_tests {
        use super::*;

        #[tokio::test]
        async fn test_lead_lists_department_non_drafts() {
            let h = harness();
            h.service
                .create_claim(&h.applicant, gala(), gala_items(), SaveIntent::Draft)
                .await
                .unwrap();
            let submitted = h
                .service
                .create_claim(&h.applicant, gala(), gala_items(), SaveIntent::Submit)
                .await
                .unwrap();
            let sports = User::new("tom", Role::Applicant, "Sports").actor();
            h.service
                .create_claim(&sports, ClaimDetails::new("Marathon"), vec![], SaveIntent::Draft)
                .await
                .unwrap();

            let listed = h.service.list_claims(&h.lead).await.unwrap();
            assert_eq!(listed.len(), 1);
            assert_eq!(listed[0].id(), submitted.id());

            let own = h.service.list_claims(&h.applicant).await.unwrap();
            assert_eq!(own.len(), 2);
        }

        #[tokio::test]
        async fn test_list_themes_is_department_scoped() {
            let h = harness();
            h.service
                .create_claim(&h.applicant, gala(), gala_items(), SaveIntent::Submit)
                .await
                .unwrap();
            let sports = User::new("tom", Role::Applicant, "Sports").actor();

            assert_eq!(h.service.list_themes(&h.applicant).await.unwrap().len(), 1);
            assert!(h.service.list_themes(&sports).await.unwrap().is_empty());
        }
    }

    // ========================================================================
    // Theme race
    // ========================================================================

    /// A store whose first theme lookup misses, as if another request
    /// inserted the theme between lookup and insert.
    struct RacingStore {
        inner: MockClaimStore,
        missed: AtomicBool,
    }

    impl DomainPort for RacingStore {}

    #[async_trait]
    impl HealthCheckable for RacingStore {
        async fn health_check(&self) -> HealthCheckResult {
            self.inner.health_check().await
        }
    }

    #[async_trait]
    impl ClaimStore for RacingStore {
        async fn get_claim(&self, id: ClaimId) -> Result<Claim, PortError> {
            self.inner.get_claim(id).await
        }
        async fn find_claims(&self, query: crate::ports::ClaimQuery) -> Result<Vec<Claim>, PortError> {
            self.inner.find_claims(query).await
        }
        async fn find_claim_by_invoice(&self, id: InvoiceId) -> Result<Claim, PortError> {
            self.inner.find_claim_by_invoice(id).await
        }
        async fn save_claim(&self, claim: &Claim, expected: Option<ClaimStatus>) -> Result<(), PortError> {
            self.inner.save_claim(claim, expected).await
        }
        async fn delete_claim(&self, id: ClaimId, expected: Option<ClaimStatus>) -> Result<(), PortError> {
            self.inner.delete_claim(id, expected).await
        }
        async fn find_theme(&self, name: &str, department: &str) -> Result<Option<ActivityTheme>, PortError> {
            if !self.missed.swap(true, Ordering::SeqCst) {
                return Ok(None);
            }
            self.inner.find_theme(name, department).await
        }
        async fn insert_theme(&self, theme: &ActivityTheme) -> Result<(), PortError> {
            self.inner.insert_theme(theme).await
        }
        async fn list_themes(&self, department: &str) -> Result<Vec<ActivityTheme>, PortError> {
            self.inner.list_themes(department).await
        }
    }

    #[tokio::test]
    async fn test_theme_conflict_reads_back_existing_theme() {
        let inner = MockClaimStore::new();
        let existing = ActivityTheme::new("Spring Gala", "Arts", ActivityDate::new(2024, 4, 1).unwrap());
        inner.insert_theme(&existing).await.unwrap();

        let store = Arc::new(RacingStore {
            inner: inner.clone(),
            missed: AtomicBool::new(false),
        });
        let service = ClaimService::new(store, Arc::new(MockBlobStore::new()), Timezone::default());
        let actor = User::new("amy", Role::Applicant, "Arts").actor();

        let claim = service
            .create_claim(&actor, gala(), gala_items(), SaveIntent::Submit)
            .await
            .unwrap();
        assert_eq!(claim.theme_id(), Some(existing.id));
        assert_eq!(inner.theme_count().await, 1);
        // the claim keeps its own date when it has one
        assert_eq!(claim.details().activity_date, Some(ActivityDate::new(2024, 4, 20).unwrap()));
    }

    /// A store that answers the next claim read with an earlier snapshot,
    /// as if the request loaded the claim before a concurrent change.
    struct StaleStore {
        inner: MockClaimStore,
        snapshot: Mutex<Option<Claim>>,
    }

    impl DomainPort for StaleStore {}

    #[async_trait]
    impl HealthCheckable for StaleStore {
        async fn health_check(&self) -> HealthCheckResult {
            self.inner.health_check().await
        }
    }

    #[async_trait]
    impl ClaimStore for StaleStore {
        async fn get_claim(&self, id: ClaimId) -> Result<Claim, PortError> {
            match self.snapshot.lock().await.take() {
                Some(claim) => Ok(claim),
                None => self.inner.get_claim(id).await,
            }
        }
        async fn find_claims(&self, query: crate::ports::ClaimQuery) -> Result<Vec<Claim>, PortError> {
            self.inner.find_claims(query).await
        }
        async fn find_claim_by_invoice(&self, id: InvoiceId) -> Result<Claim, PortError> {
            self.inner.find_claim_by_invoice(id).await
        }
        async fn save_claim(&self, claim: &Claim, expected: Option<ClaimStatus>) -> Result<(), PortError> {
            self.inner.save_claim(claim, expected).await
        }
        async fn delete_claim(&self, id: ClaimId, expected: Option<ClaimStatus>) -> Result<(), PortError> {
            self.inner.delete_claim(id, expected).await
        }
        async fn find_theme(&self, name: &str, department: &str) -> Result<Option<ActivityTheme>, PortError> {
            self.inner.find_theme(name, department).await
        }
        async fn insert_theme(&self, theme: &ActivityTheme) -> Result<(), PortError> {
            self.inner.insert_theme(theme).await
        }
        async fn list_themes(&self, department: &str) -> Result<Vec<ActivityTheme>, PortError> {
            self.inner.list_themes(department).await
        }
    }

    fn stale_harness() -> (ClaimService, Arc<StaleStore>, Actor, Actor) {
        let store = Arc::new(StaleStore {
            inner: MockClaimStore::new(),
            snapshot: Mutex::new(None),
        });
        let service = ClaimService::new(store.clone(), Arc::new(MockBlobStore::new()), Timezone::default());
        let applicant = User::new("amy", Role::Applicant, "Arts").actor();
        let lead = User::new("lee", Role::Lead, "Arts").actor();
        (service, store, applicant, lead)
    }

    #[tokio::test]
    async fn test_edit_loaded_before_approval_does_not_reopen_claim() {
        let (service, store, applicant, lead) = stale_harness();
        let draft = service
            .create_claim(&applicant, gala(), gala_items(), SaveIntent::Draft)
            .await
            .unwrap();
        service.submit_claim(&applicant, draft.id()).await.unwrap();
        service
            .review_claim(&lead, draft.id(), ReviewDecision::Approve { note: None })
            .await
            .unwrap();

        *store.snapshot.lock().await = Some(draft.clone());
        let err = service
            .record_item(&applicant, draft.id(), ItemLine::new("Tape", 1, dec!(3.00)))
            .await
            .unwrap_err();
        assert!(matches!(err, ClaimError::Storage(ref e) if e.is_conflict()));

        let stored = store.inner.get_claim(draft.id()).await.unwrap();
        assert_eq!(stored.status(), ClaimStatus::Packed);
        assert_eq!(stored.total_amount().amount(), dec!(110.00));
        assert_eq!(stored.items().len(), 2);
    }

    #[tokio::test]
    async fn test_delete_loaded_before_submit_keeps_claim() {
        let (service, store, applicant, _) = stale_harness();
        let draft = service
            .create_claim(&applicant, gala(), gala_items(), SaveIntent::Draft)
            .await
            .unwrap();
        service.submit_claim(&applicant, draft.id()).await.unwrap();

        *store.snapshot.lock().await = Some(draft.clone());
        let err = service.delete_claim(&applicant, draft.id()).await.unwrap_err();
        assert!(matches!(err, ClaimError::Storage(ref e) if e.is_conflict()));
        assert_eq!(
            store.inner.get_claim(draft.id()).await.unwrap().status(),
            ClaimStatus::Submitted
        );
    }
}
