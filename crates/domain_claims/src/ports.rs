//! Claim Domain Ports
//!
//! The lifecycle and export services reach storage only through these
//! traits:
//!
//! - [`ClaimStore`]: claims with their items and invoices, and activity themes
//! - [`UserDirectory`]: read access to registered users
//! - [`BlobStore`]: the receipt files themselves
//!
//! PostgreSQL adapters live in `infra_db`, the filesystem blob store in
//! `infra_storage`. In-memory adapters for tests are in [`mock`] behind the
//! `mock` feature.

use async_trait::async_trait;

use core_kernel::{ClaimId, DomainPort, HealthCheckable, InvoiceId, PortError, UserId};

use crate::claim::{Claim, ClaimStatus};
use crate::theme::ActivityTheme;
use crate::user::User;

/// Which claims to load
///
/// A claim matches when it passes every set filter, or when it belongs to
/// `include_owned_by`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimQuery {
    /// Only claims of this applicant
    pub applicant_id: Option<UserId>,
    /// Only claims of this department
    pub department: Option<String>,
    /// Only claims in one of these statuses; empty means any
    pub statuses: Vec<ClaimStatus>,
    /// Also return every claim of this applicant
    pub include_owned_by: Option<UserId>,
}

impl ClaimQuery {
    pub fn owned_by(applicant_id: UserId) -> Self {
        Self {
            applicant_id: Some(applicant_id),
            ..Default::default()
        }
    }

    /// Non-draft claims of a department plus the lead's own claims
    pub fn visible_to_lead(lead_id: UserId, department: &str) -> Self {
        Self {
            department: Some(department.to_string()),
            statuses: vec![ClaimStatus::Submitted, ClaimStatus::Packed, ClaimStatus::Rejected],
            include_owned_by: Some(lead_id),
            ..Default::default()
        }
    }

    /// Submitted and packed claims of a department
    pub fn exportable(department: &str) -> Self {
        Self {
            department: Some(department.to_string()),
            statuses: vec![ClaimStatus::Submitted, ClaimStatus::Packed],
            ..Default::default()
        }
    }

    pub fn matches(&self, claim: &Claim) -> bool {
        let filtered = self.applicant_id.map_or(true, |id| claim.applicant_id() == id)
            && self
                .department
                .as_deref()
                .map_or(true, |d| claim.department() == d)
            && (self.statuses.is_empty() || self.statuses.contains(&claim.status()));
        filtered || self.include_owned_by == Some(claim.applicant_id())
    }
}

/// Persistence for claims and activity themes
///
/// A claim is always read and written whole: header, items and invoices.
#[async_trait]
pub trait ClaimStore: DomainPort + HealthCheckable {
    /// Loads a claim, or `PortError::NotFound`
    async fn get_claim(&self, id: ClaimId) -> Result<Claim, PortError>;

    /// Loads every matching claim, newest first
    ///
    /// All returned claims come from one consistent read.
    async fn find_claims(&self, query: ClaimQuery) -> Result<Vec<Claim>, PortError>;

    /// Loads the claim owning an invoice, or `PortError::NotFound`
    async fn find_claim_by_invoice(&self, invoice_id: InvoiceId) -> Result<Claim, PortError>;

    /// Inserts or replaces a claim in one atomic unit
    ///
    /// Items and invoices missing from `claim` are deleted, and the stored
    /// total is recomputed from the stored items in the same unit.
    ///
    /// # Arguments
    ///
    /// * `claim` - The whole claim graph to write
    /// * `expected` - Status the stored claim must still have; `None` writes
    ///   unconditionally and is used for new claims
    ///
    /// # Errors
    ///
    /// `PortError::Conflict` when the stored status differs from `expected`,
    /// `PortError::NotFound` when `expected` is set and the claim is gone.
    async fn save_claim(&self, claim: &Claim, expected: Option<ClaimStatus>) -> Result<(), PortError>;

    /// Deletes a claim with its items and invoices
    ///
    /// `expected` guards the delete the same way as in [`save_claim`](Self::save_claim).
    async fn delete_claim(&self, id: ClaimId, expected: Option<ClaimStatus>) -> Result<(), PortError>;

    /// Looks up the theme keyed by `(name, department)`
    async fn find_theme(&self, name: &str, department: &str)
        -> Result<Option<ActivityTheme>, PortError>;

    /// Inserts a theme; `PortError::Conflict` if the key already exists
    async fn insert_theme(&self, theme: &ActivityTheme) -> Result<(), PortError>;

    /// Themes of a department, newest first
    async fn list_themes(&self, department: &str) -> Result<Vec<ActivityTheme>, PortError>;
}

/// Read access to registered users
#[async_trait]
pub trait UserDirectory: DomainPort + HealthCheckable {
    async fn get_user(&self, id: UserId) -> Result<User, PortError>;

    /// Loads several users; unknown ids are left out
    async fn get_users(&self, ids: &[UserId]) -> Result<Vec<User>, PortError>;
}

/// Path-addressed storage for receipt files
#[async_trait]
pub trait BlobStore: DomainPort + HealthCheckable {
    async fn put(&self, path: &str, bytes: Vec<u8>) -> Result<(), PortError>;

    async fn get(&self, path: &str) -> Result<Vec<u8>, PortError>;

    /// Removes a file; removing a missing file is not an error
    async fn delete(&self, path: &str) -> Result<(), PortError>;
}

/// In-memory adapters for testing
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use core_kernel::HealthCheckResult;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    fn healthy(adapter_id: &str) -> HealthCheckResult {
        HealthCheckResult::healthy(adapter_id, 0)
    }

    fn check_status(id: ClaimId, stored: ClaimStatus, expected: ClaimStatus) -> Result<(), PortError> {
        if stored != expected {
            return Err(PortError::conflict(format!(
                "Claim {id} is {stored}, expected {expected}"
            )));
        }
        Ok(())
    }

    /// In-memory claim and theme storage
    #[derive(Debug, Default, Clone)]
    pub struct MockClaimStore {
        claims: Arc<RwLock<HashMap<ClaimId, Claim>>>,
        themes: Arc<RwLock<Vec<ActivityTheme>>>,
    }

    impl MockClaimStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Number of stored themes
        pub async fn theme_count(&self) -> usize {
            self.themes.read().await.len()
        }

        /// Number of stored claims
        pub async fn claim_count(&self) -> usize {
            self.claims.read().await.len()
        }
    }

    impl DomainPort for MockClaimStore {}

    #[async_trait]
    impl HealthCheckable for MockClaimStore {
        async fn health_check(&self) -> HealthCheckResult {
            healthy("mock-claim-store")
        }
    }

    #[async_trait]
    impl ClaimStore for MockClaimStore {
        async fn get_claim(&self, id: ClaimId) -> Result<Claim, PortError> {
            self.claims
                .read()
                .await
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Claim", id))
        }

        async fn find_claims(&self, query: ClaimQuery) -> Result<Vec<Claim>, PortError> {
            let claims = self.claims.read().await;
            let mut results: Vec<Claim> = claims
                .values()
                .filter(|c| query.matches(c))
                .cloned()
                .collect();
            results.sort_by(|a, b| {
                b.created_at()
                    .cmp(&a.created_at())
                    .then_with(|| b.id().as_uuid().cmp(a.id().as_uuid()))
            });
            Ok(results)
        }

        async fn find_claim_by_invoice(&self, invoice_id: InvoiceId) -> Result<Claim, PortError> {
            self.claims
                .read()
                .await
                .values()
                .find(|c| c.invoice(invoice_id).is_some())
                .cloned()
                .ok_or_else(|| PortError::not_found("Invoice", invoice_id))
        }

        async fn save_claim(&self, claim: &Claim, expected: Option<ClaimStatus>) -> Result<(), PortError> {
            let mut claims = self.claims.write().await;
            if let Some(expected) = expected {
                let stored = claims
                    .get(&claim.id())
                    .ok_or_else(|| PortError::not_found("Claim", claim.id()))?;
                check_status(claim.id(), stored.status(), expected)?;
            }
            claims.insert(claim.id(), claim.clone());
            Ok(())
        }

        async fn delete_claim(&self, id: ClaimId, expected: Option<ClaimStatus>) -> Result<(), PortError> {
            let mut claims = self.claims.write().await;
            let stored = claims.get(&id).ok_or_else(|| PortError::not_found("Claim", id))?;
            if let Some(expected) = expected {
                check_status(id, stored.status(), expected)?;
            }
            claims.remove(&id);
            Ok(())
        }

        async fn find_theme(
            &self,
            name: &str,
            department: &str,
        ) -> Result<Option<ActivityTheme>, PortError> {
            Ok(self
                .themes
                .read()
                .await
                .iter()
                .find(|t| t.is_keyed_by(name, department))
                .cloned())
        }

        async fn insert_theme(&self, theme: &ActivityTheme) -> Result<(), PortError> {
            let mut themes = self.themes.write().await;
            if themes.iter().any(|t| t.is_keyed_by(&theme.name, &theme.department)) {
                return Err(PortError::conflict(format!(
                    "Theme '{}' already exists in {}",
                    theme.name, theme.department
                )));
            }
            themes.push(theme.clone());
            Ok(())
        }

        async fn list_themes(&self, department: &str) -> Result<Vec<ActivityTheme>, PortError> {
            let themes = self.themes.read().await;
            let mut results: Vec<ActivityTheme> = themes
                .iter()
                .filter(|t| t.department == department)
                .cloned()
                .collect();
            results.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(results)
        }
    }

    /// In-memory user directory
    #[derive(Debug, Default, Clone)]
    pub struct MockUserDirectory {
        users: Arc<RwLock<HashMap<UserId, User>>>,
    }

    impl MockUserDirectory {
        pub fn new() -> Self {
            Self::default()
        }

        /// Pre-populates with users for testing
        pub async fn with_users(users: Vec<User>) -> Self {
            let directory = Self::new();
            for user in users {
                directory.insert(user).await;
            }
            directory
        }

        pub async fn insert(&self, user: User) {
            self.users.write().await.insert(user.id, user);
        }
    }

    impl DomainPort for MockUserDirectory {}

    #[async_trait]
    impl HealthCheckable for MockUserDirectory {
        async fn health_check(&self) -> HealthCheckResult {
            healthy("mock-user-directory")
        }
    }

    #[async_trait]
    impl UserDirectory for MockUserDirectory {
        async fn get_user(&self, id: UserId) -> Result<User, PortError> {
            self.users
                .read()
                .await
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("User", id))
        }

        async fn get_users(&self, ids: &[UserId]) -> Result<Vec<User>, PortError> {
            let users = self.users.read().await;
            Ok(ids.iter().filter_map(|id| users.get(id).cloned()).collect())
        }
    }

    /// In-memory blob storage
    #[derive(Debug, Default, Clone)]
    pub struct MockBlobStore {
        blobs: Arc<RwLock<HashMap<String, Vec<u8>>>>,
    }

    impl MockBlobStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub async fn contains(&self, path: &str) -> bool {
            self.blobs.read().await.contains_key(path)
        }

        pub async fn len(&self) -> usize {
            self.blobs.read().await.len()
        }

        pub async fn is_empty(&self) -> bool {
            self.blobs.read().await.is_empty()
        }
    }

    impl DomainPort for MockBlobStore {}

    #[async_trait]
    impl HealthCheckable for MockBlobStore {
        async fn health_check(&self) -> HealthCheckResult {
            healthy("mock-blob-store")
        }
    }

    #[async_trait]
    impl BlobStore for MockBlobStore {
        async fn put(&self, path: &str, bytes: Vec<u8>) -> Result<(), PortError> {
            self.blobs.write().await.insert(path.to_string(), bytes);
            Ok(())
        }

        async fn get(&self, path: &str) -> Result<Vec<u8>, PortError> {
            self.blobs
                .read()
                .await
                .get(path)
                .cloned()
                .ok_or_else(|| PortError::not_found("Blob", path))
        }

        async fn delete(&self, path: &str) -> Result<(), PortError> {
            self.blobs.write().await.remove(path);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::{MockBlobStore, MockClaimStore};
    use super::*;
    use crate::claim::ClaimDetails;
    use core_kernel::ActivityDate;

    #[tokio::test]
    async fn test_mock_theme_insert_conflicts_on_duplicate_key() {
        let store = MockClaimStore::new();
        let date = ActivityDate::new(2024, 4, 1).unwrap();
        store
            .insert_theme(&ActivityTheme::new("Spring Gala", "Arts", date))
            .await
            .unwrap();

        let err = store
            .insert_theme(&ActivityTheme::new("Spring Gala", "Arts", date))
            .await
            .unwrap_err();
        assert!(err.is_conflict());

        // same name, other department is a different theme
        store
            .insert_theme(&ActivityTheme::new("Spring Gala", "Sports", date))
            .await
            .unwrap();
        assert_eq!(store.theme_count().await, 2);
    }

    #[tokio::test]
    async fn test_mock_save_checks_expected_status() {
        let store = MockClaimStore::new();
        let claim = Claim::new(UserId::new(), "Arts", ClaimDetails::new("Gala"));
        store.save_claim(&claim, None).await.unwrap();
        store.save_claim(&claim, Some(ClaimStatus::Draft)).await.unwrap();

        let err = store
            .save_claim(&claim, Some(ClaimStatus::Submitted))
            .await
            .unwrap_err();
        assert!(err.is_conflict());
        let err = store
            .delete_claim(claim.id(), Some(ClaimStatus::Rejected))
            .await
            .unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(store.claim_count().await, 1);

        let other = Claim::new(UserId::new(), "Arts", ClaimDetails::new("Gala"));
        let err = store
            .save_claim(&other, Some(ClaimStatus::Draft))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_query_includes_own_claims_of_lead() {
        let lead = UserId::new();
        let own_draft = Claim::new(lead, "Arts", ClaimDetails::new("Gala"));
        let others_draft = Claim::new(UserId::new(), "Arts", ClaimDetails::new("Gala"));

        let query = ClaimQuery::visible_to_lead(lead, "Arts");
        assert!(query.matches(&own_draft));
        assert!(!query.matches(&others_draft));
    }

    #[tokio::test]
    async fn test_mock_blob_store_round_trip() {
        let blobs = MockBlobStore::new();
        blobs.put("invoices/a.pdf", b"%PDF".to_vec()).await.unwrap();
        assert_eq!(blobs.get("invoices/a.pdf").await.unwrap(), b"%PDF".to_vec());

        blobs.delete("invoices/a.pdf").await.unwrap();
        assert!(blobs.get("invoices/a.pdf").await.unwrap_err().is_not_found());
        // deleting twice is fine
        blobs.delete("invoices/a.pdf").await.unwrap();
    }
}
