//! PostgreSQL adapter tests
//!
//! Each test starts its own container; run with `cargo test -- --ignored`.

use std::sync::Arc;

use rust_decimal_macros::dec;

use core_kernel::{AdapterHealth, HealthCheckable, Timezone, UserId};
use domain_claims::ports::mock::MockBlobStore;
use domain_claims::{
    ClaimQuery, ClaimService, ClaimStatus, ClaimStore, ItemLine, ReviewDecision, SaveIntent,
    UserDirectory,
};
use infra_db::{PostgresClaimStore, PostgresUserDirectory};
use test_utils::{db_test, assert_total_is_item_sum, ClaimBuilder, ClaimFixtures, UserFixtures, ARTS};

// ============================================================================
// Claim store
// ============================================================================

mod claim_store_tests {
    use super::*;

    db_test!(test_submitted_claim_round_trip, |db| {
        let amy = UserFixtures::amy();
        db.seed_users(&[amy.clone()]).await.unwrap();
        let store = PostgresClaimStore::new(db.pool().clone());

        let theme = ClaimFixtures::gala_theme(ARTS);
        store.insert_theme(&theme).await.unwrap();
        let claim = ClaimBuilder::new()
            .owned_by(&amy)
            .receipts(&["flowers.jpg"])
            .status(ClaimStatus::Submitted)
            .build_under(&theme);
        store.save_claim(&claim, None).await.unwrap();

        let loaded = store.get_claim(claim.id()).await.unwrap();
        assert_eq!(loaded.status(), ClaimStatus::Submitted);
        assert_eq!(loaded.theme_id(), Some(theme.id));
        assert_eq!(loaded.details(), claim.details());
        assert_eq!(loaded.total_amount(), ClaimFixtures::gala_total());
        let names: Vec<&str> = loaded.items().iter().map(|i| i.name()).collect();
        assert_eq!(names, ["Flowers", "Banner"]);
        assert_eq!(loaded.items()[0].unit(), "bunch");
        assert_eq!(loaded.items()[0].invoices()[0].file_name, "flowers.jpg");
        assert_total_is_item_sum(&loaded);

        let by_invoice = store
            .find_claim_by_invoice(loaded.items()[0].invoices()[0].id)
            .await
            .unwrap();
        assert_eq!(by_invoice.id(), claim.id());
    });

    db_test!(test_removed_item_is_deleted_on_save, |db| {
        let amy = UserFixtures::amy();
        db.seed_users(&[amy.clone()]).await.unwrap();
        let store = PostgresClaimStore::new(db.pool().clone());

        let mut claim = ClaimBuilder::new().owned_by(&amy).build();
        store.save_claim(&claim, None).await.unwrap();

        let banner = claim.items()[1].id();
        claim.remove_item(banner).unwrap();
        claim
            .add_item(&ItemLine::new("Tape", 3, dec!(2.50)))
            .unwrap();
        store.save_claim(&claim, None).await.unwrap();

        let loaded = store.get_claim(claim.id()).await.unwrap();
        assert_eq!(loaded.items().len(), 2);
        assert!(loaded.item(banner).is_none());
        assert_eq!(loaded.total_amount().amount(), dec!(37.50));
    });

    db_test!(test_delete_claim, |db| {
        let amy = UserFixtures::amy();
        db.seed_users(&[amy.clone()]).await.unwrap();
        let store = PostgresClaimStore::new(db.pool().clone());

        let claim = ClaimBuilder::new().owned_by(&amy).receipts(&["a.pdf"]).build();
        store.save_claim(&claim, None).await.unwrap();
        let err = store
            .delete_claim(claim.id(), Some(ClaimStatus::Submitted))
            .await
            .unwrap_err();
        assert!(err.is_conflict());

        store.delete_claim(claim.id(), Some(ClaimStatus::Draft)).await.unwrap();
        assert!(store.get_claim(claim.id()).await.unwrap_err().is_not_found());
        assert!(store.delete_claim(claim.id(), None).await.unwrap_err().is_not_found());
    });

    db_test!(test_save_from_stale_status_is_refused, |db| {
        let amy = UserFixtures::amy();
        db.seed_users(&[amy.clone()]).await.unwrap();
        let store = PostgresClaimStore::new(db.pool().clone());

        let theme = ClaimFixtures::gala_theme(ARTS);
        store.insert_theme(&theme).await.unwrap();
        let mut draft = ClaimBuilder::new().owned_by(&amy).build_under(&theme);
        store.save_claim(&draft, None).await.unwrap();

        let mut packed = draft.clone();
        packed.submit(&theme).unwrap();
        packed.approve(None).unwrap();
        store.save_claim(&packed, Some(ClaimStatus::Draft)).await.unwrap();

        draft.add_item(&ItemLine::new("Tape", 1, dec!(3.00))).unwrap();
        let err = store
            .save_claim(&draft, Some(ClaimStatus::Draft))
            .await
            .unwrap_err();
        assert!(err.is_conflict());

        let loaded = store.get_claim(draft.id()).await.unwrap();
        assert_eq!(loaded.status(), ClaimStatus::Packed);
        assert_eq!(loaded.total_amount(), ClaimFixtures::gala_total());
    });

    db_test!(test_queries_follow_visibility, |db| {
        let amy = UserFixtures::amy();
        let lead = UserFixtures::arts_lead();
        db.seed_users(&[amy.clone(), lead.clone()]).await.unwrap();
        let store = PostgresClaimStore::new(db.pool().clone());

        let theme = ClaimFixtures::gala_theme(ARTS);
        store.insert_theme(&theme).await.unwrap();
        for status in [ClaimStatus::Draft, ClaimStatus::Submitted, ClaimStatus::Packed, ClaimStatus::Rejected] {
            let claim = ClaimBuilder::new().owned_by(&amy).status(status).build_under(&theme);
            store.save_claim(&claim, None).await.unwrap();
        }
        let own_draft = ClaimBuilder::new().owned_by(&lead).theme("Lead draft").build();
        store.save_claim(&own_draft, None).await.unwrap();

        let mine = store.find_claims(ClaimQuery::owned_by(amy.id)).await.unwrap();
        assert_eq!(mine.len(), 4);

        let visible = store
            .find_claims(ClaimQuery::visible_to_lead(lead.id, ARTS))
            .await
            .unwrap();
        assert_eq!(visible.len(), 4);
        assert!(visible.iter().any(|c| c.id() == own_draft.id()));
        assert!(!visible
            .iter()
            .any(|c| c.applicant_id() == amy.id && c.status() == ClaimStatus::Draft));

        let exportable = store.find_claims(ClaimQuery::exportable(ARTS)).await.unwrap();
        let mut statuses: Vec<ClaimStatus> = exportable.iter().map(|c| c.status()).collect();
        statuses.sort_by_key(|s| s.as_str());
        assert_eq!(statuses, [ClaimStatus::Packed, ClaimStatus::Submitted]);
    });

    db_test!(test_theme_key_is_unique, |db| {
        let store = PostgresClaimStore::new(db.pool().clone());
        store.insert_theme(&ClaimFixtures::gala_theme(ARTS)).await.unwrap();

        let err = store
            .insert_theme(&ClaimFixtures::gala_theme(ARTS))
            .await
            .unwrap_err();
        assert!(err.is_conflict());

        store.insert_theme(&ClaimFixtures::gala_theme("Science")).await.unwrap();
        let found = store.find_theme("Spring Gala", ARTS).await.unwrap().unwrap();
        assert_eq!(found.activity_date, ClaimFixtures::gala_date());
        assert_eq!(store.list_themes(ARTS).await.unwrap().len(), 1);
    });

    db_test!(test_health_check, |db| {
        let store = PostgresClaimStore::new(db.pool().clone());
        assert_eq!(store.health_check().await.status, AdapterHealth::Healthy);
    });
}

// ============================================================================
// User directory
// ============================================================================

mod user_directory_tests {
    use super::*;

    db_test!(test_users_are_read_back, |db| {
        let amy = UserFixtures::amy();
        let lead = UserFixtures::arts_lead();
        db.seed_users(&[amy.clone(), lead.clone()]).await.unwrap();
        let directory = PostgresUserDirectory::new(db.pool().clone());

        let loaded = directory.get_user(amy.id).await.unwrap();
        assert_eq!(loaded.username, "amy");
        assert_eq!(loaded.student_id.as_deref(), Some("20240001"));
        assert_eq!(loaded.actor(), amy.actor());

        let many = directory.get_users(&[amy.id, lead.id, UserId::new()]).await.unwrap();
        assert_eq!(many.len(), 2);

        assert!(directory.get_user(UserId::new()).await.unwrap_err().is_not_found());
    });
}

// ============================================================================
// Service over PostgreSQL
// ============================================================================

mod service_tests {
    use super::*;

    db_test!(test_lifecycle_against_postgres, |db| {
        let amy = UserFixtures::amy();
        let bob = UserFixtures::bob();
        let lead = UserFixtures::arts_lead();
        db.seed_users(&[amy.clone(), bob.clone(), lead.clone()]).await.unwrap();

        let store = Arc::new(PostgresClaimStore::new(db.pool().clone()));
        let service = ClaimService::new(store.clone(), Arc::new(MockBlobStore::new()), Timezone::default());

        let first = service
            .create_claim(&amy.actor(), ClaimFixtures::gala_details(), ClaimFixtures::gala_lines(), SaveIntent::Submit)
            .await
            .unwrap();
        let mut details = ClaimFixtures::gala_details();
        details.activity_date = None;
        let second = service
            .create_claim(&bob.actor(), details, ClaimFixtures::gala_lines(), SaveIntent::Submit)
            .await
            .unwrap();

        assert_eq!(first.theme_id(), second.theme_id());
        assert_eq!(second.details().activity_date, Some(ClaimFixtures::gala_date()));

        let approved = service
            .review_claim(&lead.actor(), first.id(), ReviewDecision::Approve { note: None })
            .await
            .unwrap();
        assert_eq!(approved.status(), ClaimStatus::Packed);
        assert_eq!(
            store.get_claim(first.id()).await.unwrap().status(),
            ClaimStatus::Packed
        );
    });
}
