//! Filesystem blob store tests

use domain_claims::{BlobStore, Invoice};
use infra_storage::LocalBlobStore;
use core_kernel::{AdapterHealth, HealthCheckable, ItemId, PortError};

// ============================================================================
// Round trip
// ============================================================================

mod round_trip_tests {
    use super::*;

    #[tokio::test]
    async fn test_put_creates_dated_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path());

        store
            .put("invoices/2024/05/12/ab12cd34_taxi.pdf", b"%PDF-1.4".to_vec())
            .await
            .unwrap();

        let on_disk = dir.path().join("invoices/2024/05/12/ab12cd34_taxi.pdf");
        assert!(on_disk.is_file());
        assert_eq!(
            store.get("invoices/2024/05/12/ab12cd34_taxi.pdf").await.unwrap(),
            b"%PDF-1.4"
        );
    }

    #[tokio::test]
    async fn test_put_overwrites_and_leaves_no_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path());

        store.put("a/receipt.jpg", vec![1, 2, 3]).await.unwrap();
        store.put("a/receipt.jpg", vec![9]).await.unwrap();

        assert_eq!(store.get("a/receipt.jpg").await.unwrap(), vec![9]);
        let names: Vec<String> = std::fs::read_dir(dir.path().join("a"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["receipt.jpg".to_string()]);
    }

    #[tokio::test]
    async fn test_long_chinese_file_name_is_stored() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path());
        let date = chrono::NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
        let name = format!("{}.pdf", "发".repeat(100));
        let invoice = Invoice::new(ItemId::new(), &name, date);

        store.put(&invoice.stored_path, b"%PDF".to_vec()).await.unwrap();

        assert_eq!(store.get(&invoice.stored_path).await.unwrap(), b"%PDF");
        assert_eq!(invoice.file_name, name);
    }
}

// ============================================================================
// Missing files and bad keys
// ============================================================================

mod failure_tests {
    use super::*;

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path());

        let err = store.get("invoices/2024/01/01/nothing.png").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path());

        store.put("x/y.txt", b"hi".to_vec()).await.unwrap();
        store.delete("x/y.txt").await.unwrap();
        store.delete("x/y.txt").await.unwrap();
        assert!(store.get("x/y.txt").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_traversal_is_a_validation_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path().join("media"));

        let err = store.put("../outside.txt", b"x".to_vec()).await.unwrap_err();
        assert!(matches!(err, PortError::Validation { .. }));
        assert!(!dir.path().join("outside.txt").exists());
    }
}

// ============================================================================
// Health
// ============================================================================

mod health_tests {
    use super::*;

    #[tokio::test]
    async fn test_health_reflects_media_root() {
        let dir = tempfile::tempdir().unwrap();
        let healthy = LocalBlobStore::new(dir.path());
        assert_eq!(healthy.health_check().await.status, AdapterHealth::Healthy);

        let missing = LocalBlobStore::new(dir.path().join("does-not-exist"));
        let result = missing.health_check().await;
        assert_eq!(result.status, AdapterHealth::Unhealthy);
        assert!(result.message.is_some());
    }
}
