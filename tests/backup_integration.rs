//! Backup Integration Tests
//!
//! Export, restore and wipe across separate on-disk stores.

use std::sync::Arc;

use app_core::backup::{BackupConfig, ImportError};
use app_core::clock::{Clock, FixedClock};
use app_core::journal::EntryDraft;
use app_core::AppContext;
use chrono::{TimeZone, Utc};
use storage::{KvConfig, KvStore, Preferences, StorageKey};
use tempfile::TempDir;

fn open(dir: &TempDir, name: &str) -> (KvStore, AppContext) {
    let path = dir.path().join(name);
    let kv = KvStore::new(KvConfig::new(path.to_string_lossy())).unwrap();
    let store = Arc::new(Preferences::local(kv.clone()).unwrap());
    let clock: Arc<dyn Clock> =
        Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2025, 11, 5, 12, 0, 0).unwrap()));
    let context = AppContext::with_backup_config(
        store,
        clock,
        BackupConfig::new().with_app_version("2.0.0"),
    );
    (kv, context)
}

/// A backup from one device restores on another
#[tokio::test]
async fn test_export_then_import_on_fresh_device() {
    let temp_dir = TempDir::new().unwrap();

    let backup = {
        let (_kv, device) = open(&temp_dir, "old.db");
        device.record_entry(EntryDraft::new("Sağlık", "Şifa buldum")).await.unwrap();
        device.record_entry(EntryDraft::new("İş", "Yeni başlangıç")).await.unwrap();
        device.prayers().add("Kalbime huzur ver").await.unwrap();
        device.backup().export_all_data().await.unwrap()
    };

    let value: serde_json::Value = serde_json::from_str(&backup).unwrap();
    assert_eq!(value["appVersion"], "2.0.0");
    assert_eq!(value["profile"]["streak"], 1);

    {
        let (kv, device) = open(&temp_dir, "new.db");
        let outcome = device.backup().import_for_display(&backup).await;
        assert!(outcome.success, "{}", outcome.message);

        let entries = device.journal().list().await.unwrap();
        assert_eq!(entries.len(), 2);
        let profile = device.profiles().get().await.unwrap().unwrap();
        assert_eq!(profile.badges, vec!["start_journey"]);
        assert_eq!(device.prayers().list().await.unwrap().len(), 1);

        kv.flush().unwrap();
    }

    // Restored state is durable
    {
        let (_kv, device) = open(&temp_dir, "new.db");
        assert_eq!(device.journal().list().await.unwrap().len(), 2);
    }
}

/// Rejected files leave the existing journal untouched
#[tokio::test]
async fn test_rejected_import_keeps_existing_data() {
    let temp_dir = TempDir::new().unwrap();
    let (_kv, device) = open(&temp_dir, "device.db");
    device.record_entry(EntryDraft::new("Kalacak", "kayıt")).await.unwrap();

    let err = device.backup().import_all_data("not json").await.unwrap_err();
    assert!(matches!(err, ImportError::MalformedJson(_)));

    let err = device
        .backup()
        .import_all_data(r#"{"profile":{"name":"x"}}"#)
        .await
        .unwrap_err();
    assert!(matches!(err, ImportError::InvalidSchema(_)));

    assert_eq!(device.journal().list().await.unwrap().len(), 1);
}

/// Wiping clears everything but the agreement flag
#[tokio::test]
async fn test_delete_all_data() {
    let temp_dir = TempDir::new().unwrap();
    let (kv, device) = open(&temp_dir, "wipe.db");

    device.security().accept_agreement().await.unwrap();
    device.security().set_pin("2468").await.unwrap();
    device.on_launch().await.unwrap();
    device.record_entry(EntryDraft::new("a", "b")).await.unwrap();
    device.messages().add("mesaj", None).await.unwrap();
    device.duas().toggle(1).await.unwrap();

    device.backup().delete_all_data().await.unwrap();

    assert!(device.journal().list().await.unwrap().is_empty());
    assert!(device.profiles().get().await.unwrap().is_none());
    assert!(!device.security().has_pin().await.unwrap());
    assert!(device.duas().list().await.unwrap().is_empty());
    assert!(device.security().has_accepted_agreement().await.unwrap());

    let remaining = kv.keys().unwrap();
    assert_eq!(remaining, vec![StorageKey::AgreementAccepted.as_str().to_string()]);
}
