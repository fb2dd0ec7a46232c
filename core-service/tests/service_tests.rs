use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::storage::{RemoteFileRecord, StorageProvider};
use bridge_traits::time::FixedClock;
use bytes::Bytes;
use chrono::{NaiveDate, TimeZone, Utc};
use core_metadata::MetadataCodec;
use core_runtime::{AppConfig, RunLock};
use core_service::{ServiceError, ShowcaseService};
use mockall::mock;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

mock! {
    Provider {}

    #[async_trait]
    impl StorageProvider for Provider {
        async fn list_folder(&self, folder_id: &str) -> BridgeResult<Vec<RemoteFileRecord>>;
        async fn download(&self, file_id: &str) -> BridgeResult<Bytes>;
        async fn delete(&self, file_id: &str) -> BridgeResult<()>;
    }
}

fn clock() -> Arc<FixedClock> {
    Arc::new(FixedClock::new(
        NaiveDate::from_ymd_opt(2022, 2, 2)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap(),
    ))
}

fn record(id: &str, name: &str) -> RemoteFileRecord {
    let ts = Utc.with_ymd_and_hms(2022, 1, 1, 9, 0, 0).unwrap();
    RemoteFileRecord::new(id, name, "image/png", ts, ts)
}

fn local_config(root: &Path) -> AppConfig {
    AppConfig::builder()
        .target_dir(root.join("content"))
        .data_dir(root.join("app_data"))
        .build()
        .unwrap()
}

fn remote_config(root: &Path) -> AppConfig {
    AppConfig::builder()
        .target_dir(root.join("content"))
        .data_dir(root.join("app_data"))
        .remote_folder("folder-1")
        .build()
        .unwrap()
}

fn service(config: AppConfig, provider: Option<MockProvider>) -> ShowcaseService {
    ShowcaseService::new(
        config,
        provider.map(|p| Arc::new(p) as Arc<dyn StorageProvider>),
        Arc::new(MetadataCodec::new()),
        clock(),
    )
    .unwrap()
}

#[tokio::test]
async fn test_local_only_run_reports_catalog_changes() {
    let dir = TempDir::new().unwrap();
    let content = dir.path().join("content");
    fs::create_dir_all(&content).unwrap();
    fs::write(content.join("menu_03_03_2022.png"), b"png").unwrap();
    fs::write(content.join("old_01_01_2022.png"), b"png").unwrap();

    let service = service(local_config(dir.path()), None);

    let first = service.run_once().await.unwrap();
    assert!(first.sync.is_none());
    assert_eq!(first.catalog.catalog.images.len(), 1);
    assert_eq!(first.exit_code(), 1);

    let second = service.run_once().await.unwrap();
    assert_eq!(second.exit_code(), 0);
    assert!(!dir.path().join("app_data/showcase.lock").exists());
}

#[tokio::test]
async fn test_remote_run_downloads_and_catalogs() {
    let dir = TempDir::new().unwrap();
    let mut provider = MockProvider::new();
    provider
        .expect_list_folder()
        .withf(|folder| folder == "folder-1")
        .returning(|_| Ok(vec![record("a", "menu_03_03_2022.png")]));
    provider
        .expect_download()
        .times(1)
        .returning(|_| Ok(Bytes::from_static(b"png")));

    let service = service(remote_config(dir.path()), Some(provider));
    let outcome = service.run_once().await.unwrap();

    let report = outcome.sync.as_ref().unwrap();
    assert_eq!(report.added, vec!["menu_03_03_2022.png".to_string()]);
    assert!(outcome.catalog.changed);
    assert_eq!(outcome.exit_code(), 1);
    assert!(dir.path().join("app_data/changes_state.json").exists());

    let second = service.run_once().await.unwrap();
    assert!(!second.sync.as_ref().unwrap().has_changes());
    assert_eq!(second.exit_code(), 0);
}

#[tokio::test]
async fn test_listing_failure_still_rebuilds_catalog() {
    let dir = TempDir::new().unwrap();
    let content = dir.path().join("content");
    fs::create_dir_all(&content).unwrap();
    fs::write(content.join("menu_03_03_2022.png"), b"png").unwrap();

    let mut provider = MockProvider::new();
    provider
        .expect_list_folder()
        .returning(|_| Err(BridgeError::OperationFailed("unreachable".to_string())));
    provider.expect_download().never();

    let service = service(remote_config(dir.path()), Some(provider));
    let outcome = service.run_once().await.unwrap();

    assert!(outcome.sync.is_none());
    assert_eq!(outcome.catalog.catalog.images.len(), 1);
    assert!(content.join("menu_03_03_2022.png").exists());
}

#[tokio::test]
async fn test_held_lock_fails_run() {
    let dir = TempDir::new().unwrap();
    let config = local_config(dir.path());
    let _held = RunLock::acquire(&config.lock_path(), Duration::from_secs(3600)).unwrap();

    let service = service(config, None);
    let err = service.run_once().await.unwrap_err();

    assert!(matches!(
        err,
        ServiceError::Runtime(core_runtime::Error::Lock(_))
    ));
    assert_eq!(err.exit_code(), 2);
    assert!(!dir.path().join("app_data/current_files.json").exists());
}

#[test]
fn test_remote_without_provider_is_rejected() {
    let dir = TempDir::new().unwrap();
    let result = ShowcaseService::new(
        remote_config(dir.path()),
        None,
        Arc::new(MetadataCodec::new()),
        clock(),
    );

    assert!(matches!(
        result,
        Err(ServiceError::Runtime(
            core_runtime::Error::CapabilityMissing { .. }
        ))
    ));
}
