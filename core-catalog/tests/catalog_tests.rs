use chrono::{NaiveDate, NaiveDateTime};
use core_catalog::{CatalogBuilder, ContentCatalog};
use core_metadata::{MetadataCodec, MetadataMap};
use core_schedule::WindowEvaluator;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2022, 2, 2)
        .unwrap()
        .and_hms_opt(7, 45, 0)
        .unwrap()
}

fn builder(mirror: &Path) -> CatalogBuilder {
    CatalogBuilder::new(mirror, WindowEvaluator::new(Arc::new(MetadataCodec::new())))
}

fn touch(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, b"placeholder").unwrap();
    fs::canonicalize(&path).unwrap()
}

#[test]
fn test_active_image_kept_expired_video_dropped() {
    let dir = TempDir::new().unwrap();
    let mirror = dir.path().join("content");
    let image = touch(&mirror, "menu_03_03_2022.png");
    touch(&mirror, "trailer_01_01_2022.mp4");

    let catalog = builder(&mirror).build(now()).unwrap();

    assert_eq!(catalog.images, vec![image]);
    assert!(catalog.videos.is_empty());
}

#[test]
fn test_nested_and_mixed_content() {
    let dir = TempDir::new().unwrap();
    let mirror = dir.path().join("content");
    let b = touch(&mirror, "b_01.02.22@28.02.22.JPG");
    let a = touch(&mirror, "events/a_10_02_2022.gif");
    let clip = touch(&mirror, "events/clip_5-2-22.mov");
    touch(&mirror, "notes_10_02_2022.txt");
    touch(&mirror, "undated.png");
    touch(&mirror, "later_03.02.2022@05.02.2022.png");

    let catalog = builder(&mirror).build(now()).unwrap();

    let mut expected = vec![b, a];
    expected.sort();
    assert_eq!(catalog.images, expected);
    assert_eq!(catalog.videos, vec![clip]);
    assert!(catalog.images.iter().all(|p| p.is_absolute()));
}

#[test]
fn test_metadata_dated_image() {
    let dir = TempDir::new().unwrap();
    let mirror = dir.path().join("content");
    fs::create_dir_all(&mirror).unwrap();
    let poster = mirror.join("poster.png");
    image::RgbImage::new(4, 4).save(&poster).unwrap();

    let mut map = MetadataMap::new();
    map.insert("STARTDATE".to_string(), "01_01_2022".to_string());
    map.insert("ENDDATE".to_string(), "04_04_2022".to_string());
    MetadataCodec::new().write(&poster, &poster, &map).unwrap();

    let catalog = builder(&mirror).build(now()).unwrap();
    assert_eq!(catalog.images, vec![fs::canonicalize(&poster).unwrap()]);
}

#[test]
fn test_missing_mirror_is_empty() {
    let dir = TempDir::new().unwrap();
    let catalog = builder(&dir.path().join("absent")).build(now()).unwrap();
    assert!(catalog.is_empty());
}

#[test]
fn test_rebuild_reports_changes() {
    let dir = TempDir::new().unwrap();
    let mirror = dir.path().join("content");
    let catalog_path = dir.path().join("app_data/current_files.json");
    let builder = builder(&mirror);

    let empty = builder.rebuild(&catalog_path, now()).unwrap();
    assert!(!empty.changed);
    assert!(catalog_path.exists());

    let image = touch(&mirror, "menu_03_03_2022.png");
    let first = builder.rebuild(&catalog_path, now()).unwrap();
    assert!(first.changed);
    assert_eq!(first.catalog.images, vec![image.clone()]);

    let second = builder.rebuild(&catalog_path, now()).unwrap();
    assert!(!second.changed);

    fs::remove_file(&image).unwrap();
    let third = builder.rebuild(&catalog_path, now()).unwrap();
    assert!(third.changed);
    assert_eq!(ContentCatalog::load_or_default(&catalog_path), ContentCatalog::default());
}

#[cfg(unix)]
#[test]
fn test_non_utf8_name_is_skipped() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let dir = TempDir::new().unwrap();
    let mirror = dir.path().join("content");
    let catalog_path = dir.path().join("app_data/current_files.json");
    let menu = touch(&mirror, "menu_03_03_2022.png");
    fs::write(mirror.join(OsStr::from_bytes(b"caf\xe9_03_03_2022.png")), b"placeholder").unwrap();

    let outcome = builder(&mirror).rebuild(&catalog_path, now()).unwrap();

    assert_eq!(outcome.catalog.images, vec![menu]);
    assert_eq!(ContentCatalog::load_or_default(&catalog_path), outcome.catalog);
}
