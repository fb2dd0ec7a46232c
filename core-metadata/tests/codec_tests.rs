//! Integration tests for the metadata codec against real encoder output.

use core_metadata::{CodecError, ContainerFormat, MetadataCodec, MetadataMap, MetadataSource};
use image::{ImageFormat, Rgb, RgbImage};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn fixture(dir: &Path, name: &str, format: ImageFormat) -> PathBuf {
    let path = dir.join(name);
    let mut img = RgbImage::new(8, 6);
    img.put_pixel(2, 3, Rgb([200, 40, 10]));
    img.save_with_format(&path, format).unwrap();
    path
}

fn map(entries: &[(&str, &str)]) -> MetadataMap {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn test_png_round_trip() {
    let dir = TempDir::new().unwrap();
    let src = fixture(dir.path(), "poster.png", ImageFormat::Png);
    let out = dir.path().join("poster_tagged.png");
    let codec = MetadataCodec::new();

    let metadata = map(&[
        ("STARTDATE", "01_02_2022"),
        ("ENDDATE", "03_02_2022"),
        ("Titel", "Frühlingsfest"),
        ("Caption", "展示"),
    ]);
    codec.write(&src, &out, &metadata).unwrap();

    assert_eq!(codec.read(&out).unwrap(), metadata);
    assert!(codec.read(&src).unwrap().is_empty());
    assert!(image::open(&out).is_ok());
}

#[test]
fn test_png_text_after_image_data() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("late_text.png");

    let mut encoded = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut encoded, 4, 2);
        encoder.set_color(png::ColorType::Rgb);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header().unwrap();
        writer.write_image_data(&[90u8; 4 * 2 * 3]).unwrap();
        writer
            .write_chunk(png::chunk::tEXt, b"ENDDATE\x0004_04_2022")
            .unwrap();
        writer.finish().unwrap();
    }
    fs::write(&path, &encoded).unwrap();

    let codec = MetadataCodec::new();
    let read = codec.read(&path).unwrap();
    assert_eq!(read.get("ENDDATE").map(String::as_str), Some("04_04_2022"));

    let out = dir.path().join("late_text_tagged.png");
    let replacement = map(&[("STARTDATE", "01_04_2022")]);
    codec.write(&path, &out, &replacement).unwrap();
    assert_eq!(codec.read(&out).unwrap(), replacement);
}

#[test]
fn test_jpeg_round_trip() {
    let dir = TempDir::new().unwrap();
    let src = fixture(dir.path(), "flyer.jpg", ImageFormat::Jpeg);
    let out = dir.path().join("flyer_tagged.jpg");
    let codec = MetadataCodec::new();

    let metadata = map(&[
        ("Artist", "Stadtbibliothek"),
        ("STARTDATE", "10.03.2022"),
        ("ENDDATE", "20.03.2022"),
    ]);
    codec.write(&src, &out, &metadata).unwrap();

    assert_eq!(codec.read(&out).unwrap(), metadata);
    assert!(image::open(&out).is_ok());
}

#[test]
fn test_gif_round_trip() {
    let dir = TempDir::new().unwrap();
    let src = fixture(dir.path(), "banner.gif", ImageFormat::Gif);
    let codec = MetadataCodec::new();

    let metadata = map(&[("STARTDATE", "1-1-22")]);
    codec.write(&src, &src, &metadata).unwrap();

    assert_eq!(codec.read(&src).unwrap(), metadata);
    assert!(image::open(&src).is_ok());
}

#[test]
fn test_in_place_rewrite_replaces_metadata() {
    let dir = TempDir::new().unwrap();
    let src = fixture(dir.path(), "notice.png", ImageFormat::Png);
    let codec = MetadataCodec::new();

    codec
        .write(&src, &src, &map(&[("STARTDATE", "01_01_2022")]))
        .unwrap();
    codec
        .write(&src, &src, &map(&[("ENDDATE", "02_01_2022")]))
        .unwrap();

    assert_eq!(
        codec.read_metadata(&src).unwrap(),
        map(&[("ENDDATE", "02_01_2022")])
    );
}

#[test]
fn test_format_detected_from_content_not_extension() {
    let dir = TempDir::new().unwrap();
    let src = fixture(dir.path(), "actually_png.jpg", ImageFormat::Png);
    let codec = MetadataCodec::new();

    assert_eq!(codec.detect(&src).unwrap(), ContainerFormat::Png);

    codec
        .write(&src, &src, &map(&[("ENDDATE", "05_05_2022")]))
        .unwrap();
    assert_eq!(
        codec.read(&src).unwrap().get("ENDDATE").map(String::as_str),
        Some("05_05_2022")
    );
}

#[test]
fn test_unsupported_container() {
    let dir = TempDir::new().unwrap();
    let src = fixture(dir.path(), "slide.bmp", ImageFormat::Bmp);
    let out = dir.path().join("slide_out.bmp");
    let codec = MetadataCodec::new();

    assert!(codec.read(&src).unwrap().is_empty());

    let err = codec
        .write(&src, &out, &map(&[("STARTDATE", "01_01_2022")]))
        .unwrap_err();
    assert!(matches!(err, CodecError::Unsupported { ref format } if format == "bmp"));
    assert!(err.is_recoverable());
    assert!(!out.exists());
}

#[test]
fn test_video_is_unsupported() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("clip.mp4");
    fs::write(&path, b"\0\0\0\x18ftypmp42\0\0\0\0mp42isom").unwrap();

    assert!(MetadataCodec::new().read(&path).unwrap().is_empty());
}

#[test]
fn test_invalid_png_keyword_leaves_no_output() {
    let dir = TempDir::new().unwrap();
    let src = fixture(dir.path(), "poster.png", ImageFormat::Png);
    let out = dir.path().join("poster_out.png");

    let err = MetadataCodec::new()
        .write(&src, &out, &map(&[(" STARTDATE", "01_01_2022")]))
        .unwrap_err();

    assert!(matches!(err, CodecError::InvalidKey { ref key, .. } if key == " STARTDATE"));
    assert!(!err.is_recoverable());
    assert!(!out.exists());
}

#[test]
fn test_corrupt_file_is_unreadable() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.jpg");
    fs::write(&path, [0xFF, 0xD8, 0xFF, 0xE1, 0x40, 0x00, b'E', b'x']).unwrap();

    let err = MetadataCodec::new().read(&path).unwrap_err();
    assert!(matches!(err, CodecError::Unreadable { .. }));
}

#[test]
fn test_missing_file_is_unreadable() {
    let dir = TempDir::new().unwrap();
    let err = MetadataCodec::new()
        .read(&dir.path().join("gone.png"))
        .unwrap_err();
    assert!(matches!(err, CodecError::Unreadable { .. }));
}
