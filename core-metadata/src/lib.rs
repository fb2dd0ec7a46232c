//! # Media Metadata Codec
//!
//! Reads and writes a flat key/value map embedded inside a single image file.
//!
//! ## Overview
//!
//! The container format is detected from the file's magic bytes, never from
//! its extension, and mapped once to a [`ContainerFormat`]. Each supported
//! format has its own embedding channel:
//!
//! | Format | Channel |
//! |--------|---------|
//! | JPEG   | EXIF block in an APP1 segment; non-EXIF keys packed into `UserComment` |
//! | PNG    | One `tEXt` chunk per key (`iTXt` for non Latin-1 values) |
//! | GIF    | One comment extension holding the packed map |
//!
//! Everything else is unsupported: reads return an empty map and writes fail
//! with the recoverable [`CodecError::Unsupported`].
//!
//! The packed channel is a JSON object of strings. It never deserializes
//! arbitrary objects, so a hostile comment field can at worst be ignored.

pub mod codec;
pub mod error;
pub mod format;
pub mod packed;

mod channel;
mod gif_comment;
mod jpeg_exif;
mod png_text;

use std::collections::BTreeMap;

/// Key/value metadata embedded in one media file. Keys are case-sensitive.
pub type MetadataMap = BTreeMap<String, String>;

pub use codec::{MetadataCodec, MetadataSource};
pub use error::{CodecError, Result};
pub use format::ContainerFormat;
