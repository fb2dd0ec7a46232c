//! JPEG channel: metadata lives in the EXIF block of an APP1 segment.
//!
//! A small set of standard ASCII tags (plus `Orientation`) is written
//! natively so other tools see them. Every other key is packed into the
//! `UserComment` tag.

use crate::error::FormatError;
use crate::{packed, MetadataMap};
use exif::experimental::Writer;
use exif::{Field, In, Reader, Tag, Value};
use std::io::Cursor;
use tracing::debug;

const SOI: [u8; 2] = [0xFF, 0xD8];
const APP0: u8 = 0xE0;
const APP1: u8 = 0xE1;
const SOS: u8 = 0xDA;
const EOI: u8 = 0xD9;
const EXIF_HEADER: &[u8] = b"Exif\0\0";

/// Segment length field is 16 bits and counts itself.
const MAX_SEGMENT_PAYLOAD: usize = u16::MAX as usize - 2;

/// `UserComment` character code prefix for undefined encoding.
const UNDEFINED_CHARSET: [u8; 8] = [0; 8];
const UNICODE_CHARSET: &[u8; 8] = b"UNICODE\0";

const WRITABLE_ASCII_TAGS: &[Tag] = &[
    Tag::ImageDescription,
    Tag::Make,
    Tag::Model,
    Tag::Software,
    Tag::DateTime,
    Tag::Artist,
    Tag::Copyright,
    Tag::DateTimeOriginal,
    Tag::DateTimeDigitized,
];

const POINTER_TAGS: &[Tag] = &[
    Tag::ExifIFDPointer,
    Tag::GPSInfoIFDPointer,
    Tag::InteropIFDPointer,
];

pub(crate) fn read(data: &[u8]) -> Result<MetadataMap, FormatError> {
    let mut reader = Reader::new();
    reader.continue_on_error(true);

    let exif = match reader
        .read_from_container(&mut Cursor::new(data))
        .or_else(|e| {
            e.distill_partial_result(|errors| {
                for error in errors {
                    debug!(error = %error, "Ignoring damaged EXIF field");
                }
            })
        }) {
        Ok(exif) => exif,
        Err(exif::Error::NotFound(_)) => return Ok(MetadataMap::new()),
        Err(e) => return Err(FormatError::malformed(e.to_string())),
    };

    let mut map = MetadataMap::new();
    let mut packed_map = None;

    for field in exif.fields() {
        if field.ifd_num != In::PRIMARY || POINTER_TAGS.contains(&field.tag) {
            continue;
        }

        if field.tag == Tag::UserComment {
            let Some(comment) = user_comment_text(&field.value) else {
                continue;
            };
            match packed::unpack(&comment) {
                Some(unpacked) => packed_map = Some(unpacked),
                None if !comment.trim().is_empty() => {
                    map.insert("UserComment".to_string(), comment.trim().to_string());
                }
                None => {}
            }
            continue;
        }

        map.insert(key_for(field.tag), value_text(field));
    }

    // Packed keys win over native tags of the same name.
    if let Some(unpacked) = packed_map {
        map.extend(unpacked);
    }

    Ok(map)
}

pub(crate) fn write(data: &[u8], map: &MetadataMap) -> Result<Vec<u8>, FormatError> {
    let (segments, scan) = split_segments(data)?;
    let app1 = if map.is_empty() {
        None
    } else {
        Some(build_app1(map)?)
    };

    let mut out = Vec::with_capacity(data.len() + app1.as_ref().map_or(0, Vec::len));
    out.extend_from_slice(&SOI);

    let mut pending = app1.as_deref();
    for segment in segments.iter().filter(|s| !s.is_exif()) {
        // JFIF APP0 segments stay in front of the EXIF block.
        if segment.marker != APP0 {
            if let Some(app1) = pending.take() {
                out.extend_from_slice(app1);
            }
        }
        out.extend_from_slice(segment.raw);
    }
    if let Some(app1) = pending {
        out.extend_from_slice(app1);
    }

    out.extend_from_slice(scan);
    Ok(out)
}

fn key_for(tag: Tag) -> String {
    if tag.description().is_some() {
        tag.to_string()
    } else {
        tag.number().to_string()
    }
}

fn value_text(field: &Field) -> String {
    match &field.value {
        Value::Ascii(parts) => parts
            .iter()
            .map(|part| {
                String::from_utf8_lossy(part)
                    .trim_end_matches('\0')
                    .trim()
                    .to_string()
            })
            .collect::<Vec<_>>()
            .join(" "),
        // Plain numbers; display_value() would render tag descriptions.
        Value::Byte(v) => join_numbers(v),
        Value::Short(v) => join_numbers(v),
        Value::Long(v) => join_numbers(v),
        Value::SByte(v) => join_numbers(v),
        Value::SShort(v) => join_numbers(v),
        Value::SLong(v) => join_numbers(v),
        _ => field.display_value().to_string(),
    }
}

fn join_numbers<T: ToString>(values: &[T]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

fn user_comment_text(value: &Value) -> Option<String> {
    let Value::Undefined(bytes, _) = value else {
        return None;
    };
    if bytes.len() < UNDEFINED_CHARSET.len() {
        return None;
    }

    let (charset, body) = bytes.split_at(UNDEFINED_CHARSET.len());
    if charset == UNICODE_CHARSET {
        let units: Vec<u16> = body
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return Some(String::from_utf16_lossy(&units));
    }

    Some(
        String::from_utf8_lossy(body)
            .trim_end_matches('\0')
            .to_string(),
    )
}

fn native_field(key: &str, value: &str) -> Option<Field> {
    if key == "Orientation" {
        let orientation = value.trim().parse::<u16>().ok()?;
        if !(1..=8).contains(&orientation) {
            return None;
        }
        return Some(Field {
            tag: Tag::Orientation,
            ifd_num: In::PRIMARY,
            value: Value::Short(vec![orientation]),
        });
    }

    let tag = WRITABLE_ASCII_TAGS
        .iter()
        .copied()
        .find(|tag| tag.to_string() == key)?;
    if !value.is_ascii() || value.contains('\0') {
        return None;
    }

    Some(Field {
        tag,
        ifd_num: In::PRIMARY,
        value: Value::Ascii(vec![value.as_bytes().to_vec()]),
    })
}

fn build_app1(map: &MetadataMap) -> Result<Vec<u8>, FormatError> {
    let mut fields = Vec::new();
    let mut rest = MetadataMap::new();

    for (key, value) in map {
        match native_field(key, value) {
            Some(field) => fields.push(field),
            None => {
                rest.insert(key.clone(), value.clone());
            }
        }
    }

    if !rest.is_empty() {
        let mut comment = UNDEFINED_CHARSET.to_vec();
        comment.extend_from_slice(packed::pack(&rest).as_bytes());
        fields.push(Field {
            tag: Tag::UserComment,
            ifd_num: In::PRIMARY,
            value: Value::Undefined(comment, 0),
        });
    }

    let mut writer = Writer::new();
    for field in &fields {
        writer.push_field(field);
    }

    let mut tiff = Cursor::new(Vec::new());
    writer
        .write(&mut tiff, false)
        .map_err(|e| FormatError::Encode(e.to_string()))?;
    let tiff = tiff.into_inner();

    let payload_len = EXIF_HEADER.len() + tiff.len();
    if payload_len > MAX_SEGMENT_PAYLOAD {
        return Err(FormatError::Encode(format!(
            "EXIF block of {} bytes does not fit in one APP1 segment",
            payload_len
        )));
    }

    let segment_len = (payload_len + 2) as u16;
    let mut segment = Vec::with_capacity(payload_len + 4);
    segment.extend_from_slice(&[0xFF, APP1]);
    segment.extend_from_slice(&segment_len.to_be_bytes());
    segment.extend_from_slice(EXIF_HEADER);
    segment.extend_from_slice(&tiff);
    Ok(segment)
}

struct Segment<'a> {
    marker: u8,
    /// Whole segment including marker and length
    raw: &'a [u8],
    payload: &'a [u8],
}

impl Segment<'_> {
    fn is_exif(&self) -> bool {
        self.marker == APP1 && self.payload.starts_with(EXIF_HEADER)
    }
}

/// Split the header segments between SOI and the start of scan. Returns the
/// segments and the remainder of the file from SOS (or EOI) onwards.
fn split_segments(data: &[u8]) -> Result<(Vec<Segment<'_>>, &[u8]), FormatError> {
    if !data.starts_with(&SOI) {
        return Err(FormatError::malformed("missing JPEG start-of-image marker"));
    }

    let mut segments = Vec::new();
    let mut pos = SOI.len();

    loop {
        if pos >= data.len() {
            return Err(FormatError::malformed("JPEG ends before start of scan"));
        }
        if data[pos] != 0xFF {
            return Err(FormatError::malformed(format!(
                "expected JPEG marker at offset {}",
                pos
            )));
        }

        let mut marker_pos = pos;
        while data.get(marker_pos + 1) == Some(&0xFF) {
            marker_pos += 1;
        }
        let marker = *data
            .get(marker_pos + 1)
            .ok_or_else(|| FormatError::malformed("truncated JPEG marker"))?;
        let body_start = marker_pos + 2;

        match marker {
            SOS | EOI => return Ok((segments, &data[pos..])),
            0x01 | 0xD0..=0xD7 => {
                segments.push(Segment {
                    marker,
                    raw: &data[pos..body_start],
                    payload: &[],
                });
                pos = body_start;
            }
            _ => {
                let len_bytes = data
                    .get(body_start..body_start + 2)
                    .ok_or_else(|| FormatError::malformed("truncated JPEG segment length"))?;
                let segment_len = u16::from_be_bytes([len_bytes[0], len_bytes[1]]) as usize;
                if segment_len < 2 {
                    return Err(FormatError::malformed("invalid JPEG segment length"));
                }
                let end = body_start + segment_len;
                if end > data.len() {
                    return Err(FormatError::malformed("JPEG segment runs past end of file"));
                }
                segments.push(Segment {
                    marker,
                    raw: &data[pos..end],
                    payload: &data[body_start + 2..end],
                });
                pos = end;
            }
        }
    }
}
