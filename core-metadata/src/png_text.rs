//! PNG channel: one textual chunk per metadata key.
//!
//! Values representable in Latin-1 go into `tEXt`; anything else into an
//! uncompressed `iTXt`. Existing text chunks are replaced as a whole and
//! the new ones are placed directly after `IHDR`, ahead of the image data.

use crate::error::FormatError;
use crate::MetadataMap;
use png::text_metadata::{EncodableTextChunk, ITXtChunk, TEXtChunk};
use std::io::Cursor;
use tracing::debug;

const SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1A, b'\n'];
const TEXT_CHUNK_TYPES: [&[u8; 4]; 3] = [b"tEXt", b"zTXt", b"iTXt"];
const MAX_KEYWORD_LEN: usize = 79;

pub(crate) fn read(data: &[u8]) -> Result<MetadataMap, FormatError> {
    let decoder = png::Decoder::new(Cursor::new(data));
    let mut reader = decoder
        .read_info()
        .map_err(|e| FormatError::malformed(e.to_string()))?;
    // Text chunks may also follow the image data.
    if let Err(e) = reader.finish() {
        debug!(error = %e, "PNG ends early, using text chunks read so far");
    }
    let info = reader.info();

    let mut map = MetadataMap::new();
    for chunk in &info.uncompressed_latin1_text {
        map.insert(chunk.keyword.clone(), chunk.text.clone());
    }
    for chunk in &info.compressed_latin1_text {
        match chunk.get_text() {
            Ok(text) => {
                map.insert(chunk.keyword.clone(), text);
            }
            Err(e) => debug!(keyword = %chunk.keyword, error = %e, "Skipping unreadable zTXt chunk"),
        }
    }
    for chunk in &info.utf8_text {
        match chunk.get_text() {
            Ok(text) => {
                map.insert(chunk.keyword.clone(), text);
            }
            Err(e) => debug!(keyword = %chunk.keyword, error = %e, "Skipping unreadable iTXt chunk"),
        }
    }

    Ok(map)
}

pub(crate) fn write(data: &[u8], map: &MetadataMap) -> Result<Vec<u8>, FormatError> {
    for key in map.keys() {
        validate_keyword(key)?;
    }

    let chunks = split_chunks(data)?;

    let mut text = Vec::new();
    for (key, value) in map {
        let encoded = if is_latin1(value) {
            TEXtChunk::new(key.as_str(), value.as_str()).encode(&mut text)
        } else {
            ITXtChunk::new(key.as_str(), value.as_str()).encode(&mut text)
        };
        encoded.map_err(|e| FormatError::Encode(e.to_string()))?;
    }

    let mut out = Vec::with_capacity(data.len() + text.len());
    out.extend_from_slice(&SIGNATURE);
    for chunk in chunks {
        if TEXT_CHUNK_TYPES.contains(&chunk.kind) {
            continue;
        }
        out.extend_from_slice(chunk.raw);
        if chunk.kind == b"IHDR" {
            out.extend_from_slice(&text);
        }
    }
    Ok(out)
}

/// PNG keywords: 1-79 printable Latin-1 characters, no leading, trailing or
/// consecutive spaces.
fn validate_keyword(key: &str) -> Result<(), FormatError> {
    let invalid = |reason: &str| FormatError::InvalidKey {
        key: key.to_string(),
        reason: reason.to_string(),
    };

    let len = key.chars().count();
    if len == 0 || len > MAX_KEYWORD_LEN {
        return Err(invalid("PNG keywords must be 1 to 79 characters"));
    }
    if !key
        .chars()
        .all(|c| matches!(c as u32, 0x20..=0x7E | 0xA1..=0xFF))
    {
        return Err(invalid("PNG keywords must be printable Latin-1"));
    }
    if key.starts_with(' ') || key.ends_with(' ') || key.contains("  ") {
        return Err(invalid("PNG keywords must not have leading, trailing or double spaces"));
    }
    Ok(())
}

fn is_latin1(value: &str) -> bool {
    value.chars().all(|c| (c as u32) <= 0xFF)
}

struct Chunk<'a> {
    kind: &'a [u8; 4],
    /// Length, type, data and CRC
    raw: &'a [u8],
}

fn split_chunks(data: &[u8]) -> Result<Vec<Chunk<'_>>, FormatError> {
    if !data.starts_with(&SIGNATURE) {
        return Err(FormatError::malformed("missing PNG signature"));
    }

    let mut chunks = Vec::new();
    let mut pos = SIGNATURE.len();
    while pos < data.len() {
        let header = data
            .get(pos..pos + 8)
            .ok_or_else(|| FormatError::malformed("truncated PNG chunk header"))?;
        let length = u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as usize;
        let kind: &[u8; 4] = header[4..8]
            .try_into()
            .map_err(|_| FormatError::malformed("truncated PNG chunk type"))?;

        let end = pos
            .checked_add(12 + length)
            .filter(|end| *end <= data.len())
            .ok_or_else(|| FormatError::malformed("PNG chunk runs past end of file"))?;

        chunks.push(Chunk {
            kind,
            raw: &data[pos..end],
        });
        pos = end;

        if kind == b"IEND" {
            break;
        }
    }

    match chunks.first() {
        Some(first) if first.kind == b"IHDR" => Ok(chunks),
        _ => Err(FormatError::malformed("PNG does not start with IHDR")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_rules() {
        assert!(validate_keyword("STARTDATE").is_ok());
        assert!(validate_keyword("Beschreibung Straße").is_ok());
        assert!(validate_keyword("").is_err());
        assert!(validate_keyword(" lead").is_err());
        assert!(validate_keyword("trail ").is_err());
        assert!(validate_keyword("double  space").is_err());
        assert!(validate_keyword("tab\tkey").is_err());
        assert!(validate_keyword("日付").is_err());
        assert!(validate_keyword(&"k".repeat(80)).is_err());
        assert!(validate_keyword(&"k".repeat(79)).is_ok());
    }

    #[test]
    fn test_latin1_detection() {
        assert!(is_latin1("Café 01_01_2022"));
        assert!(!is_latin1("展示"));
    }

    #[test]
    fn test_split_rejects_garbage() {
        assert!(split_chunks(b"GIF89a").is_err());
        let mut truncated = SIGNATURE.to_vec();
        truncated.extend_from_slice(&[0, 0, 0, 13, b'I', b'H', b'D', b'R', 0]);
        assert!(split_chunks(&truncated).is_err());
    }
}
