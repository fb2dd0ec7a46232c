//! Packed-text channel: a whole metadata map stored in one text field.
//!
//! The encoding is a JSON object whose values are all strings. Decoding
//! accepts nothing else; nested objects, arrays or numbers mean the field
//! was written by something else and is treated as "no metadata".

use crate::MetadataMap;

/// Serialize a map into a single text field.
pub fn pack(map: &MetadataMap) -> String {
    // A map of strings always serializes.
    serde_json::to_string(map).unwrap_or_else(|_| String::from("{}"))
}

/// Recover a map from a text field, or `None` if the field is not a packed map.
pub fn unpack(text: &str) -> Option<MetadataMap> {
    let trimmed = text.trim_matches(|c: char| c == '\0' || c.is_whitespace());
    if !trimmed.starts_with('{') {
        return None;
    }
    serde_json::from_str(trimmed).ok()
}
