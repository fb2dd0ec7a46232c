//! Container format detection.

use image::ImageFormat;
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Bytes read from the start of a file to recognise its container.
const MAGIC_LEN: u64 = 64;

/// Closed set of containers the codec distinguishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerFormat {
    Jpeg,
    Png,
    Gif,
    /// Any other container, carrying its lower-cased format name
    Unsupported(String),
}

impl ContainerFormat {
    /// Classify a file from its leading bytes.
    pub fn from_magic(header: &[u8]) -> Self {
        match image::guess_format(header) {
            Ok(ImageFormat::Jpeg) => ContainerFormat::Jpeg,
            Ok(ImageFormat::Png) => ContainerFormat::Png,
            Ok(ImageFormat::Gif) => ContainerFormat::Gif,
            Ok(other) => ContainerFormat::Unsupported(format!("{:?}", other).to_lowercase()),
            Err(_) => ContainerFormat::Unsupported("unknown".to_string()),
        }
    }

    /// Read the head of `path` and classify it.
    pub fn detect(path: &Path) -> io::Result<Self> {
        let mut header = Vec::with_capacity(MAGIC_LEN as usize);
        File::open(path)?.take(MAGIC_LEN).read_to_end(&mut header)?;
        Ok(Self::from_magic(&header))
    }

    pub fn name(&self) -> &str {
        match self {
            ContainerFormat::Jpeg => "jpeg",
            ContainerFormat::Png => "png",
            ContainerFormat::Gif => "gif",
            ContainerFormat::Unsupported(name) => name,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, ContainerFormat::Unsupported(_))
    }
}

impl fmt::Display for ContainerFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_magic() {
        assert_eq!(
            ContainerFormat::from_magic(&[0xFF, 0xD8, 0xFF, 0xE0, 0, 0x10]),
            ContainerFormat::Jpeg
        );
        assert_eq!(
            ContainerFormat::from_magic(b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR"),
            ContainerFormat::Png
        );
        assert_eq!(ContainerFormat::from_magic(b"GIF89a\x01\0"), ContainerFormat::Gif);
        assert_eq!(
            ContainerFormat::from_magic(b"BM\0\0\0\0\0\0\0\0"),
            ContainerFormat::Unsupported("bmp".to_string())
        );
    }

    #[test]
    fn test_unknown_magic_is_unsupported() {
        let format = ContainerFormat::from_magic(b"\0\0\0\x18ftypmp42");
        assert_eq!(format, ContainerFormat::Unsupported("unknown".to_string()));
        assert!(!format.is_supported());
        assert_eq!(ContainerFormat::from_magic(&[]).name(), "unknown");
    }
}
